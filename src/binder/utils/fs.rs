//! File system helpers shared by the builder and the stub.
//!
//! The stub side is synchronous `std` code; the builder side uses `tokio::fs`.

use std::{io, path::Path};

/// Removes the directory and its contents if it exists.
pub fn remove_dir_all(path: &Path) -> io::Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Creates all of the directories of the specified path.
pub fn create_dir_all(path: &Path) -> io::Result<()> {
    std::fs::create_dir_all(path)
}

/// Marks a file as executable by everyone (Unix only).
#[cfg(unix)]
pub fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

/// Marks a file as executable by everyone (Unix only).
#[cfg(not(unix))]
pub fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Removes a file, treating a missing file as success.
pub async fn remove_file_if_exists(path: &Path) -> io::Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_dir_all_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested");
        create_dir_all(&target.join("deeper")).unwrap();
        std::fs::write(target.join("deeper/file.txt"), b"x").unwrap();

        remove_dir_all(&target).unwrap();
        assert!(!target.exists());
        remove_dir_all(&target).unwrap();
    }

    #[tokio::test]
    async fn remove_file_if_exists_reports_presence() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("out.exe");
        std::fs::write(&file, b"x").unwrap();

        assert!(remove_file_if_exists(&file).await.unwrap());
        assert!(!remove_file_if_exists(&file).await.unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn make_executable_sets_mode() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("run.sh");
        std::fs::write(&file, b"#!/bin/sh\n").unwrap();
        make_executable(&file).unwrap();
        let mode = std::fs::metadata(&file).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
