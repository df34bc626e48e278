//! Ordered collection of files to bind.
//!
//! Insertion order is significant: it is the order in which the produced
//! executable extracts and launches entries.

use crate::binder::error::{Error, ErrorExt, Result};
use bytes::Bytes;
use std::path::Path;

/// A file captured for binding.
///
/// The contents are snapshotted when the file is added. Only the flags can be
/// changed afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundFile {
    name: String,
    data: Bytes,
    is_executable: bool,
    is_administrator: bool,
}

impl BoundFile {
    /// Creates an entry from a base file name and its contents.
    ///
    /// Fails if `name` is empty or contains a path separator.
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            data: data.into(),
            is_executable: false,
            is_administrator: false,
        })
    }

    /// Sets both flags, consuming the entry.
    pub fn with_flags(mut self, is_executable: bool, is_administrator: bool) -> Self {
        self.is_executable = is_executable;
        self.is_administrator = is_administrator;
        self
    }

    /// Base file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File contents as captured at add time.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Whether the produced executable launches this entry.
    pub fn is_executable(&self) -> bool {
        self.is_executable
    }

    /// Whether this entry requests elevated execution.
    pub fn is_administrator(&self) -> bool {
        self.is_administrator
    }

    pub fn set_executable(&mut self, value: bool) {
        self.is_executable = value;
    }

    pub fn set_administrator(&mut self, value: bool) {
        self.is_administrator = value;
    }
}

/// Rejects names that could escape the extraction directory.
pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Validation("file name cannot be empty".into()));
    }
    if name.contains(['/', '\\']) {
        return Err(Error::Validation(format!(
            "file name {name:?} must not contain path separators"
        )));
    }
    if name == "." || name == ".." {
        return Err(Error::Validation(format!("{name:?} is not a file name")));
    }
    Ok(())
}

/// Files registered for a bind, in insertion order.
///
/// Not synchronized: mutation takes `&mut self`, so sharing a registry across
/// tasks requires the caller to wrap it.
#[derive(Clone, Debug, Default)]
pub struct FileRegistry {
    files: Vec<BoundFile>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `path` into memory and appends it under its base name.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if `path` is missing or is not a regular file
    /// - [`Error::Validation`] if the base name is not valid UTF-8
    /// - [`Error::Fs`] if the file exists but cannot be read
    pub async fn add_file(
        &mut self,
        path: impl AsRef<Path>,
        is_executable: bool,
        is_administrator: bool,
    ) -> Result<&mut BoundFile> {
        let path = path.as_ref();

        let is_file = tokio::fs::metadata(path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(Error::NotFound {
                path: path.to_path_buf(),
            });
        }

        let name = path
            .file_name()
            .ok_or_else(|| Error::NotFound {
                path: path.to_path_buf(),
            })?
            .to_str()
            .ok_or_else(|| {
                Error::Validation(format!(
                    "file name of {} is not valid UTF-8",
                    path.display()
                ))
            })?
            .to_string();

        let data = tokio::fs::read(path)
            .await
            .fs_context("reading file to bind", path)?;

        log::debug!("Registered {} ({} bytes)", name, data.len());

        let file = BoundFile::new(name, data)?.with_flags(is_executable, is_administrator);
        self.files.push(file);
        let last = self.files.len() - 1;
        Ok(&mut self.files[last])
    }

    /// Adds a file with both flags cleared.
    pub async fn add_path(&mut self, path: impl AsRef<Path>) -> Result<&mut BoundFile> {
        self.add_file(path, false, false).await
    }

    /// Appends an already captured entry.
    pub fn push(&mut self, file: BoundFile) {
        self.files.push(file);
    }

    /// Read-only ordered view.
    pub fn files(&self) -> &[BoundFile] {
        &self.files
    }

    /// Mutable access to one entry, for toggling its flags.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut BoundFile> {
        self.files.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BoundFile> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl<'a> IntoIterator for &'a FileRegistry {
    type Item = &'a BoundFile;
    type IntoIter = std::slice::Iter<'a, BoundFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_file_snapshots_contents_and_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("setup.exe");
        let b = dir.path().join("readme.txt");
        std::fs::write(&a, b"MZ-binary").unwrap();
        std::fs::write(&b, b"hello").unwrap();

        let mut registry = FileRegistry::new();
        registry.add_file(&a, true, false).await.unwrap();
        registry.add_path(&b).await.unwrap();

        // Later edits are not reflected.
        std::fs::write(&a, b"changed").unwrap();

        let files = registry.files();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].name(), "setup.exe");
        assert_eq!(files[0].data().as_ref(), b"MZ-binary");
        assert!(files[0].is_executable());
        assert!(!files[0].is_administrator());
        assert_eq!(files[1].name(), "readme.txt");
        assert!(!files[1].is_executable());
    }

    #[tokio::test]
    async fn add_file_missing_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = FileRegistry::new();
        let err = registry
            .add_path(dir.path().join("missing.bin"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn add_file_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = FileRegistry::new();
        let err = registry.add_path(dir.path()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn duplicate_names_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("same.txt");
        std::fs::write(&a, b"1").unwrap();

        let mut registry = FileRegistry::new();
        registry.add_path(&a).await.unwrap();
        registry.add_path(&a).await.unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn flags_are_toggleable() {
        let mut registry = FileRegistry::new();
        registry.push(BoundFile::new("a.bin", vec![1u8]).unwrap());
        let entry = registry.get_mut(0).unwrap();
        entry.set_executable(true);
        entry.set_administrator(true);
        assert!(registry.files()[0].is_executable());
        assert!(registry.files()[0].is_administrator());
    }

    #[test]
    fn names_with_separators_are_rejected() {
        assert!(BoundFile::new("dir/file", Vec::<u8>::new()).is_err());
        assert!(BoundFile::new("dir\\file", Vec::<u8>::new()).is_err());
        assert!(BoundFile::new("", Vec::<u8>::new()).is_err());
        assert!(BoundFile::new("..", Vec::<u8>::new()).is_err());
        assert!(BoundFile::new("a|b,c:d.txt", Vec::<u8>::new()).is_ok());
    }
}
