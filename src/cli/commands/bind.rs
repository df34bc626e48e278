//! `bind` command.

use crate::{
    binder::{Binder, DiagnosticSeverity, FileRegistry, SettingsBuilder},
    cli::{FileRole, RuntimeConfig, args::BindArgs},
    error::{BinderError, CliError, Result},
    manifest::BindManifest,
};
use std::path::{Path, PathBuf};

/// Extension that marks a `-f` file as executable.
const EXECUTABLE_EXTENSION: &str = "exe";

/// Builds the registry in bind order: manifest files, then command-line
/// files as ordered by [`BindArgs::ordered_files`].
pub async fn collect_registry(
    manifest: Option<&BindManifest>,
    args: &BindArgs,
) -> Result<FileRegistry> {
    let mut registry = FileRegistry::new();

    if let Some(manifest) = manifest {
        for file in &manifest.files {
            registry
                .add_file(&file.path, file.executable, file.administrator)
                .await?;
        }
    }
    for (path, role) in args.ordered_files() {
        let (executable, administrator) = match role {
            FileRole::Auto => (has_executable_extension(path), false),
            FileRole::Executable => (true, false),
            FileRole::Administrator => (true, true),
        };
        registry.add_file(path, executable, administrator).await?;
    }

    Ok(registry)
}

fn has_executable_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(EXECUTABLE_EXTENSION))
}

/// Runs `bind` and prints its diagnostics.
pub async fn execute_bind(args: &BindArgs, config: &RuntimeConfig) -> Result<i32> {
    args.validate()
        .map_err(|reason| BinderError::Cli(CliError::InvalidArguments { reason }))?;

    let manifest = match &args.manifest {
        Some(path) => {
            config.verbose_println(&format!("Reading manifest {}", path.display()))?;
            Some(BindManifest::load(path)?)
        }
        None => None,
    };

    let output = args
        .output
        .clone()
        .or_else(|| manifest.as_ref().and_then(|m| m.output.clone()))
        .ok_or_else(|| {
            BinderError::Cli(CliError::MissingArgument {
                argument: "--output".to_string(),
            })
        })?;
    let icon: Option<PathBuf> = args
        .icon
        .clone()
        .or_else(|| manifest.as_ref().and_then(|m| m.icon.clone()));
    let stub: Option<PathBuf> = args
        .stub
        .clone()
        .or_else(|| manifest.as_ref().and_then(|m| m.stub.clone()));

    let registry = collect_registry(manifest.as_ref(), args).await?;
    for file in &registry {
        config.verbose_println(&format!(
            "{} ({} bytes){}{}",
            file.name(),
            file.data().len(),
            if file.is_executable() { " [exec]" } else { "" },
            if file.is_administrator() { " [admin]" } else { "" },
        ))?;
    }

    let settings = SettingsBuilder::new().maybe_stub_image(stub).build();
    let binder = Binder::new(settings);

    if !args.json {
        config.progress(&format!(
            "Binding {} files into {}",
            registry.len(),
            output.display()
        ))?;
    }
    let result = binder.bind(&registry, &output, icon.as_deref()).await?;

    if args.json {
        config.output().plain(&serde_json::to_string_pretty(&result)?)?;
    } else {
        for diagnostic in &result.diagnostics {
            match diagnostic.severity {
                DiagnosticSeverity::Error => config.error(&diagnostic.message),
                DiagnosticSeverity::Warning => config.warn(&diagnostic.message),
                DiagnosticSeverity::Info => config.verbose_println(&diagnostic.message),
            }?;
        }
        if result.success {
            config.success(&format!("Created {}", output.display()))?;
            if let (Some(size), Some(checksum)) = (result.size, &result.checksum) {
                config.indent(&format!("{size} bytes, sha256 {checksum}"))?;
            }
        }
    }

    Ok(if result.success { 0 } else { 1 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestFile;

    #[test]
    fn exe_extension_is_case_insensitive() {
        assert!(has_executable_extension(Path::new("setup.EXE")));
        assert!(has_executable_extension(Path::new("dir/run.exe")));
        assert!(!has_executable_extension(Path::new("notes.txt")));
        assert!(!has_executable_extension(Path::new("exe")));
    }

    #[tokio::test]
    async fn registry_order_and_flags() {
        let dir = tempfile::tempdir().unwrap();
        let make = |name: &str| {
            let path = dir.path().join(name);
            std::fs::write(&path, name.as_bytes()).unwrap();
            path
        };

        let manifest = BindManifest {
            files: vec![ManifestFile {
                path: make("first.dat"),
                executable: false,
                administrator: true,
            }],
            ..Default::default()
        };
        let args = BindArgs {
            files: vec![make("tool.exe"), make("notes.txt")],
            executables: vec![make("run.bin")],
            administrators: vec![make("setup.bin")],
            ..Default::default()
        };

        let registry = collect_registry(Some(&manifest), &args).await.unwrap();
        let summary: Vec<_> = registry
            .iter()
            .map(|f| (f.name(), f.is_executable(), f.is_administrator()))
            .collect();
        assert_eq!(
            summary,
            [
                ("first.dat", false, true),
                ("tool.exe", true, false),
                ("notes.txt", false, false),
                ("run.bin", true, false),
                ("setup.bin", true, true),
            ]
        );
    }

    #[tokio::test]
    async fn interleaved_flags_keep_command_line_order() {
        let dir = tempfile::tempdir().unwrap();
        let make = |name: &str| {
            let path = dir.path().join(name);
            std::fs::write(&path, name.as_bytes()).unwrap();
            path
        };
        let (a, b, c) = (make("a.txt"), make("b.bin"), make("c.exe"));

        let out = dir.path().join("out.exe");
        let argv: Vec<&std::ffi::OsStr> = vec![
            "file_binder".as_ref(),
            "bind".as_ref(),
            "-o".as_ref(),
            out.as_os_str(),
            "-f".as_ref(),
            a.as_os_str(),
            "-x".as_ref(),
            b.as_os_str(),
            "-f".as_ref(),
            c.as_os_str(),
        ];
        let args = crate::cli::Args::try_parse_ordered(argv).unwrap();
        let crate::cli::Command::Bind(args) = args.command else {
            panic!("expected bind");
        };

        let registry = collect_registry(None, &args).await.unwrap();
        let summary: Vec<_> = registry
            .iter()
            .map(|f| (f.name(), f.is_executable()))
            .collect();
        assert_eq!(summary, [("a.txt", false), ("b.bin", true), ("c.exe", true)]);
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let args = BindArgs {
            files: vec!["/definitely/not/here.exe".into()],
            ..Default::default()
        };
        let err = collect_registry(None, &args).await.unwrap_err();
        assert!(matches!(
            err,
            BinderError::Binder(crate::binder::Error::NotFound { .. })
        ));
    }
}
