//! Command line argument parsing and validation.
//!
//! This module provides CLI argument parsing using clap, with validation
//! of argument combinations that clap cannot express.

use clap::{Args as ClapArgs, ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

/// Binds several files into one self-extracting executable
#[derive(Parser, Debug)]
#[command(
    name = "file_binder",
    version,
    about = "Binds several files into one self-extracting executable",
    long_about = "Combines files into a single executable. When the produced executable runs it
extracts every file to <temp>/<output name> Binds/ and starts the ones flagged
executable, elevated where requested.

Usage:
  file_binder bind -o Bundle.exe -x setup.exe -f readme.txt
  file_binder bind -o Bundle.exe -a driver.exe -f config.ini -i app.ico
  file_binder bind --manifest bind.toml
  file_binder inspect Bundle.exe

Exit code 0 = executable guaranteed to exist at the output path."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Print progress details
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Print errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bind files into a self-extracting executable
    Bind(BindArgs),

    /// List the files carried by a produced executable
    Inspect(InspectArgs),
}

/// Arguments of `bind`
#[derive(ClapArgs, Debug, Default)]
pub struct BindArgs {
    /// Output executable path (overrides the manifest's `output`)
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Icon (.ico) for the output executable
    #[arg(short = 'i', long, value_name = "ICON")]
    pub icon: Option<PathBuf>,

    /// Stub image to use instead of this binder executable
    #[arg(long, value_name = "PATH", env = "FILE_BINDER_STUB")]
    pub stub: Option<PathBuf>,

    /// File to bind; `.exe` files are started after extraction
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// File to bind and start after extraction
    #[arg(short = 'x', long = "exec", value_name = "FILE")]
    pub executables: Vec<PathBuf>,

    /// File to bind and start elevated after extraction
    #[arg(short = 'a', long = "admin", value_name = "FILE")]
    pub administrators: Vec<PathBuf>,

    /// TOML bind manifest; its files come before those given on the command line
    #[arg(short = 'm', long, value_name = "TOML")]
    pub manifest: Option<PathBuf>,

    /// Print the build result as JSON
    #[arg(long)]
    pub json: bool,

    /// Roles of `-f`/`-x`/`-a` in the order they appeared on the command line
    #[arg(skip)]
    pub file_order: Vec<FileRole>,
}

/// How a command-line file was added.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileRole {
    /// `-f`: executable when the extension is `.exe`
    Auto,
    /// `-x`
    Executable,
    /// `-a`
    Administrator,
}

/// Arguments of `inspect`
#[derive(ClapArgs, Debug)]
pub struct InspectArgs {
    /// Produced executable to inspect
    #[arg(value_name = "EXE")]
    pub executable: PathBuf,

    /// Print the payload header as JSON
    #[arg(long)]
    pub json: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::try_parse_ordered(std::env::args_os()).unwrap_or_else(|e| e.exit())
    }

    /// Parses like [`Parser::try_parse_from`] and also records the order in
    /// which bind files were given.
    pub fn try_parse_ordered<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(itr)?;
        let mut args = Self::from_arg_matches(&matches)?;
        if let (Command::Bind(bind), Some(("bind", sub))) = (&mut args.command, matches.subcommand()) {
            bind.record_order(sub);
        }
        Ok(args)
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        match &self.command {
            Command::Bind(bind) => bind.validate(),
            Command::Inspect(_) => Ok(()),
        }
    }
}

impl BindArgs {
    /// Whether any file was given on the command line.
    pub fn has_files(&self) -> bool {
        !(self.files.is_empty() && self.executables.is_empty() && self.administrators.is_empty())
    }

    fn record_order(&mut self, matches: &ArgMatches) {
        let mut tagged = Vec::new();
        for (id, role) in [
            ("files", FileRole::Auto),
            ("executables", FileRole::Executable),
            ("administrators", FileRole::Administrator),
        ] {
            if let Some(indices) = matches.indices_of(id) {
                tagged.extend(indices.map(|index| (index, role)));
            }
        }
        tagged.sort_by_key(|(index, _)| *index);
        self.file_order = tagged.into_iter().map(|(_, role)| role).collect();
    }

    /// Command-line files in bind order.
    ///
    /// Follows the recorded argument order; without one (arguments built in
    /// code) all `-f` files come first, then `-x`, then `-a`.
    pub fn ordered_files(&self) -> Vec<(&Path, FileRole)> {
        let total = self.files.len() + self.executables.len() + self.administrators.len();
        let roles: Vec<FileRole> = if self.file_order.len() == total {
            self.file_order.clone()
        } else {
            std::iter::repeat_n(FileRole::Auto, self.files.len())
                .chain(std::iter::repeat_n(FileRole::Executable, self.executables.len()))
                .chain(std::iter::repeat_n(FileRole::Administrator, self.administrators.len()))
                .collect()
        };

        let mut auto = self.files.iter();
        let mut executables = self.executables.iter();
        let mut administrators = self.administrators.iter();
        roles
            .into_iter()
            .filter_map(|role| {
                let path = match role {
                    FileRole::Auto => auto.next(),
                    FileRole::Executable => executables.next(),
                    FileRole::Administrator => administrators.next(),
                };
                path.map(|p| (p.as_path(), role))
            })
            .collect()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.manifest.is_none() {
            if self.output.is_none() {
                return Err("--output is required without --manifest".to_string());
            }
            if !self.has_files() {
                return Err("No files given; use -f, -x, -a or --manifest".to_string());
            }
        }
        Ok(())
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        let output = super::OutputManager::new(args.verbose, args.quiet);
        Self { output }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print verbose message if in verbose mode
    pub fn verbose_println(&self, message: &str) -> std::io::Result<()> {
        self.output.verbose(message)
    }

    /// Print success message if not in quiet mode
    pub fn success(&self, message: &str) -> std::io::Result<()> {
        self.output.success(message)
    }

    /// Print warning message if not in quiet mode
    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        self.output.warn(message)
    }

    /// Print error message
    pub fn error(&self, message: &str) -> std::io::Result<()> {
        self.output.error(message)
    }

    /// Print progress message
    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        self.output.progress(message)
    }

    /// Print indented text
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        self.output.indent(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn repeated_file_flags_keep_order() {
        let args = Args::try_parse_from([
            "file_binder", "bind", "-o", "out.exe", "-f", "a.txt", "-x", "b.exe", "-f", "c.exe",
            "-a", "d.exe",
        ])
        .unwrap();
        let Command::Bind(bind) = args.command else {
            panic!("expected bind");
        };
        assert_eq!(bind.files, [PathBuf::from("a.txt"), PathBuf::from("c.exe")]);
        assert_eq!(bind.executables, [PathBuf::from("b.exe")]);
        assert_eq!(bind.administrators, [PathBuf::from("d.exe")]);
        assert!(bind.validate().is_ok());
    }

    #[test]
    fn interleaved_files_follow_argument_order() {
        let args = Args::try_parse_ordered([
            "file_binder", "bind", "-o", "out.exe", "-f", "a.txt", "-x", "b.exe", "-f", "c.exe",
            "-a", "d.exe",
        ])
        .unwrap();
        let Command::Bind(bind) = args.command else {
            panic!("expected bind");
        };
        let order: Vec<_> = bind
            .ordered_files()
            .into_iter()
            .map(|(path, role)| (path.to_path_buf(), role))
            .collect();
        assert_eq!(
            order,
            [
                (PathBuf::from("a.txt"), FileRole::Auto),
                (PathBuf::from("b.exe"), FileRole::Executable),
                (PathBuf::from("c.exe"), FileRole::Auto),
                (PathBuf::from("d.exe"), FileRole::Administrator),
            ]
        );
    }

    #[test]
    fn built_arguments_fall_back_to_grouped_order() {
        let bind = BindArgs {
            files: vec!["a.txt".into()],
            executables: vec!["b.exe".into()],
            administrators: vec!["c.exe".into()],
            ..Default::default()
        };
        let roles: Vec<_> = bind.ordered_files().into_iter().map(|(_, r)| r).collect();
        assert_eq!(
            roles,
            [FileRole::Auto, FileRole::Executable, FileRole::Administrator]
        );
    }

    #[test]
    fn bind_without_output_or_manifest_is_invalid() {
        let bind = BindArgs {
            files: vec!["a.exe".into()],
            ..Default::default()
        };
        assert!(bind.validate().unwrap_err().contains("--output"));

        let bind = BindArgs {
            output: Some("out.exe".into()),
            ..Default::default()
        };
        assert!(bind.validate().unwrap_err().contains("No files"));

        let bind = BindArgs {
            manifest: Some("bind.toml".into()),
            ..Default::default()
        };
        assert!(bind.validate().is_ok());
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Args::try_parse_from(["file_binder", "-v", "-q", "inspect", "x"]).is_err());
    }
}
