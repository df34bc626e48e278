//! Stub execution: elevation, extraction, launch.
//!
//! Every failure short of a broken payload is recorded in the [`StubReport`]
//! as ignorable and execution continues with the next step or entry.

use super::{
    launcher::ProcessLauncher,
    plan::{LaunchMode, StubPlan},
};
use crate::binder::{payload::PayloadReader, utils::fs};
use std::{
    collections::HashSet,
    fmt,
    fs::File,
    io::{self, BufRead, BufWriter},
    path::{Path, PathBuf},
};

/// Step in which a failure happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Relaunch,
    ResetDirectory,
    CreateDirectory,
    UnsafeName,
    Write,
    Launch,
    Payload,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Stage::Relaunch => "elevated relaunch",
            Stage::ResetDirectory => "removing previous extraction directory",
            Stage::CreateDirectory => "creating extraction directory",
            Stage::UnsafeName => "unsafe entry name",
            Stage::Write => "writing entry",
            Stage::Launch => "starting entry",
            Stage::Payload => "reading payload",
        };
        f.write_str(text)
    }
}

/// Whether the stub carried on after a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Ignorable,
    Fatal,
}

/// A failure observed while running the stub.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StubFailure {
    pub stage: Stage,
    /// Path or entry name the failure concerns.
    pub subject: String,
    pub error: String,
    pub severity: Severity,
}

impl fmt::Display for StubFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.stage, self.subject, self.error)
    }
}

/// Outcome of one stub run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StubReport {
    /// The stub handed over to an elevated copy of itself and did nothing else.
    pub relaunched: bool,
    pub extraction_dir: Option<PathBuf>,
    pub extracted: Vec<PathBuf>,
    pub launched: Vec<PathBuf>,
    pub failures: Vec<StubFailure>,
}

impl StubReport {
    /// Failures that were swallowed.
    pub fn suppressed(&self) -> impl Iterator<Item = &StubFailure> {
        self.failures
            .iter()
            .filter(|f| f.severity == Severity::Ignorable)
    }

    pub fn is_fatal(&self) -> bool {
        self.failures.iter().any(|f| f.severity == Severity::Fatal)
    }

    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        if self.is_fatal() { 1 } else { 0 }
    }

    fn ignore(&mut self, stage: Stage, subject: impl fmt::Display, error: impl fmt::Display) {
        let failure = StubFailure {
            stage,
            subject: subject.to_string(),
            error: error.to_string(),
            severity: Severity::Ignorable,
        };
        log::debug!("Ignoring failure: {failure}");
        self.failures.push(failure);
    }

    fn fatal(&mut self, subject: impl fmt::Display, error: impl fmt::Display) {
        let failure = StubFailure {
            stage: Stage::Payload,
            subject: subject.to_string(),
            error: error.to_string(),
            severity: Severity::Fatal,
        };
        log::error!("{failure}");
        self.failures.push(failure);
    }
}

/// Runs a payload on behalf of the produced executable.
pub struct StubRuntime<L> {
    launcher: L,
    temp_root: PathBuf,
    current_exe: PathBuf,
}

impl<L: ProcessLauncher> StubRuntime<L> {
    /// `current_exe` is what gets relaunched when elevation is needed.
    pub fn new(launcher: L, temp_root: impl Into<PathBuf>, current_exe: impl Into<PathBuf>) -> Self {
        Self {
            launcher,
            temp_root: temp_root.into(),
            current_exe: current_exe.into(),
        }
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn into_launcher(self) -> L {
        self.launcher
    }

    /// Executes the payload: elevation check, extraction, then launches.
    pub fn run<R: BufRead>(&mut self, reader: PayloadReader<R>) -> StubReport {
        let plan = StubPlan::generate(reader.header(), &self.temp_root);
        self.execute(&plan, reader)
    }

    /// Executes `plan`, reading entry data from `reader` in plan order.
    pub fn execute<R: BufRead>(&mut self, plan: &StubPlan, mut reader: PayloadReader<R>) -> StubReport {
        let mut report = StubReport::default();

        if plan.requires_elevation && !self.launcher.is_elevated() {
            match self.launcher.start_elevated(&self.current_exe) {
                Ok(()) => {
                    log::info!("Relaunched {} elevated", self.current_exe.display());
                    report.relaunched = true;
                    return report;
                }
                Err(e) => report.ignore(Stage::Relaunch, self.current_exe.display(), e),
            }
        }

        prepare_directory(&plan.extraction_dir, &mut report);
        report.extraction_dir = Some(plan.extraction_dir.clone());

        let mut written = HashSet::new();
        for entry in &plan.entries {
            let Some(path) = &entry.path else {
                report.ignore(Stage::UnsafeName, &entry.name, "name would leave the extraction directory");
                if let Err(e) = reader.skip_next() {
                    report.fatal(&entry.name, e);
                    return report;
                }
                continue;
            };

            match write_entry(&mut reader, path) {
                Ok(Ok(())) => {
                    if entry.launch != LaunchMode::Skip {
                        if let Err(e) = fs::make_executable(path) {
                            report.ignore(Stage::Write, path.display(), e);
                        }
                    }
                    written.insert(entry.index);
                    report.extracted.push(path.clone());
                }
                Ok(Err(e)) => report.ignore(Stage::Write, path.display(), e),
                Err(e) => {
                    report.fatal(&entry.name, e);
                    return report;
                }
            }
        }

        for entry in plan.launches() {
            let Some(path) = entry.path.as_ref().filter(|_| written.contains(&entry.index)) else {
                continue;
            };
            let started = match entry.launch {
                LaunchMode::Elevated => self.launcher.start_elevated(path),
                _ => self.launcher.start(path),
            };
            match started {
                Ok(()) => report.launched.push(path.clone()),
                Err(e) => report.ignore(Stage::Launch, path.display(), e),
            }
        }

        report
    }
}

/// Empties and recreates the extraction directory, best-effort.
fn prepare_directory(dir: &Path, report: &mut StubReport) {
    if dir.exists() {
        if let Err(e) = fs::remove_dir_all(dir) {
            report.ignore(Stage::ResetDirectory, dir.display(), e);
        }
    }
    if let Err(e) = fs::create_dir_all(dir) {
        report.ignore(Stage::CreateDirectory, dir.display(), e);
    }
}

/// Streams the next entry to `path`.
///
/// The outer error is a broken payload; the inner one a failed write. On a
/// failed create the entry's data is skipped so the reader stays aligned.
fn write_entry<R: BufRead>(
    reader: &mut PayloadReader<R>,
    path: &Path,
) -> crate::binder::Result<io::Result<()>> {
    let file = match File::create(path) {
        Ok(file) => file,
        Err(e) => {
            reader.skip_next()?;
            return Ok(Err(e));
        }
    };

    let mut out = BufWriter::new(file);
    match reader.copy_next(&mut out)? {
        Some(outcome) => Ok(outcome.map(|_| ())),
        None => Err(crate::binder::Error::Payload("entry data missing".into())),
    }
}
