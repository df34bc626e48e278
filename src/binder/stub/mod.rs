//! Launcher logic carried by every produced executable.
//!
//! A produced executable is a stub image with a payload overlay appended. At
//! startup it finds its own overlay and runs it:
//!
//! 1. Relaunch elevated if any entry needs it and the process is not elevated
//! 2. Reset `<temp>/<label> Binds`
//! 3. Number placeholder-named entries ([`plan::resolve_name`])
//! 4. Write every entry
//! 5. Start executable entries in order, elevated where flagged
//!
//! Failures in steps 1-5 are recorded and skipped; only a broken payload stops
//! the stub. Extracted files are left in place for the launched programs.

pub mod launcher;
pub mod plan;
pub mod runtime;

pub use launcher::{ProcessLauncher, SystemLauncher};
pub use plan::{LaunchMode, PLACEHOLDER_NAME, PlannedEntry, StubPlan};
pub use runtime::{Severity, Stage, StubFailure, StubReport, StubRuntime};

use crate::binder::payload::overlay;

/// Runs the payload embedded in the current executable, if there is one.
///
/// Returns the exit code to terminate with, or `None` when this executable
/// carries no payload and should behave as the binder itself.
pub fn run_embedded() -> Option<i32> {
    let exe = match std::env::current_exe() {
        Ok(exe) => exe,
        Err(e) => {
            log::debug!("Cannot resolve current executable, skipping payload check: {e}");
            return None;
        }
    };

    let reader = match overlay::open(&exe) {
        Ok(Some(reader)) => reader,
        Ok(None) => return None,
        Err(e) => {
            log::error!("Embedded payload is unreadable: {e}");
            return Some(1);
        }
    };

    log::debug!(
        "Running embedded payload '{}' with {} entries",
        reader.header().label,
        reader.header().entries.len()
    );

    let mut runtime = StubRuntime::new(SystemLauncher, std::env::temp_dir(), exe);
    let report = runtime.run(reader);

    for failure in report.suppressed() {
        log::warn!("{failure}");
    }
    Some(report.exit_code())
}
