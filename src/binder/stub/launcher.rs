//! Process start and privilege probing for the stub.
//!
//! [`ProcessLauncher`] is the seam between the stub runtime and the OS, so
//! tests can substitute a recording launcher.

use std::{io, path::Path};

/// Starts extracted entries and reports the process privilege level.
pub trait ProcessLauncher {
    /// Whether the current process already runs elevated.
    fn is_elevated(&self) -> bool;

    /// Starts `path` without waiting for it.
    fn start(&mut self, path: &Path) -> io::Result<()>;

    /// Starts `path` with a request for elevated execution, without waiting.
    fn start_elevated(&mut self, path: &Path) -> io::Result<()>;
}

/// Launcher backed by the host OS.
///
/// - **Windows**: `ShellExecuteW` with the `open` / `runas` verbs,
///   `IsUserAnAdmin` for the privilege check.
/// - **Unix**: spawns the file directly, elevates through `pkexec`,
///   effective uid 0 counts as elevated.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemLauncher;

#[cfg(unix)]
impl ProcessLauncher for SystemLauncher {
    fn is_elevated(&self) -> bool {
        nix::unistd::geteuid().is_root()
    }

    fn start(&mut self, path: &Path) -> io::Result<()> {
        let mut command = std::process::Command::new(path);
        if let Some(dir) = path.parent() {
            command.current_dir(dir);
        }
        // Fire and forget.
        command.spawn().map(|_| ())
    }

    fn start_elevated(&mut self, path: &Path) -> io::Result<()> {
        if self.is_elevated() {
            return self.start(path);
        }

        let helper = which::which("pkexec").map_err(|e| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no elevation helper available (pkexec): {e}"),
            )
        })?;
        log::debug!("Elevating {} through {}", path.display(), helper.display());

        let mut command = std::process::Command::new(helper);
        command.arg(path);
        if let Some(dir) = path.parent() {
            command.current_dir(dir);
        }
        command.spawn().map(|_| ())
    }
}

#[cfg(windows)]
impl ProcessLauncher for SystemLauncher {
    fn is_elevated(&self) -> bool {
        unsafe { windows::Win32::UI::Shell::IsUserAnAdmin() }.as_bool()
    }

    fn start(&mut self, path: &Path) -> io::Result<()> {
        shell_execute("open", path)
    }

    fn start_elevated(&mut self, path: &Path) -> io::Result<()> {
        shell_execute("runas", path)
    }
}

#[cfg(windows)]
fn shell_execute(verb: &str, path: &Path) -> io::Result<()> {
    use windows::{
        Win32::UI::{Shell::ShellExecuteW, WindowsAndMessaging::SW_SHOWNORMAL},
        core::{HSTRING, PCWSTR},
    };

    let verb = HSTRING::from(verb);
    let file = HSTRING::from(path.as_os_str());
    let dir = path.parent().map(|p| HSTRING::from(p.as_os_str()));
    let dir_ptr = dir
        .as_ref()
        .map_or(PCWSTR::null(), |d| PCWSTR(d.as_ptr()));

    let instance = unsafe {
        ShellExecuteW(
            None,
            PCWSTR(verb.as_ptr()),
            PCWSTR(file.as_ptr()),
            PCWSTR::null(),
            dir_ptr,
            SW_SHOWNORMAL,
        )
    };

    // Values above 32 signal success.
    if instance.0 as isize > 32 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}
