//! Sibling process discovery.
//!
//! Duplicate detection needs each sibling's command line as the OS launched
//! it, because `--config` only lives there. The [`ProcessInspector`] trait is
//! the seam; [`SystemProcessInspector`] backs it with the `sysinfo` process
//! table (a structured process query on Windows and macOS, `/proc` on Linux).
//!
//! # Platform Behavior
//! - **Linux**: command lines of other users' processes are readable; threads
//!   show up as tasks and are skipped
//! - **Windows**: processes of other sessions or elevated processes may report
//!   an empty command line
//! - **macOS**: command lines of other users' processes are usually empty

use std::ffi::{OsStr, OsString};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};
use tracing::debug;

/// A running process with the same name as the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiblingProcess {
    /// Process ID.
    pub pid: u32,
    /// Arguments as launched, joined with single spaces. Empty when the
    /// command line could not be read.
    pub command_line: String,
}

/// Capability for listing sibling processes.
pub trait ProcessInspector: Send + Sync {
    /// Processes sharing the application's process name, excluding the
    /// current process.
    fn sibling_processes(&self) -> Vec<SiblingProcess>;
}

/// [`ProcessInspector`] backed by the OS process table.
#[derive(Debug, Clone, Default)]
pub struct SystemProcessInspector {
    /// Name to match; `None` means the current process's name.
    process_name: Option<OsString>,
}

impl SystemProcessInspector {
    /// Inspector matching the current process's name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspector matching an explicit process name (e.g. `VRCX.exe`).
    pub fn with_process_name(name: impl Into<OsString>) -> Self {
        Self {
            process_name: Some(name.into()),
        }
    }
}

impl ProcessInspector for SystemProcessInspector {
    fn sibling_processes(&self) -> Vec<SiblingProcess> {
        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::new().with_cmd(UpdateKind::Always),
        );

        let current_pid = std::process::id();
        let name = match &self.process_name {
            Some(name) => name.clone(),
            None => match current_process_name(&system, current_pid) {
                Some(name) => name,
                None => {
                    debug!("Could not determine current process name, skipping scan");
                    return vec![];
                }
            },
        };

        find_processes_by_name(&system, &name, current_pid)
            .into_iter()
            .map(|(pid, command_line)| SiblingProcess { pid, command_line })
            .collect()
    }
}

/// Name of the current process as the process table reports it.
///
/// Falls back to the executable's file name.
fn current_process_name(system: &System, current_pid: u32) -> Option<OsString> {
    system
        .process(Pid::from_u32(current_pid))
        .map(|process| process.name().to_os_string())
        .or_else(|| {
            std::env::current_exe()
                .ok()
                .and_then(|exe| exe.file_name().map(|name| name.to_os_string()))
        })
}

/// Scan a refreshed process table for processes named `name`.
///
/// Returns a list of (pid, cmdline) tuples. A process whose command line is
/// unreadable is still returned, with an empty command line.
fn find_processes_by_name(system: &System, name: &OsStr, exclude_pid: u32) -> Vec<(u32, String)> {
    let mut found: Vec<(u32, String)> = system
        .processes()
        .iter()
        .filter(|(pid, process)| {
            pid.as_u32() != exclude_pid
                && process.thread_kind().is_none()
                && process.name() == name
        })
        .map(|(pid, process)| {
            let cmdline = join_command_line(process.cmd());
            if cmdline.is_empty() {
                debug!("Command line of process {} is unavailable", pid);
            }
            (pid.as_u32(), cmdline)
        })
        .collect();

    found.sort_by_key(|(pid, _)| *pid);
    debug!(
        "find_processes_by_name: {} sibling(s) named {:?}",
        found.len(),
        name
    );
    found
}

fn join_command_line(args: &[OsString]) -> String {
    args.iter()
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_command_line() {
        let args = vec![
            OsString::from("VRCX.exe"),
            OsString::from("--config=C:\\data"),
        ];
        assert_eq!(join_command_line(&args), "VRCX.exe --config=C:\\data");
        assert_eq!(join_command_line(&[]), "");
    }

    #[test]
    fn test_current_process_is_excluded() {
        let inspector = SystemProcessInspector::new();
        let siblings = inspector.sibling_processes();
        assert!(siblings.iter().all(|p| p.pid != std::process::id()));
    }

    #[cfg(unix)]
    #[test]
    fn test_sibling_reports_full_command_line() {
        let mut child = std::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .unwrap();
        let child_pid = child.id();

        let inspector = SystemProcessInspector::with_process_name("sleep");
        let mut found = None;
        for _ in 0..20 {
            found = inspector
                .sibling_processes()
                .into_iter()
                .find(|p| p.pid == child_pid);
            if found.is_some() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(25));
        }

        let _ = child.kill();
        let _ = child.wait();

        assert_eq!(
            found,
            Some(SiblingProcess {
                pid: child_pid,
                command_line: "sleep 30".to_string(),
            })
        );
    }

    #[test]
    fn test_unknown_name_finds_nothing() {
        let inspector =
            SystemProcessInspector::with_process_name("vrcx-launch-no-such-process-name");
        assert!(inspector.sibling_processes().is_empty());
    }
}
