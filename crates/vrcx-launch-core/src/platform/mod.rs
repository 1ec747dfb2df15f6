//! Platform abstraction layer for cross-platform compatibility.
//!
//! All `#[cfg]` blocks for OS-specific behavior live in this module (and the
//! IPC transport) rather than in the parsing and detection logic.
//!
//! # Architecture
//!
//! - `paths` - Data directory, IPC endpoint naming, session id
//! - `process` - Sibling process listing with command lines
//! - `notify` - Showing fatal startup errors to the user
//!
//! # Supported Platforms
//!
//! - **Windows**: Full support (named pipes, message box)
//! - **Linux**: Full support (Unix sockets, console notification)
//! - **macOS**: Unix sockets; command lines of other users' processes are not readable

pub mod notify;
pub mod paths;
pub mod process;

// Re-export commonly used items
pub use notify::{default_notifier, ConsoleNotifier, DialogNotifier, UserNotifier};
pub use paths::{default_data_dir, ipc_endpoint_name, session_id};
pub use process::{ProcessInspector, SiblingProcess, SystemProcessInspector};

/// Returns the current platform name.
pub fn current_platform() -> &'static str {
    #[cfg(target_os = "linux")]
    {
        "linux"
    }
    #[cfg(target_os = "windows")]
    {
        "windows"
    }
    #[cfg(target_os = "macos")]
    {
        "macos"
    }
    #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
    {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_platform() {
        let platform = current_platform();
        assert!(["linux", "windows", "macos", "unknown"].contains(&platform));
    }
}
