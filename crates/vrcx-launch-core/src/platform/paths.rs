//! Platform-specific paths and names.
//!
//! This module provides:
//! - The default data directory used when no `--config` is given
//! - The per-session IPC endpoint name
//! - The directory holding the Unix socket for that endpoint

use crate::config::{AppConfig, IpcConfig};
use crate::error::{LaunchError, Result};
use std::path::PathBuf;

/// Get the default data directory.
///
/// # Platform Behavior
/// - **Linux**: `~/.config/VRCX`
/// - **Windows**: `%APPDATA%\VRCX`
/// - **macOS**: `~/Library/Application Support/VRCX`
pub fn default_data_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| LaunchError::Validation {
        field: "config_directory".to_string(),
        message: "Could not determine the platform config directory".to_string(),
    })?;
    Ok(config_dir.join(AppConfig::DATA_DIR_NAME))
}

/// Name of the launch IPC endpoint for the current user session.
///
/// Stable across versions so any two instances in a session rendezvous.
pub fn ipc_endpoint_name() -> String {
    format!("{}{}", IpcConfig::ENDPOINT_PREFIX, session_id())
}

/// Directory for the IPC socket.
///
/// Uses `$XDG_RUNTIME_DIR` when set, otherwise the temp directory.
#[cfg(unix)]
pub fn ipc_socket_dir() -> PathBuf {
    dirs::runtime_dir().unwrap_or_else(std::env::temp_dir)
}

/// Identifier of the current login session.
///
/// # Platform Behavior
/// - **Linux/macOS**: effective user id
/// - **Windows**: terminal services session id of the current process
#[cfg(unix)]
#[allow(unsafe_code)]
pub fn session_id() -> u32 {
    // SAFETY: geteuid() has no preconditions and cannot fail.
    unsafe { libc::geteuid() }
}

/// Identifier of the current login session.
#[cfg(windows)]
#[allow(unsafe_code)]
pub fn session_id() -> u32 {
    use windows_sys::Win32::System::RemoteDesktop::ProcessIdToSessionId;
    use windows_sys::Win32::System::Threading::GetCurrentProcessId;

    let mut session = 0u32;
    // SAFETY: `session` is a valid, writable u32 for the duration of the call.
    let ok = unsafe { ProcessIdToSessionId(GetCurrentProcessId(), &mut session) };
    if ok != 0 {
        session
    } else {
        0
    }
}

/// Identifier of the current login session.
#[cfg(not(any(unix, windows)))]
pub fn session_id() -> u32 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_data_dir_ends_with_app_name() {
        if let Ok(dir) = default_data_dir() {
            assert!(dir.ends_with(AppConfig::DATA_DIR_NAME));
        }
    }

    #[test]
    fn test_endpoint_name_is_stable() {
        let name = ipc_endpoint_name();
        assert!(name.starts_with("vrcx-ipc-"));
        assert_eq!(name, ipc_endpoint_name());
        assert_eq!(name, format!("vrcx-ipc-{}", session_id()));
    }
}
