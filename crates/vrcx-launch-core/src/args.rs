//! Launch argument parsing.
//!
//! Turns the raw argument vector of a VRCX process into a [`LaunchIntent`].
//! Parsing is permissive: every token is checked against every known pattern,
//! values are embedded in the same token (`--config=<dir>`), and anything
//! unrecognized is ignored so launchers and shells can pass extra arguments.

use crate::config::ArgsConfig;
use crate::error::{LaunchError, Result};
use crate::platform;
use std::path::{Path, PathBuf};

/// Structured result of parsing a process's startup arguments.
///
/// Built once at process start and passed by reference to whatever needs it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchIntent {
    /// Launched by an OS autostart entry.
    pub is_startup: bool,
    /// Launched by the installer as part of an in-place upgrade.
    pub is_upgrade: bool,
    /// Debug/verbose mode requested.
    pub is_debug: bool,
    /// Deep-link payload with the `vrcx://` prefix removed.
    pub launch_command: Option<String>,
    /// Override for the directory holding persistent state.
    pub config_directory: Option<String>,
    /// Outbound proxy override with quote characters removed.
    pub proxy_url: Option<String>,
}

impl LaunchIntent {
    /// Parse an argument vector.
    ///
    /// Single left-to-right pass; a repeated flag overwrites the earlier value.
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut intent = LaunchIntent::default();

        for arg in args {
            let arg = arg.as_ref();

            if arg == ArgsConfig::STARTUP {
                intent.is_startup = true;
            }

            if arg == ArgsConfig::UPGRADE {
                intent.is_upgrade = true;
            }

            if arg.starts_with(ArgsConfig::DEBUG_PREFIX) {
                intent.is_debug = true;
            }

            if let Some(command) = non_empty_suffix(arg, ArgsConfig::LAUNCH_COMMAND_PREFIX) {
                intent.launch_command = Some(command.to_string());
            }

            if let Some(command) = non_empty_suffix(arg, ArgsConfig::URI_LAUNCH_COMMAND_PREFIX) {
                intent.launch_command = Some(command.to_string());
            }

            if let Some(dir) = value_after_separator(arg, ArgsConfig::CONFIG_DIRECTORY_PREFIX) {
                intent.config_directory = Some(dir.to_string());
            }

            if let Some(url) = value_after_separator(arg, ArgsConfig::PROXY_SERVER_PREFIX) {
                intent.proxy_url = Some(url.replace(['\'', '"'], ""));
            }
        }

        intent
    }

    /// Parse another process's command line as reported by the OS.
    ///
    /// The line is split on single spaces, so quoted paths containing spaces
    /// are not reassembled.
    pub fn from_command_line(command_line: &str) -> Self {
        Self::parse(command_line.split(' '))
    }

    /// Reject a `--config` value that points at a file.
    ///
    /// Older releases accepted the database file itself; the owning process
    /// must tell the user and exit when this fails.
    pub fn validate_config_directory(&self) -> Result<()> {
        if let Some(dir) = &self.config_directory {
            let path = Path::new(dir);
            if path.is_file() {
                return Err(LaunchError::ConfigDirectoryIsFile {
                    path: path.to_path_buf(),
                });
            }
        }
        Ok(())
    }

    /// Directory holding persistent state for this launch.
    pub fn app_data_directory(&self) -> Result<PathBuf> {
        match &self.config_directory {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => platform::default_data_dir(),
        }
    }

    /// Resolve the data directory and create it if missing.
    pub fn ensure_app_data_directory(&self) -> Result<PathBuf> {
        let dir = self.app_data_directory()?;
        std::fs::create_dir_all(&dir).map_err(|e| LaunchError::io_with_path(e, &dir))?;
        Ok(dir)
    }
}

/// Value of the embedded runtime's sub-process marker (`--type=<value>`).
///
/// Returns `None` when the marker is absent or carries no value.
pub fn sub_process_type<S: AsRef<str>>(args: &[S]) -> Option<&str> {
    args.iter()
        .filter_map(|arg| arg.as_ref().strip_prefix(ArgsConfig::SUB_PROCESS_TYPE))
        .find_map(|rest| rest.strip_prefix('='))
        .filter(|value| !value.is_empty())
}

/// Remainder after `prefix`, only when the token is strictly longer than it.
fn non_empty_suffix<'a>(arg: &'a str, prefix: &str) -> Option<&'a str> {
    arg.strip_prefix(prefix).filter(|rest| !rest.is_empty())
}

/// Remainder after `prefix` with the single separator character skipped.
fn value_after_separator<'a>(arg: &'a str, prefix: &str) -> Option<&'a str> {
    let mut rest = arg.strip_prefix(prefix)?.chars();
    rest.next()?;
    Some(rest.as_str())
}
