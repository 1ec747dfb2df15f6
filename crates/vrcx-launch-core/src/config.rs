//! Centralized configuration for VRCX launch coordination.
//!
//! Argument prefixes, IPC naming and timing constants live here so the
//! parser, detector and handoff agree on them.

use std::time::Duration;

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const APP_NAME: &'static str = "VRCX";
    /// Directory name under the platform data dir when no `--config` is given.
    pub const DATA_DIR_NAME: &'static str = "VRCX";
}

/// Recognized launch argument tokens.
pub struct ArgsConfig;

impl ArgsConfig {
    pub const STARTUP: &'static str = "--startup";
    pub const UPGRADE: &'static str = "/Upgrade";
    pub const DEBUG_PREFIX: &'static str = "--debug";
    pub const LAUNCH_COMMAND_PREFIX: &'static str = "/uri=vrcx://";
    pub const URI_LAUNCH_COMMAND_PREFIX: &'static str = "vrcx://";
    pub const CONFIG_DIRECTORY_PREFIX: &'static str = "--config";
    pub const PROXY_SERVER_PREFIX: &'static str = "--proxy-server";

    /// Marker the embedded browser runtime adds to its helper processes.
    pub const SUB_PROCESS_TYPE: &'static str = "--type";
}

/// Local IPC configuration.
pub struct IpcConfig;

impl IpcConfig {
    /// Endpoint name prefix, followed by the session id.
    pub const ENDPOINT_PREFIX: &'static str = "vrcx-ipc-";
    pub const MESSAGE_TERMINATOR: u8 = 0x00;
    pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;
    pub const CONNECT_TIMEOUT: Duration = Duration::from_millis(1000);
    pub const PIPE_BUSY_RETRY_INTERVAL: Duration = Duration::from_millis(50);
    /// Upper bound on waiting for the background write before exiting.
    pub const FLUSH_TIMEOUT: Duration = Duration::from_millis(250);
    /// Sleep after the write so the OS can hand buffered bytes to the reader.
    pub const EXIT_GRACE: Duration = Duration::from_millis(10);
    pub const MAX_CONNECTIONS: usize = 16;
    /// How long a starting instance keeps retrying to bind an endpoint that a
    /// duplicate launch holds for its handoff.
    pub const BIND_RETRY_TIMEOUT: Duration = Duration::from_millis(3000);
    pub const BIND_RETRY_INTERVAL: Duration = Duration::from_millis(50);
}

/// User-facing messages.
pub struct MessageConfig;

impl MessageConfig {
    pub const CONFIG_IS_FILE_TITLE: &'static str = "--config is now a directory";
    pub const CONFIG_IS_FILE_MESSAGE: &'static str = "Move your \"VRCX.sqlite3\" into a folder then specify the folder in the launch parameter e.g.\n--config=\"C:\\VRCX\\\"";
}
