//! VRCX Launch Core - Single-instance launch coordination for VRCX.
//!
//! This crate decides, before the application initializes, whether a new
//! process should start. It parses the launch arguments, rejects a config
//! path that points at a file, detects another instance using the same
//! config directory and forwards this launch's deep-link command to it over
//! a local IPC channel.
//!
//! # Example
//!
//! ```rust,no_run
//! use vrcx_launch_core::ipc::IpcEndpoint;
//! use vrcx_launch_core::platform::{default_notifier, SystemProcessInspector};
//! use vrcx_launch_core::{LaunchIntent, StartupCheck, StartupDecision};
//!
//! #[tokio::main]
//! async fn main() {
//!     let args: Vec<String> = std::env::args().skip(1).collect();
//!     let intent = LaunchIntent::parse(&args);
//!
//!     let inspector = SystemProcessInspector::new();
//!     let notifier = default_notifier();
//!     let check = StartupCheck::new(&inspector, notifier.as_ref(), IpcEndpoint::for_current_session());
//!
//!     match check.run(intent, &args).await {
//!         StartupDecision::Proceed(intent) => println!("Starting with {:?}", intent),
//!         StartupDecision::Exit(reason) => {
//!             println!("Exiting: {:?}", reason);
//!             std::process::exit(0);
//!         }
//!     }
//! }
//! ```

pub mod args;
pub mod config;
pub mod error;
pub mod instance;
pub mod ipc;
pub mod platform;
pub mod startup;

// Re-export commonly used types
pub use args::{sub_process_type, LaunchIntent};
pub use error::{LaunchError, Result};
pub use instance::{suppress_duplicate_check, DuplicateDetector};
pub use ipc::{HandoffOutcome, IpcDispatch, IpcEndpoint, IpcHandoff, IpcMessage, IpcServer, IpcServerHandle};
pub use platform::{ProcessInspector, SiblingProcess, SystemProcessInspector, UserNotifier};
pub use startup::{ExitReason, StartupCheck, StartupDecision};
