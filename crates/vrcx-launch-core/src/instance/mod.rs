//! Single-instance detection.
//!
//! An instance is a duplicate when another process of the same executable
//! runs with the same `--config` directory. Different directories may run
//! side by side.
//!
//! # Detection Strategy
//!
//! 1. **Suppression** - upgrade launches and embedded-runtime helper
//!    processes (`--type=<kind>`) are never checked
//! 2. **Process table scan** - every sibling's command line is re-parsed and
//!    its config directory compared with ours; the first match wins
//!
//! # Example
//!
//! ```rust,no_run
//! use vrcx_launch_core::instance::DuplicateDetector;
//! use vrcx_launch_core::platform::SystemProcessInspector;
//! use vrcx_launch_core::LaunchIntent;
//!
//! let args: Vec<String> = std::env::args().skip(1).collect();
//! let intent = LaunchIntent::parse(&args);
//! let inspector = SystemProcessInspector::new();
//!
//! if let Some(existing) = DuplicateDetector::new(&inspector).find_duplicate(&intent, &args) {
//!     println!("Already running as PID {}", existing.pid);
//! }
//! ```

mod detection;

pub use detection::{suppress_duplicate_check, DuplicateDetector};
