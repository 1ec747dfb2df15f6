//! Duplicate instance detection.

use crate::args::{sub_process_type, LaunchIntent};
use crate::config::ArgsConfig;
use crate::platform::{ProcessInspector, SiblingProcess};
use tracing::debug;

/// Whether this launch must bypass duplicate detection.
///
/// Upgrade launches and the embedded runtime's helper processes are never
/// blocked.
pub fn suppress_duplicate_check<S: AsRef<str>>(intent: &LaunchIntent, args: &[S]) -> bool {
    intent.is_upgrade || sub_process_type(args).is_some()
}

/// Decides whether another instance already owns this launch's config
/// directory.
pub struct DuplicateDetector<'a> {
    inspector: &'a dyn ProcessInspector,
}

impl<'a> DuplicateDetector<'a> {
    /// Create a detector over a process source.
    pub fn new(inspector: &'a dyn ProcessInspector) -> Self {
        Self { inspector }
    }

    /// Find the running instance this launch duplicates.
    ///
    /// Returns the first sibling whose command line carries the same
    /// `--config` value (absent matches absent). Helper processes are skipped.
    pub fn find_duplicate<S: AsRef<str>>(
        &self,
        intent: &LaunchIntent,
        args: &[S],
    ) -> Option<SiblingProcess> {
        if suppress_duplicate_check(intent, args) {
            debug!(
                "Duplicate check suppressed (upgrade={}, sub_process={:?})",
                intent.is_upgrade,
                sub_process_type(args)
            );
            return None;
        }

        for sibling in self.inspector.sibling_processes() {
            if sibling.command_line.contains(ArgsConfig::SUB_PROCESS_TYPE) {
                debug!("Skipping helper process {}", sibling.pid);
                continue;
            }

            let sibling_intent = LaunchIntent::from_command_line(&sibling.command_line);
            if sibling_intent.config_directory == intent.config_directory {
                debug!(
                    "Process {} shares config directory {:?}",
                    sibling.pid, intent.config_directory
                );
                return Some(sibling);
            }
        }

        None
    }

    /// Whether this launch duplicates a running instance.
    pub fn is_duplicate<S: AsRef<str>>(&self, intent: &LaunchIntent, args: &[S]) -> bool {
        self.find_duplicate(intent, args).is_some()
    }
}
