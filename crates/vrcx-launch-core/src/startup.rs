//! Startup check run once before the application initializes.
//!
//! Validates the config directory, looks for a running instance that owns
//! the same directory and, when one exists, hands it this launch's command.

use crate::args::LaunchIntent;
use crate::config::MessageConfig;
use crate::instance::DuplicateDetector;
use crate::ipc::{IpcEndpoint, IpcHandoff};
use crate::platform::{ProcessInspector, UserNotifier};
use tracing::{info, warn};

/// Why the process must stop instead of starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Another instance owns the config directory.
    DuplicateInstance { handed_off: bool },
    /// `--config` points at a file; the user was notified.
    InvalidConfigDirectory,
}

/// Outcome of the startup check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupDecision {
    /// Continue normal startup with the parsed intent.
    Proceed(LaunchIntent),
    /// Terminate immediately.
    Exit(ExitReason),
}

impl StartupDecision {
    /// Process exit code to use, or `None` when startup continues.
    ///
    /// Both exit paths are deliberate and report success.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            StartupDecision::Proceed(_) => None,
            StartupDecision::Exit(_) => Some(0),
        }
    }

    pub fn should_exit(&self) -> bool {
        matches!(self, StartupDecision::Exit(_))
    }
}

/// Wires argument validation, duplicate detection and command handoff.
pub struct StartupCheck<'a> {
    inspector: &'a dyn ProcessInspector,
    notifier: &'a dyn UserNotifier,
    endpoint: IpcEndpoint,
}

impl<'a> StartupCheck<'a> {
    pub fn new(
        inspector: &'a dyn ProcessInspector,
        notifier: &'a dyn UserNotifier,
        endpoint: IpcEndpoint,
    ) -> Self {
        Self {
            inspector,
            notifier,
            endpoint,
        }
    }

    /// Run the check for this process.
    ///
    /// `args` are the raw arguments `intent` was parsed from; they are
    /// consulted for the helper-process marker.
    pub async fn run<S: AsRef<str>>(&self, intent: LaunchIntent, args: &[S]) -> StartupDecision {
        if let Err(e) = intent.validate_config_directory() {
            warn!("Refusing to start: {}", e);
            if e.is_user_facing() {
                self.notifier.show_error(
                    MessageConfig::CONFIG_IS_FILE_TITLE,
                    MessageConfig::CONFIG_IS_FILE_MESSAGE,
                );
            }
            return StartupDecision::Exit(ExitReason::InvalidConfigDirectory);
        }

        let detector = DuplicateDetector::new(self.inspector);
        if let Some(existing) = detector.find_duplicate(&intent, args) {
            info!(
                "Instance already running (pid {}), handing off launch command",
                existing.pid
            );
            let outcome = IpcHandoff::new(self.endpoint.clone())
                .send_launch_command(intent.launch_command.as_deref())
                .await;
            return StartupDecision::Exit(ExitReason::DuplicateInstance {
                handed_off: outcome.is_sent(),
            });
        }

        StartupDecision::Proceed(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::SiblingProcess;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct FakeInspector(Vec<&'static str>);

    impl ProcessInspector for FakeInspector {
        fn sibling_processes(&self) -> Vec<SiblingProcess> {
            self.0
                .iter()
                .enumerate()
                .map(|(i, cmd)| SiblingProcess {
                    pid: 2000 + i as u32,
                    command_line: cmd.to_string(),
                })
                .collect()
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        shown: Mutex<Vec<(String, String)>>,
    }

    impl UserNotifier for RecordingNotifier {
        fn show_error(&self, title: &str, message: &str) {
            self.shown
                .lock()
                .unwrap()
                .push((title.to_string(), message.to_string()));
        }
    }

    fn unused_endpoint(temp_dir: &TempDir) -> IpcEndpoint {
        #[cfg(unix)]
        {
            IpcEndpoint::at_path(temp_dir.path().join("vrcx-ipc-test.sock"))
        }
        #[cfg(not(unix))]
        {
            let _ = temp_dir;
            IpcEndpoint::with_name(format!("vrcx-ipc-test-{}", std::process::id()))
        }
    }

    #[tokio::test]
    async fn test_no_siblings_proceeds() {
        let temp_dir = TempDir::new().unwrap();
        let inspector = FakeInspector(vec![]);
        let notifier = RecordingNotifier::default();
        let args = ["--startup", "vrcx://world/wrld_1"];
        let intent = LaunchIntent::parse(args);

        let decision = StartupCheck::new(&inspector, &notifier, unused_endpoint(&temp_dir))
            .run(intent.clone(), &args)
            .await;

        assert_eq!(decision, StartupDecision::Proceed(intent));
        assert_eq!(decision.exit_code(), None);
        assert!(notifier.shown.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_config_file_exits_with_notification() {
        let temp_dir = TempDir::new().unwrap();
        let db = temp_dir.path().join("VRCX.sqlite3");
        std::fs::write(&db, b"").unwrap();

        let inspector = FakeInspector(vec![]);
        let notifier = RecordingNotifier::default();
        let arg = format!("--config={}", db.display());
        let args = [arg.as_str()];

        let decision = StartupCheck::new(&inspector, &notifier, unused_endpoint(&temp_dir))
            .run(LaunchIntent::parse(args), &args)
            .await;

        assert_eq!(
            decision,
            StartupDecision::Exit(ExitReason::InvalidConfigDirectory)
        );
        assert_eq!(decision.exit_code(), Some(0));

        let shown = notifier.shown.lock().unwrap();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].0, "--config is now a directory");
        assert!(shown[0].1.contains("VRCX.sqlite3"));
    }

    #[tokio::test]
    async fn test_config_check_precedes_duplicate_check() {
        let temp_dir = TempDir::new().unwrap();
        let db = temp_dir.path().join("VRCX.sqlite3");
        std::fs::write(&db, b"").unwrap();

        // The sibling would match, but the file check stops first
        let inspector = FakeInspector(vec!["VRCX.exe"]);
        let notifier = RecordingNotifier::default();
        let arg = format!("--config={}", db.display());
        let args = [arg.as_str()];
        let intent = LaunchIntent::parse(args);
        assert!(intent.config_directory.is_some());

        let decision = StartupCheck::new(&inspector, &notifier, unused_endpoint(&temp_dir))
            .run(intent, &args)
            .await;
        assert_eq!(
            decision,
            StartupDecision::Exit(ExitReason::InvalidConfigDirectory)
        );
    }

    #[tokio::test]
    async fn test_missing_config_directory_is_accepted() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("does-not-exist");
        let inspector = FakeInspector(vec![]);
        let notifier = RecordingNotifier::default();
        let arg = format!("--config={}", missing.display());
        let args = [arg.as_str()];

        let decision = StartupCheck::new(&inspector, &notifier, unused_endpoint(&temp_dir))
            .run(LaunchIntent::parse(args), &args)
            .await;
        assert!(!decision.should_exit());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_duplicate_exits_after_handoff() {
        let temp_dir = TempDir::new().unwrap();
        let inspector = FakeInspector(vec!["VRCX.exe --config=D"]);
        let notifier = RecordingNotifier::default();
        let args = ["vrcx://auth?code=1", "--config=D"];

        // Nobody serves the endpoint; the handoff creates its own rendezvous
        let decision = StartupCheck::new(&inspector, &notifier, unused_endpoint(&temp_dir))
            .run(LaunchIntent::parse(args), &args)
            .await;

        assert_eq!(
            decision,
            StartupDecision::Exit(ExitReason::DuplicateInstance { handed_off: true })
        );
        assert_eq!(decision.exit_code(), Some(0));
    }

    #[tokio::test]
    async fn test_upgrade_proceeds_despite_sibling() {
        let temp_dir = TempDir::new().unwrap();
        let inspector = FakeInspector(vec!["VRCX.exe"]);
        let notifier = RecordingNotifier::default();
        let args = ["/Upgrade"];

        let decision = StartupCheck::new(&inspector, &notifier, unused_endpoint(&temp_dir))
            .run(LaunchIntent::parse(args), &args)
            .await;
        assert!(matches!(decision, StartupDecision::Proceed(intent) if intent.is_upgrade));
    }
}
