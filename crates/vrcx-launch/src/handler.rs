//! Launch commands received from later launches.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};
use vrcx_launch_core::{IpcDispatch, IpcMessage};

/// Queues deep-link commands forwarded by duplicate launches.
///
/// The application drains the queue when it is ready to act on them.
#[derive(Debug, Default)]
pub struct LaunchCommandHandler {
    pending: Mutex<Vec<String>>,
}

impl LaunchCommandHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue this process's own launch command.
    pub async fn push(&self, command: String) {
        if command.is_empty() {
            debug!("Ignoring empty launch command");
            return;
        }
        info!("Launch command queued: {}", command);
        self.pending.lock().await.push(command);
    }

    /// Take every queued command in arrival order.
    pub async fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.pending.lock().await)
    }
}

#[async_trait]
impl IpcDispatch for LaunchCommandHandler {
    async fn dispatch(&self, message: IpcMessage) {
        match message {
            IpcMessage::LaunchCommand { command } => {
                if command.is_empty() {
                    // A plain relaunch: the running window just gets focus
                    info!("Duplicate launch without command");
                    return;
                }
                self.push(command).await;
            }
        }
    }
}
