//! One-shot launch command handoff.
//!
//! Used by a process that found a running duplicate: deliver its deep-link
//! command to the running instance, then let the caller exit. Nothing waits
//! for an acknowledgement and nothing is retried.

use super::protocol::{write_frame, IpcMessage};
use super::transport::{self, IpcEndpoint};
use crate::config::IpcConfig;
use tokio::time::{sleep, timeout};
use tracing::{debug, info};

/// Result of a handoff attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffOutcome {
    /// The packet was written to the channel.
    Sent,
    /// Connecting or writing failed; the command was dropped.
    Dropped,
}

impl HandoffOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, HandoffOutcome::Sent)
    }
}

/// Sends a launch command to the instance serving an endpoint.
#[derive(Debug, Clone)]
pub struct IpcHandoff {
    endpoint: IpcEndpoint,
}

impl IpcHandoff {
    pub fn new(endpoint: IpcEndpoint) -> Self {
        Self { endpoint }
    }

    /// Deliver `command` (empty when absent) and return once the write has
    /// finished or the flush timeout expired, plus a short grace delay.
    ///
    /// Never fails: connection errors only change the outcome.
    pub async fn send_launch_command(&self, command: Option<&str>) -> HandoffOutcome {
        // Keep a self-created endpoint open until the write is done
        let _rendezvous = transport::ensure_rendezvous(&self.endpoint).await;

        let packet = match IpcMessage::launch_command(command.unwrap_or_default()).to_packet() {
            Ok(packet) => packet,
            Err(e) => {
                debug!("Failed to encode launch command: {}", e);
                return HandoffOutcome::Dropped;
            }
        };

        let mut stream = match timeout(
            IpcConfig::CONNECT_TIMEOUT,
            transport::connect(&self.endpoint),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                debug!("Handoff connect to {} failed: {}", self.endpoint, e);
                return HandoffOutcome::Dropped;
            }
            Err(_) => {
                debug!(
                    "Handoff connect to {} timed out after {:?}",
                    self.endpoint,
                    IpcConfig::CONNECT_TIMEOUT
                );
                return HandoffOutcome::Dropped;
            }
        };

        let write = tokio::spawn(async move { write_frame(&mut stream, &packet).await });

        let outcome = match timeout(IpcConfig::FLUSH_TIMEOUT, write).await {
            Ok(Ok(Ok(()))) => HandoffOutcome::Sent,
            Ok(Ok(Err(e))) => {
                debug!("Handoff write failed: {}", e);
                HandoffOutcome::Dropped
            }
            Ok(Err(e)) => {
                debug!("Handoff write task failed: {}", e);
                HandoffOutcome::Dropped
            }
            Err(_) => {
                debug!("Handoff write still pending after {:?}", IpcConfig::FLUSH_TIMEOUT);
                HandoffOutcome::Dropped
            }
        };

        sleep(IpcConfig::EXIT_GRACE).await;

        info!("Launch command handoff to {}: {:?}", self.endpoint, outcome);
        outcome
    }
}
