//! Shared IPC message types and framing.
//!
//! The channel has no framing of its own, so every message is a UTF-8 JSON
//! object followed by a single NUL byte:
//!
//! ```text
//! {"type":"LaunchCommand","command":"<command>"}\0
//! ```

use crate::config::IpcConfig;
use crate::error::{LaunchError, Result};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Message sent over the launch channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IpcMessage {
    /// Deep-link command for the running instance to act on.
    LaunchCommand { command: String },
}

impl IpcMessage {
    /// Create a launch command message.
    pub fn launch_command(command: impl Into<String>) -> Self {
        IpcMessage::LaunchCommand {
            command: command.into(),
        }
    }

    /// Encode as a NUL-terminated packet.
    ///
    /// The command is JSON-escaped, so quotes and backslashes in it survive.
    pub fn to_packet(&self) -> Result<Vec<u8>> {
        let mut packet = serde_json::to_vec(self)?;
        packet.push(IpcConfig::MESSAGE_TERMINATOR);
        Ok(packet)
    }

    /// Decode a packet body (terminator already removed).
    pub fn from_packet(body: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(body).map_err(|_| LaunchError::Validation {
            field: "ipc_payload".to_string(),
            message: "Invalid UTF-8 in IPC packet".to_string(),
        })?;
        Ok(serde_json::from_str(text)?)
    }
}

/// Read one NUL-terminated frame from a buffered reader.
///
/// Returns `None` on EOF. Bytes left without a terminator when the peer
/// closes are discarded.
pub async fn read_frame<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let limit = (IpcConfig::MAX_MESSAGE_SIZE + 1) as u64;
    let mut frame = Vec::new();
    let read = (&mut *reader)
        .take(limit)
        .read_until(IpcConfig::MESSAGE_TERMINATOR, &mut frame)
        .await?;

    if read == 0 {
        return Ok(None);
    }

    if frame.last() == Some(&IpcConfig::MESSAGE_TERMINATOR) {
        frame.pop();
        return Ok(Some(frame));
    }

    if frame.len() > IpcConfig::MAX_MESSAGE_SIZE {
        return Err(LaunchError::Validation {
            field: "ipc_frame".to_string(),
            message: format!(
                "IPC message exceeds maximum {} bytes",
                IpcConfig::MAX_MESSAGE_SIZE
            ),
        });
    }

    debug!("Discarding {} unterminated bytes at EOF", frame.len());
    Ok(None)
}

/// Write a packet (already terminated) and flush.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, packet: &[u8]) -> Result<()> {
    writer.write_all(packet).await?;
    writer.flush().await?;
    Ok(())
}
