//! Local IPC for launch command handoff.
//!
//! A launch that turns out to duplicate a running instance forwards its
//! deep-link command over a named local channel and exits. The running
//! instance serves the channel and acts on what arrives.
//!
//! # Architecture
//!
//! - **Client**: one-shot handoff; ensures an endpoint exists, connects, writes one packet
//! - **Server**: runs in the primary instance, decodes packets, dispatches messages
//! - **Protocol**: message type and NUL-terminated framing shared by both
//! - **Transport**: named pipe (Windows) or Unix socket endpoint

pub mod client;
pub mod protocol;
pub mod server;
pub mod transport;

pub use client::{HandoffOutcome, IpcHandoff};
pub use protocol::IpcMessage;
pub use server::{IpcDispatch, IpcServer, IpcServerHandle};
pub use transport::IpcEndpoint;
