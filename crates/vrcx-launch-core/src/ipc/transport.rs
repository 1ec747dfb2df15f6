//! Named local channel transport.
//!
//! # Platform Behavior
//! - **Windows**: named pipe `\\.\pipe\vrcx-ipc-<session>`; every accepted
//!   client gets its own pipe instance
//! - **Linux/macOS**: Unix domain socket `<runtime dir>/vrcx-ipc-<session>.sock`

use crate::platform::paths;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

#[cfg(unix)]
use tokio::net::{UnixListener, UnixStream};

#[cfg(windows)]
use tokio::net::windows::named_pipe::{ClientOptions, NamedPipeClient, NamedPipeServer, ServerOptions};

/// Stream returned by [`connect`].
#[cfg(unix)]
pub type ClientStream = UnixStream;
/// Stream returned by [`connect`].
#[cfg(windows)]
pub type ClientStream = NamedPipeClient;

/// Stream returned by [`Listener::accept`].
#[cfg(unix)]
pub type ServerStream = UnixStream;
/// Stream returned by [`Listener::accept`].
#[cfg(windows)]
pub type ServerStream = NamedPipeServer;

/// Resolved name and address of a launch channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpcEndpoint {
    name: String,
    address: PathBuf,
}

impl IpcEndpoint {
    /// Endpoint shared by every instance in the current user session.
    pub fn for_current_session() -> Self {
        Self::with_name(paths::ipc_endpoint_name())
    }

    /// Endpoint with an explicit name.
    pub fn with_name(name: impl Into<String>) -> Self {
        let name = name.into();
        #[cfg(unix)]
        let address = paths::ipc_socket_dir().join(format!("{}.sock", name));
        #[cfg(windows)]
        let address = PathBuf::from(format!(r"\\.\pipe\{}", name));
        Self { name, address }
    }

    /// Endpoint bound to a specific socket path.
    #[cfg(unix)]
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        let address = path.into();
        let name = address
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { name, address }
    }

    /// Endpoint name (without platform decoration).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Socket path or pipe path.
    pub fn address(&self) -> &Path {
        &self.address
    }
}

impl fmt::Display for IpcEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address.display())
    }
}

/// Connect to an endpoint as a client.
///
/// On Windows a busy pipe is retried until the caller's timeout cancels.
pub async fn connect(endpoint: &IpcEndpoint) -> io::Result<ClientStream> {
    #[cfg(unix)]
    {
        UnixStream::connect(endpoint.address()).await
    }

    #[cfg(windows)]
    {
        use crate::config::IpcConfig;
        use windows_sys::Win32::Foundation::ERROR_PIPE_BUSY;

        loop {
            match ClientOptions::new().open(endpoint.address()) {
                Ok(client) => return Ok(client),
                Err(e) if e.raw_os_error() == Some(ERROR_PIPE_BUSY as i32) => {}
                Err(e) => return Err(e),
            }
            tokio::time::sleep(IpcConfig::PIPE_BUSY_RETRY_INTERVAL).await;
        }
    }
}

/// Whether the socket file at the endpoint was left behind by a dead server.
///
/// Only a refused or missing target counts as stale; any other connect error
/// (a full backlog, permissions) means the file may still belong to a live
/// server.
#[cfg(unix)]
async fn endpoint_stale(endpoint: &IpcEndpoint) -> bool {
    match UnixStream::connect(endpoint.address()).await {
        Ok(_) => false,
        Err(e) => {
            let stale = is_stale_socket_error(&e);
            if !stale {
                debug!("Probe of {} failed, treating as in use: {}", endpoint, e);
            }
            stale
        }
    }
}

#[cfg(unix)]
fn is_stale_socket_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound
    )
}

/// Server side of a launch channel.
///
/// Dropping the listener closes the endpoint (and on Unix removes the socket
/// file it created).
pub struct Listener {
    endpoint: IpcEndpoint,
    #[cfg(unix)]
    inner: UnixListener,
    #[cfg(windows)]
    next: NamedPipeServer,
}

impl Listener {
    /// Create the endpoint.
    ///
    /// Fails with `AddrInUse` (Unix) or an access error (Windows) when a live
    /// server already owns it. A stale Unix socket file left by a crashed
    /// instance is removed first.
    pub async fn bind(endpoint: &IpcEndpoint) -> io::Result<Self> {
        #[cfg(unix)]
        {
            let path = endpoint.address();
            if path.exists() {
                if !endpoint_stale(endpoint).await {
                    return Err(io::Error::new(
                        io::ErrorKind::AddrInUse,
                        format!("{} is already being served", endpoint),
                    ));
                }
                debug!("Removing stale IPC socket {}", endpoint);
                std::fs::remove_file(path)?;
            }
            let inner = UnixListener::bind(path)?;
            Ok(Self {
                endpoint: endpoint.clone(),
                inner,
            })
        }

        #[cfg(windows)]
        {
            let next = ServerOptions::new()
                .first_pipe_instance(true)
                .create(endpoint.address())?;
            Ok(Self {
                endpoint: endpoint.clone(),
                next,
            })
        }
    }

    /// Wait for the next client.
    pub async fn accept(&mut self) -> io::Result<ServerStream> {
        #[cfg(unix)]
        {
            let (stream, _addr) = self.inner.accept().await?;
            Ok(stream)
        }

        #[cfg(windows)]
        {
            self.next.connect().await?;
            let fresh = ServerOptions::new().create(self.endpoint.address())?;
            Ok(std::mem::replace(&mut self.next, fresh))
        }
    }

    /// Endpoint this listener serves.
    pub fn endpoint(&self) -> &IpcEndpoint {
        &self.endpoint
    }
}

#[cfg(unix)]
impl Drop for Listener {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(self.endpoint.address()) {
            debug!("Failed to remove IPC socket {}: {}", self.endpoint, e);
        }
    }
}

/// Make sure a server endpoint exists before connecting to it.
///
/// Returns the listener when this process had to create the endpoint itself;
/// `None` when another process already serves it or creation failed.
pub async fn ensure_rendezvous(endpoint: &IpcEndpoint) -> Option<Listener> {
    match Listener::bind(endpoint).await {
        Ok(listener) => {
            debug!("No live endpoint at {}, created rendezvous", endpoint);
            Some(listener)
        }
        Err(e) => {
            debug!("Using existing endpoint {} ({})", endpoint, e);
            None
        }
    }
}
