//! Launch channel listener for the running instance.
//!
//! Accepts connections on the session endpoint, splits each connection's byte
//! stream on NUL terminators and hands every decoded [`IpcMessage`] to an
//! [`IpcDispatch`] implementation.
//!
//! # Thread Safety
//!
//! The accept loop and each connection run in their own tokio tasks. The
//! dispatcher is shared via `Arc` and must synchronize internally.

use super::protocol::{read_frame, IpcMessage};
use super::transport::{IpcEndpoint, Listener, ServerStream};
use crate::config::IpcConfig;
use crate::error::{LaunchError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::sync::{oneshot, watch};
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

/// Handle to a running IPC server. Dropping shuts down the server.
pub struct IpcServerHandle {
    endpoint: IpcEndpoint,
    shutdown_tx: Option<oneshot::Sender<()>>,
    conn_shutdown_tx: watch::Sender<bool>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl IpcServerHandle {
    /// Endpoint the server is listening on.
    pub fn endpoint(&self) -> &IpcEndpoint {
        &self.endpoint
    }

    /// Stop accepting connections and close active ones.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.conn_shutdown_tx.send(true);
    }
}

impl Drop for IpcServerHandle {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

/// Receiver for messages arriving on the launch channel.
#[async_trait::async_trait]
pub trait IpcDispatch: Send + Sync + 'static {
    /// Handle one decoded message.
    async fn dispatch(&self, message: IpcMessage);
}

/// IPC server for the primary instance.
pub struct IpcServer;

impl IpcServer {
    /// Bind the endpoint and start serving in background tasks.
    ///
    /// Fails when another live instance already serves the endpoint.
    pub async fn start<D: IpcDispatch>(
        endpoint: IpcEndpoint,
        dispatch: Arc<D>,
    ) -> Result<IpcServerHandle> {
        let listener = Listener::bind(&endpoint).await.map_err(|e| LaunchError::Ipc {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

        info!("IPC server listening on {}", endpoint);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (conn_shutdown_tx, conn_shutdown_rx) = watch::channel(false);
        let active_connections = Arc::new(AtomicUsize::new(0));

        let task_handle = tokio::spawn(Self::accept_loop(
            listener,
            dispatch,
            shutdown_rx,
            conn_shutdown_rx,
            active_connections,
        ));

        Ok(IpcServerHandle {
            endpoint,
            shutdown_tx: Some(shutdown_tx),
            conn_shutdown_tx,
            task_handle: Some(task_handle),
        })
    }

    /// Like [`IpcServer::start`], but keep retrying while the endpoint is
    /// taken, up to `max_wait`.
    ///
    /// A duplicate launch briefly owns the endpoint during its handoff; a
    /// starting instance that loses that race gets the endpoint once the
    /// duplicate exits.
    pub async fn start_with_retry<D: IpcDispatch>(
        endpoint: IpcEndpoint,
        dispatch: Arc<D>,
        max_wait: Duration,
    ) -> Result<IpcServerHandle> {
        let deadline = Instant::now() + max_wait;
        let mut attempts = 1u32;
        loop {
            match Self::start(endpoint.clone(), dispatch.clone()).await {
                Ok(handle) => {
                    if attempts > 1 {
                        info!("IPC endpoint {} bound after {} attempts", endpoint, attempts);
                    }
                    return Ok(handle);
                }
                Err(e) if Instant::now() < deadline => {
                    debug!("IPC bind attempt {} failed, retrying: {}", attempts, e);
                }
                Err(e) => return Err(e),
            }
            attempts += 1;
            sleep(IpcConfig::BIND_RETRY_INTERVAL).await;
        }
    }

    async fn accept_loop<D: IpcDispatch>(
        mut listener: Listener,
        dispatch: Arc<D>,
        mut shutdown_rx: oneshot::Receiver<()>,
        conn_shutdown_rx: watch::Receiver<bool>,
        active_connections: Arc<AtomicUsize>,
    ) {
        let endpoint = listener.endpoint().clone();
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    info!("IPC server shutting down");
                    break;
                }
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok(stream) => {
                            let current = active_connections.load(Ordering::Relaxed);
                            if current >= IpcConfig::MAX_CONNECTIONS {
                                warn!(
                                    "Rejecting IPC connection: at max capacity ({})",
                                    IpcConfig::MAX_CONNECTIONS
                                );
                                continue;
                            }

                            active_connections.fetch_add(1, Ordering::Relaxed);
                            let dispatch = dispatch.clone();
                            let conns = active_connections.clone();
                            let mut conn_shutdown = conn_shutdown_rx.clone();

                            tokio::spawn(async move {
                                if let Err(e) = Self::handle_connection(stream, &*dispatch, &mut conn_shutdown).await {
                                    debug!("IPC connection ended: {}", e);
                                }
                                conns.fetch_sub(1, Ordering::Relaxed);
                            });
                        }
                        Err(e) => {
                            error!("IPC accept error on {}: {}", endpoint, e);
                        }
                    }
                }
            }
        }
    }

    async fn handle_connection<D: IpcDispatch>(
        stream: ServerStream,
        dispatch: &D,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> Result<()> {
        let mut reader = BufReader::new(stream);

        loop {
            let frame = tokio::select! {
                result = read_frame(&mut reader) => {
                    match result? {
                        Some(f) => f,
                        None => return Ok(()),
                    }
                }
                _ = shutdown_rx.changed() => {
                    return Ok(());
                }
            };

            match IpcMessage::from_packet(&frame) {
                Ok(message) => {
                    debug!("IPC message received: {:?}", message);
                    dispatch.dispatch(message).await;
                }
                Err(e) => {
                    warn!("Ignoring malformed IPC packet ({} bytes): {}", frame.len(), e);
                }
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::ipc::protocol::write_frame;
    use crate::ipc::transport::connect;
    use crate::ipc::transport::ensure_rendezvous;
    use tempfile::TempDir;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct CollectDispatch {
        messages: Mutex<Vec<IpcMessage>>,
    }

    #[async_trait::async_trait]
    impl IpcDispatch for CollectDispatch {
        async fn dispatch(&self, message: IpcMessage) {
            self.messages.lock().await.push(message);
        }
    }

    async fn wait_for_messages(dispatch: &CollectDispatch, count: usize) -> Vec<IpcMessage> {
        for _ in 0..40 {
            {
                let messages = dispatch.messages.lock().await;
                if messages.len() >= count {
                    return messages.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        dispatch.messages.lock().await.clone()
    }

    fn temp_endpoint(temp_dir: &TempDir) -> IpcEndpoint {
        IpcEndpoint::at_path(temp_dir.path().join("vrcx-ipc-test.sock"))
    }

    #[tokio::test]
    async fn test_server_start_and_shutdown() {
        let temp_dir = TempDir::new().unwrap();
        let dispatch = Arc::new(CollectDispatch::default());
        let mut handle = IpcServer::start(temp_endpoint(&temp_dir), dispatch)
            .await
            .unwrap();

        assert!(handle.endpoint().address().exists());
        handle.shutdown();
    }

    #[tokio::test]
    async fn test_second_server_on_same_endpoint_fails() {
        let temp_dir = TempDir::new().unwrap();
        let _handle = IpcServer::start(temp_endpoint(&temp_dir), Arc::new(CollectDispatch::default()))
            .await
            .unwrap();

        let second =
            IpcServer::start(temp_endpoint(&temp_dir), Arc::new(CollectDispatch::default())).await;
        assert!(matches!(second, Err(LaunchError::Ipc { .. })));
    }

    #[tokio::test]
    async fn test_multiple_messages_on_one_connection() {
        let temp_dir = TempDir::new().unwrap();
        let dispatch = Arc::new(CollectDispatch::default());
        let handle = IpcServer::start(temp_endpoint(&temp_dir), dispatch.clone())
            .await
            .unwrap();

        let mut stream = connect(handle.endpoint()).await.unwrap();
        let mut bytes = IpcMessage::launch_command("one").to_packet().unwrap();
        bytes.extend(IpcMessage::launch_command("two").to_packet().unwrap());
        write_frame(&mut stream, &bytes).await.unwrap();

        let messages = wait_for_messages(&dispatch, 2).await;
        assert_eq!(
            messages,
            vec![
                IpcMessage::launch_command("one"),
                IpcMessage::launch_command("two")
            ]
        );
    }

    #[tokio::test]
    async fn test_malformed_packet_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let dispatch = Arc::new(CollectDispatch::default());
        let handle = IpcServer::start(temp_endpoint(&temp_dir), dispatch.clone())
            .await
            .unwrap();

        let mut stream = connect(handle.endpoint()).await.unwrap();
        let mut bytes = b"not json\0".to_vec();
        bytes.extend(IpcMessage::launch_command("after").to_packet().unwrap());
        write_frame(&mut stream, &bytes).await.unwrap();

        let messages = wait_for_messages(&dispatch, 1).await;
        assert_eq!(messages, vec![IpcMessage::launch_command("after")]);
    }

    #[tokio::test]
    async fn test_retry_binds_after_handoff_endpoint_released() {
        let temp_dir = TempDir::new().unwrap();
        let endpoint = temp_endpoint(&temp_dir);

        // A duplicate launch's handoff currently owns the endpoint
        let rendezvous = ensure_rendezvous(&endpoint).await.unwrap();
        assert!(IpcServer::start(endpoint.clone(), Arc::new(CollectDispatch::default()))
            .await
            .is_err());

        let dispatch = Arc::new(CollectDispatch::default());
        let starting = tokio::spawn(IpcServer::start_with_retry(
            endpoint.clone(),
            dispatch.clone(),
            Duration::from_secs(5),
        ));

        tokio::time::sleep(Duration::from_millis(150)).await;
        drop(rendezvous);

        let handle = starting.await.unwrap().unwrap();
        assert!(endpoint.address().exists());

        let mut stream = connect(handle.endpoint()).await.unwrap();
        let packet = IpcMessage::launch_command("late").to_packet().unwrap();
        write_frame(&mut stream, &packet).await.unwrap();

        let messages = wait_for_messages(&dispatch, 1).await;
        assert_eq!(messages, vec![IpcMessage::launch_command("late")]);
    }

    #[tokio::test]
    async fn test_retry_gives_up_while_endpoint_served() {
        let temp_dir = TempDir::new().unwrap();
        let _first = IpcServer::start(temp_endpoint(&temp_dir), Arc::new(CollectDispatch::default()))
            .await
            .unwrap();

        let second = IpcServer::start_with_retry(
            temp_endpoint(&temp_dir),
            Arc::new(CollectDispatch::default()),
            Duration::from_millis(200),
        )
        .await;
        assert!(matches!(second, Err(LaunchError::Ipc { .. })));
    }

    #[tokio::test]
    async fn test_drop_removes_endpoint() {
        let temp_dir = TempDir::new().unwrap();
        let endpoint = temp_endpoint(&temp_dir);
        let handle = IpcServer::start(endpoint.clone(), Arc::new(CollectDispatch::default()))
            .await
            .unwrap();
        drop(handle);

        // The accept task owns the listener; give the runtime a moment to drop it
        for _ in 0..40 {
            if !endpoint.address().exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        assert!(!endpoint.address().exists());
    }
}
