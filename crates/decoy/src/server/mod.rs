//! Embedded HTTP/1.1 server exposing a [`MockSession`] over the network.

mod defaults;
mod handler;

pub use defaults::{DefaultResponse, HeaderPair};

use crate::error::ServerError;
use crate::session::MockSession;
use handler::handle_request;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info};

/// A running mock server bound to a local address.
///
/// Dropping the server signals shutdown without waiting for it; call
/// [`MockServer::stop`] to wait until open connections have drained.
pub struct MockServer {
    addr: SocketAddr,
    session: Arc<MockSession>,
    shutdown_tx: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl MockServer {
    /// Bind `addr` (port 0 picks a free port) and start serving `session`.
    pub async fn start(session: Arc<MockSession>, addr: SocketAddr) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;

        info!("Mock server bound to {}", addr);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(accept_loop(listener, Arc::clone(&session), shutdown_rx));

        Ok(Self {
            addr,
            session,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    /// Base URI, e.g. `http://127.0.0.1:49152`.
    pub fn uri(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Absolute URL for `path` on this server.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.uri(), path)
    }

    pub fn session(&self) -> &Arc<MockSession> {
        &self.session
    }

    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some()
    }

    /// Stop accepting connections and wait until every open connection has
    /// finished its in-flight exchange and closed.
    pub async fn stop(&mut self) -> Result<(), ServerError> {
        let shutdown_tx = self.shutdown_tx.take().ok_or(ServerError::NotRunning)?;
        let _ = shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Mock server task on {} failed: {}", self.addr, e);
            }
        }
        info!("Mock server on {} stopped", self.addr);
        Ok(())
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    session: Arc<MockSession>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, peer)) => {
                        let session = Arc::clone(&session);
                        let mut conn_shutdown = shutdown_rx.clone();
                        connections.spawn(async move {
                            let io = TokioIo::new(stream);
                            let service = service_fn(move |req| {
                                handle_request(req, Arc::clone(&session))
                            });
                            let conn = http1::Builder::new().serve_connection(io, service);
                            tokio::pin!(conn);
                            tokio::select! {
                                result = conn.as_mut() => {
                                    if let Err(e) = result {
                                        debug!("Connection error from {}: {}", peer, e);
                                    }
                                }
                                _ = conn_shutdown.changed() => {
                                    conn.as_mut().graceful_shutdown();
                                    if let Err(e) = conn.await {
                                        debug!("Connection error from {} during shutdown: {}", peer, e);
                                    }
                                }
                            }
                        });
                    }
                    Err(e) => {
                        error!("Accept error: {}", e);
                    }
                }
            }
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            _ = shutdown_rx.changed() => {
                debug!(
                    "Accept loop shutting down, draining {} connection(s)",
                    connections.len()
                );
                break;
            }
        }
    }

    drop(listener);
    while let Some(result) = connections.join_next().await {
        if let Err(e) = result {
            error!("Connection task failed: {}", e);
        }
    }
}
