//! Start/stop lifecycle shared by the coordinator and storage nodes

use crate::common::{Error, Result};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Lifecycle state of a server instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Created,
    Running,
    Stopped,
}

/// A long-running server that can be started and stopped.
///
/// `start` returns once the listener is bound and the instance is ready to
/// serve. `stop` on an instance that is not running is a no-op.
#[allow(async_fn_in_trait)]
pub trait Instance {
    async fn start(&mut self) -> Result<()>;
    async fn stop(&mut self);
    fn state(&self) -> LifecycleState;
}

/// Handle to a spawned axum server plus the state machine around it
pub(crate) struct ServerHandle {
    state: LifecycleState,
    local_addr: Option<SocketAddr>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ServerHandle {
    pub(crate) fn new() -> Self {
        Self {
            state: LifecycleState::Created,
            local_addr: None,
            shutdown_tx: None,
            task: None,
        }
    }

    pub(crate) fn state(&self) -> LifecycleState {
        self.state
    }

    pub(crate) fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub(crate) fn ensure_created(&self, what: &str) -> Result<()> {
        match self.state {
            LifecycleState::Created => Ok(()),
            other => Err(Error::InvalidState(format!(
                "cannot start {} in state {:?}",
                what, other
            ))),
        }
    }

    /// Bind `addr` and serve `router` in a background task.
    ///
    /// The listener is bound before this returns, so callers may talk to the
    /// server (or announce it) immediately.
    pub(crate) async fn spawn(&mut self, addr: SocketAddr, router: axum::Router) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let server = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = server.await {
                tracing::error!("HTTP server error: {}", e);
            }
        });

        self.local_addr = Some(local_addr);
        self.shutdown_tx = Some(shutdown_tx);
        self.task = Some(task);
        self.state = LifecycleState::Running;
        Ok(())
    }

    /// Signal graceful shutdown and wait for the server task to finish.
    pub(crate) async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("server task ended abnormally: {}", e);
            }
        }
        self.state = LifecycleState::Stopped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_state_machine() {
        let mut handle = ServerHandle::new();
        assert_eq!(handle.state(), LifecycleState::Created);
        assert!(handle.ensure_created("test").is_ok());

        handle
            .spawn("127.0.0.1:0".parse().unwrap(), axum::Router::new())
            .await
            .unwrap();
        assert_eq!(handle.state(), LifecycleState::Running);
        assert!(handle.local_addr().unwrap().port() > 0);
        assert!(handle.ensure_created("test").is_err());

        handle.shutdown().await;
        assert_eq!(handle.state(), LifecycleState::Stopped);

        // stopping twice is a no-op
        handle.shutdown().await;
        assert_eq!(handle.state(), LifecycleState::Stopped);
        assert!(handle.ensure_created("test").is_err());
    }
}
