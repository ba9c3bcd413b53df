//! Coordinator server

use crate::common::lifecycle::ServerHandle;
use crate::common::{CoordinatorConfig, Instance, LifecycleState, Result};
use crate::coordinator::http::{create_router, CoordState};
use crate::coordinator::metadata::FileTable;
use crate::coordinator::node_client::NodeClient;
use crate::coordinator::orchestrator::Orchestrator;
use crate::coordinator::registry::NodeRegistry;
use std::net::SocketAddr;
use std::sync::Arc;

/// Owns the node registry, the file table and the HTTP listener.
pub struct Coordinator {
    config: CoordinatorConfig,
    registry: Arc<NodeRegistry>,
    files: Arc<FileTable>,
    server: ServerHandle,
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        Self {
            config,
            registry: Arc::new(NodeRegistry::new()),
            files: Arc::new(FileTable::new()),
            server: ServerHandle::new(),
        }
    }

    /// Address the listener is bound to, once running
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.local_addr()
    }

    /// Run until Ctrl-C, then shut down gracefully.
    pub async fn serve(mut self) -> Result<()> {
        self.start().await?;
        tokio::signal::ctrl_c().await?;
        tracing::info!("got termination signal, stopping coordinator");
        self.stop().await;
        Ok(())
    }
}

impl Instance for Coordinator {
    async fn start(&mut self) -> Result<()> {
        self.server.ensure_created("coordinator")?;

        tracing::info!("Starting coordinator");
        tracing::info!("  HTTP API: {}", self.config.bind_addr);
        tracing::info!("  Node timeout: {:?}", self.config.node_timeout());

        let client = NodeClient::new(self.config.node_timeout())?;
        let orchestrator = Orchestrator::new(self.registry.clone(), self.files.clone(), client);
        let state = CoordState {
            orchestrator: Arc::new(orchestrator),
        };
        let router = create_router(state, self.config.max_file_size as usize);

        self.server.spawn(self.config.bind_addr, router).await?;
        if let Some(addr) = self.server.local_addr() {
            tracing::info!("✓ Coordinator ready on {}", addr);
        }
        Ok(())
    }

    async fn stop(&mut self) {
        let was_running = self.server.state() == LifecycleState::Running;
        self.server.shutdown().await;
        if was_running {
            tracing::info!("coordinator stopped");
        }
    }

    fn state(&self) -> LifecycleState {
        self.server.state()
    }
}
