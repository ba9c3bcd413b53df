//! Storage node server

use crate::common::lifecycle::ServerHandle;
use crate::common::{validate_node_id, Error, Instance, LifecycleState, Result, VolumeConfig};
use crate::coordinator::http::RegisterRequest;
use crate::volume::blob::BlobStore;
use crate::volume::http::{create_router, VolumeState};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

const REGISTER_TIMEOUT: Duration = Duration::from_secs(5);

pub struct VolumeServer {
    node_id: String,
    config: VolumeConfig,
    store: Arc<BlobStore>,
    server: ServerHandle,
}

impl VolumeServer {
    /// Validates the node id and the storage directory up front.
    pub fn new(node_id: String, config: VolumeConfig) -> Result<Self> {
        validate_node_id(&node_id)?;
        let store = BlobStore::open(&config.data_path)?;
        if config.coordinator_url.is_empty() {
            tracing::warn!("coordinator address empty, node will not register");
        }
        Ok(Self {
            node_id,
            config,
            store: Arc::new(store),
            server: ServerHandle::new(),
        })
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.local_addr()
    }

    /// Run until Ctrl-C, then shut down gracefully.
    pub async fn serve(mut self) -> Result<()> {
        self.start().await?;
        tokio::signal::ctrl_c().await?;
        tracing::info!("got termination signal, stopping volume server");
        self.stop().await;
        Ok(())
    }

    /// Announce this node to the coordinator once. No retry.
    async fn register(&self, port: u16) -> Result<()> {
        if self.config.coordinator_url.is_empty() {
            return Ok(());
        }

        let url = format!(
            "{}/register",
            self.config.coordinator_url.trim_end_matches('/')
        );
        let req = RegisterRequest {
            id: self.node_id.clone(),
            port,
        };

        let client = reqwest::Client::builder()
            .timeout(REGISTER_TIMEOUT)
            .build()
            .map_err(|e| Error::RegistrationFailed(e.to_string()))?;
        let resp = client
            .post(&url)
            .json(&req)
            .send()
            .await
            .map_err(|e| Error::RegistrationFailed(format!("{}: {}", url, e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::RegistrationFailed(format!(
                "{} answered {}: {}",
                url, status, body
            )));
        }
        Ok(())
    }
}

impl Instance for VolumeServer {
    /// Binds the listener, then registers with the coordinator. If the
    /// registration fails the listener is shut down again and the node ends
    /// up `Stopped`.
    async fn start(&mut self) -> Result<()> {
        self.server.ensure_created("volume server")?;

        tracing::info!("Starting volume server: {}", self.node_id);
        tracing::info!("  HTTP API: {}", self.config.bind_addr);
        tracing::info!("  Data path: {}", self.store.root().display());
        tracing::info!("  Coordinator: {}", self.config.coordinator_url);

        let state = VolumeState {
            store: self.store.clone(),
            node_id: self.node_id.clone(),
        };
        let router = create_router(state, self.config.max_shard_size as usize);
        self.server.spawn(self.config.bind_addr, router).await?;

        let port = match self.server.local_addr() {
            Some(addr) => addr.port(),
            None => self.config.bind_addr.port(),
        };

        if let Err(e) = self.register(port).await {
            tracing::error!(error = %e, "cant register in coordinator");
            self.server.shutdown().await;
            return Err(e);
        }

        tracing::info!("✓ Volume server {} ready on port {}", self.node_id, port);
        Ok(())
    }

    async fn stop(&mut self) {
        let was_running = self.server.state() == LifecycleState::Running;
        self.server.shutdown().await;
        if was_running {
            tracing::info!(node_id = %self.node_id, "volume server stopped");
        }
    }

    fn state(&self) -> LifecycleState {
        self.server.state()
    }
}
