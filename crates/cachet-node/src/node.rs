//! Cachet node: wires storage, resolution and the credential engine together
//! and serves them over HTTP.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use cachet_core::{Did, StageOutcome};
use cachet_credentials::{CredentialEngine, EngineContext, HistoryBackend, VerificationObserver};
use cachet_identity::{DocumentFetcher, HttpsDocumentFetcher, IdentityError, InMemoryDocumentRegistry};

use crate::api;
use crate::config::CachetConfig;
use crate::state::NodeState;
use crate::storage::RocksHistoryBackend;

/// Serves documents published by this node, falling back to HTTPS for
/// everything else when remote fetching is enabled.
pub struct NodeDocumentFetcher {
    local: Arc<InMemoryDocumentRegistry>,
    remote: Option<HttpsDocumentFetcher>,
}

impl NodeDocumentFetcher {
    pub fn new(local: Arc<InMemoryDocumentRegistry>, remote: Option<HttpsDocumentFetcher>) -> Self {
        Self { local, remote }
    }
}

#[async_trait]
impl DocumentFetcher for NodeDocumentFetcher {
    async fn fetch(&self, did: &Did) -> Result<Vec<u8>, IdentityError> {
        match (self.local.fetch(did).await, &self.remote) {
            (Err(IdentityError::NotFound(_)), Some(remote)) => {
                tracing::debug!(%did, "document not published locally, fetching over HTTPS");
                remote.fetch(did).await
            }
            (result, _) => result,
        }
    }
}

/// Logs every verification stage outcome.
struct StageLogger;

impl VerificationObserver for StageLogger {
    fn on_stage(&self, outcome: &StageOutcome) {
        tracing::debug!(
            stage = ?outcome.stage,
            passed = outcome.passed,
            detail = outcome.detail.as_deref().unwrap_or(""),
            "verification stage"
        );
    }
}

/// The Cachet node.
pub struct CachetNode {
    config: CachetConfig,
    state: Arc<NodeState>,
}

impl CachetNode {
    /// Create a node persisting history under the configured data directory.
    pub fn new(config: CachetConfig) -> Result<Self> {
        config.validate()?;
        let backend = Arc::new(RocksHistoryBackend::open(&config.history_dir())?);
        Self::with_backend(config, backend)
    }

    /// Create a node over an explicit history backend.
    pub fn with_backend(config: CachetConfig, backend: Arc<dyn HistoryBackend>) -> Result<Self> {
        let registry = Arc::new(InMemoryDocumentRegistry::new());
        let remote = if config.resolver.remote_fetch {
            Some(HttpsDocumentFetcher::new()?)
        } else {
            None
        };
        let fetcher = Arc::new(NodeDocumentFetcher::new(registry.clone(), remote));

        let ctx = EngineContext::with_backend(config.engine.clone(), fetcher, registry, backend)?;
        let engine = CredentialEngine::new(ctx).with_observer(Arc::new(StageLogger));

        tracing::info!(
            history_entries = engine.history().len(),
            history_capacity = engine.history().capacity(),
            remote_fetch = config.resolver.remote_fetch,
            "credential engine ready"
        );

        Ok(Self {
            config,
            state: Arc::new(NodeState::new(engine)),
        })
    }

    pub fn state(&self) -> &Arc<NodeState> {
        &self.state
    }

    pub fn config(&self) -> &CachetConfig {
        &self.config
    }

    /// Serve the HTTP API until the listener fails.
    pub async fn run(&self) -> Result<()> {
        let addr = self.config.api_socket_addr()?;
        api::start_api_server(addr, self.state.clone()).await
    }
}
