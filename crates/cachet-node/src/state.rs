//! Shared node state for the HTTP handlers.

use std::time::Instant;

use cachet_credentials::CredentialEngine;
use cachet_identity::Keystore;

/// Shared state for the running node, accessible from HTTP handlers.
pub struct NodeState {
    /// Credential engine over the node's history and resolver.
    pub engine: CredentialEngine,
    /// Identities whose keys this node holds.
    pub keystore: Keystore,
    /// When the node started.
    pub start_time: Instant,
}

impl NodeState {
    pub fn new(engine: CredentialEngine) -> Self {
        Self {
            engine,
            keystore: Keystore::new(),
            start_time: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
