use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use cachet_core::{Did, DidMethod, EngineConfig};

use crate::document::DidDocument;
use crate::error::IdentityError;
use crate::method::{KeyMethod, WebMethod};

/// Trait for resolving DIDs to their documents.
#[async_trait]
pub trait DidResolver: Send + Sync {
    /// Resolve a DID URI to its DID Document.
    async fn resolve(&self, did: &str) -> Result<DidDocument, IdentityError>;
}

/// Transport used to dereference domain-bound DIDs.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetch the raw document bytes published for `did`.
    async fn fetch(&self, did: &Did) -> Result<Vec<u8>, IdentityError>;
}

/// Makes a generated document resolvable by others.
pub trait DocumentPublisher: Send + Sync {
    /// Publish `document`. A DID that is already published is rejected
    /// with [`IdentityError::DuplicateDid`] and its document left untouched.
    fn publish(&self, document: &DidDocument) -> Result<(), IdentityError>;
}

/// Resolves `did:key` identifiers by recomputing the document.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyDidResolver;

#[async_trait]
impl DidResolver for KeyDidResolver {
    async fn resolve(&self, did: &str) -> Result<DidDocument, IdentityError> {
        let did = Did::new(did)?;
        KeyMethod::document_for(&did)
    }
}

/// In-process document table standing in for the network.
///
/// Serves as both the [`DocumentFetcher`] of a [`WebDidResolver`] and the
/// [`DocumentPublisher`] generated identities are published through.
#[derive(Debug, Default)]
pub struct InMemoryDocumentRegistry {
    documents: DashMap<Did, Vec<u8>>,
    latency: Option<Duration>,
}

impl InMemoryDocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every fetch by `latency`.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            documents: DashMap::new(),
            latency: Some(latency),
        }
    }

    /// Store raw bytes under a DID, bypassing document validation.
    pub fn insert_raw(&self, did: Did, bytes: Vec<u8>) {
        self.documents.insert(did, bytes);
    }

    pub fn unpublish(&self, did: &Did) -> bool {
        self.documents.remove(did).is_some()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentPublisher for InMemoryDocumentRegistry {
    fn publish(&self, document: &DidDocument) -> Result<(), IdentityError> {
        use dashmap::mapref::entry::Entry;

        let bytes = serde_json::to_vec(document)
            .map_err(|e| IdentityError::DocumentMalformed(e.to_string()))?;
        match self.documents.entry(document.id.clone()) {
            Entry::Occupied(_) => Err(IdentityError::DuplicateDid(document.id.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(bytes);
                tracing::debug!(did = %document.id, "document published");
                Ok(())
            }
        }
    }
}

#[async_trait]
impl DocumentFetcher for InMemoryDocumentRegistry {
    async fn fetch(&self, did: &Did) -> Result<Vec<u8>, IdentityError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.documents
            .get(did)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| IdentityError::NotFound(did.to_string()))
    }
}

/// Fetches `did:web` documents over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpsDocumentFetcher {
    client: reqwest::Client,
}

impl HttpsDocumentFetcher {
    pub fn new() -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .https_only(true)
            .user_agent(concat!("cachet/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| IdentityError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentFetcher for HttpsDocumentFetcher {
    async fn fetch(&self, did: &Did) -> Result<Vec<u8>, IdentityError> {
        let url = WebMethod::document_url(did)?;
        tracing::debug!(did = %did, url = %url, "fetching DID document");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(IdentityError::NotFound(did.to_string()));
        }
        let response = response
            .error_for_status()
            .map_err(|e| IdentityError::Transport(e.to_string()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

struct CachedDocument {
    document: DidDocument,
    fetched_at: Instant,
}

/// Resolves `did:web` identifiers through a [`DocumentFetcher`], with a
/// bounded wait and a TTL cache of fetched snapshots.
pub struct WebDidResolver {
    fetcher: Arc<dyn DocumentFetcher>,
    cache: DashMap<Did, CachedDocument>,
    timeout: Duration,
    ttl: Duration,
}

impl WebDidResolver {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>, timeout: Duration, ttl: Duration) -> Self {
        Self {
            fetcher,
            cache: DashMap::new(),
            timeout,
            ttl,
        }
    }

    pub fn from_config(fetcher: Arc<dyn DocumentFetcher>, config: &EngineConfig) -> Self {
        Self::new(fetcher, config.resolution_timeout(), config.resolver_cache_ttl())
    }

    /// Drop every cached snapshot.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    fn cached(&self, did: &Did) -> Option<DidDocument> {
        {
            let entry = self.cache.get(did)?;
            if entry.fetched_at.elapsed() < self.ttl {
                return Some(entry.document.clone());
            }
        }
        // Read guard must be released before removing.
        self.cache
            .remove_if(did, |_, cached| cached.fetched_at.elapsed() >= self.ttl);
        None
    }
}

#[async_trait]
impl DidResolver for WebDidResolver {
    async fn resolve(&self, did: &str) -> Result<DidDocument, IdentityError> {
        let did = Did::new(did)?;
        if did.method_name() != DidMethod::Web.as_str() {
            return Err(IdentityError::MethodUnsupported(did.method_name().to_string()));
        }

        if let Some(document) = self.cached(&did) {
            tracing::debug!(did = %did, "DID document served from cache");
            return Ok(document);
        }

        let bytes = tokio::time::timeout(self.timeout, self.fetcher.fetch(&did))
            .await
            .map_err(|_| IdentityError::ResolutionTimeout {
                did: did.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            })??;

        let document = DidDocument::from_json(&bytes)?;
        if document.id != did {
            return Err(IdentityError::DocumentMalformed(format!(
                "document id {} does not match requested {}",
                document.id, did
            )));
        }

        self.cache.insert(
            did.clone(),
            CachedDocument {
                document: document.clone(),
                fetched_at: Instant::now(),
            },
        );
        tracing::debug!(did = %did, "DID document fetched");
        Ok(document)
    }
}

/// Dispatches resolution to the resolver registered for the DID's method.
#[derive(Clone, Default)]
pub struct MethodRouter {
    resolvers: HashMap<DidMethod, Arc<dyn DidResolver>>,
}

impl MethodRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Router with `did:key` and a `did:web` resolver over `fetcher`.
    pub fn standard(fetcher: Arc<dyn DocumentFetcher>, config: &EngineConfig) -> Self {
        let mut router = Self::new();
        router.register(DidMethod::Key, Arc::new(KeyDidResolver));
        router.register(
            DidMethod::Web,
            Arc::new(WebDidResolver::from_config(fetcher, config)),
        );
        router
    }

    pub fn register(&mut self, method: DidMethod, resolver: Arc<dyn DidResolver>) {
        self.resolvers.insert(method, resolver);
    }

    pub fn resolver_count(&self) -> usize {
        self.resolvers.len()
    }
}

#[async_trait]
impl DidResolver for MethodRouter {
    async fn resolve(&self, did: &str) -> Result<DidDocument, IdentityError> {
        let parsed = Did::new(did)?;
        let method = parsed.method()?;
        let resolver = self
            .resolvers
            .get(&method)
            .ok_or_else(|| IdentityError::MethodUnsupported(method.to_string()))?;
        resolver.resolve(did).await
    }
}
