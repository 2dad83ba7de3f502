use std::collections::HashMap;
use std::sync::Arc;

use cachet_core::{Did, DidMethod, EngineConfig};
use cachet_crypto::{KeyPair, PublicKey};

use crate::document::DidDocument;
use crate::error::IdentityError;

/// Verification method fragment used by `did:web` documents.
pub const WEB_KEY_FRAGMENT: &str = "key-1";

/// Caller-supplied hints for identity generation. Ignored by methods that
/// derive everything from the key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateParams {
    pub domain: Option<String>,
    pub path: Option<String>,
    pub id: Option<String>,
}

impl GenerateParams {
    /// Parse a `domain[:segment[:id]]` triple such as
    /// `example.edu:registrar:2024`.
    pub fn from_triple(triple: &str) -> Result<Self, IdentityError> {
        let parts: Vec<&str> = triple.split(':').collect();
        if parts.is_empty() || parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(IdentityError::InvalidDomainFormat(format!(
                "expected domain[:segment[:id]], got {:?}",
                triple
            )));
        }
        Ok(Self {
            domain: Some(parts[0].to_string()),
            path: parts.get(1).map(|s| s.to_string()),
            id: parts.get(2).map(|s| s.to_string()),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.domain.is_none() && self.path.is_none() && self.id.is_none()
    }
}

/// Output of a method provider: the new DID, its document, and the key pair
/// whose public half the document carries.
#[derive(Debug)]
pub struct GeneratedIdentity {
    pub did: Did,
    pub document: DidDocument,
    pub keypair: KeyPair,
}

/// A DID method that can mint identities.
pub trait DidMethodProvider: Send + Sync {
    /// The method this provider implements.
    fn method(&self) -> DidMethod;

    /// Build the DID and document for an existing key pair.
    fn derive(
        &self,
        params: &GenerateParams,
        keypair: &KeyPair,
    ) -> Result<(Did, DidDocument), IdentityError>;

    /// Generate a fresh key pair and derive an identity from it.
    fn generate(&self, params: &GenerateParams) -> Result<GeneratedIdentity, IdentityError> {
        let keypair = KeyPair::generate()?;
        let (did, document) = self.derive(params, &keypair)?;
        tracing::info!(did = %did, method = %self.method(), "identity generated");
        Ok(GeneratedIdentity {
            did,
            document,
            keypair,
        })
    }
}

/// The self-certifying `did:key` method.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyMethod;

impl KeyMethod {
    /// `did:key:z6Mk…` for a public key.
    pub fn did_for(public_key: &PublicKey) -> Result<Did, IdentityError> {
        Ok(Did::from_parts(DidMethod::Key, &public_key.to_multibase())?)
    }

    /// Recompute the document from the identifier alone.
    pub fn document_for(did: &Did) -> Result<DidDocument, IdentityError> {
        if did.method_name() != DidMethod::Key.as_str() {
            return Err(IdentityError::InvalidDid(format!("{} is not a did:key", did)));
        }
        let multibase = did.identifier();
        let public_key = PublicKey::from_multibase(multibase).map_err(|e| {
            IdentityError::DocumentMalformed(format!("{} does not encode a key: {}", did, e))
        })?;
        Ok(DidDocument::new(did.clone(), multibase, &public_key))
    }
}

impl DidMethodProvider for KeyMethod {
    fn method(&self) -> DidMethod {
        DidMethod::Key
    }

    fn derive(
        &self,
        _params: &GenerateParams,
        keypair: &KeyPair,
    ) -> Result<(Did, DidDocument), IdentityError> {
        let did = Self::did_for(&keypair.public_key())?;
        let document = Self::document_for(&did)?;
        Ok((did, document))
    }
}

/// The domain-bound `did:web` method.
#[derive(Debug, Clone)]
pub struct WebMethod {
    default_domain: String,
    default_segment: String,
}

impl WebMethod {
    pub fn new(default_domain: impl Into<String>, default_segment: impl Into<String>) -> Self {
        Self {
            default_domain: default_domain.into(),
            default_segment: default_segment.into(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(&config.default_web_domain, &config.default_web_segment)
    }

    /// The HTTPS location a `did:web` document is served from.
    ///
    /// `did:web:example.com` maps to `https://example.com/.well-known/did.json`;
    /// `did:web:example.com:users:alice` to
    /// `https://example.com/users/alice/did.json`.
    pub fn document_url(did: &Did) -> Result<String, IdentityError> {
        if did.method_name() != DidMethod::Web.as_str() {
            return Err(IdentityError::InvalidDid(format!("{} is not a did:web", did)));
        }
        let mut parts = did.identifier().split(':');
        let domain = parts
            .next()
            .filter(|d| !d.is_empty())
            .ok_or_else(|| IdentityError::InvalidDid(did.to_string()))?;
        validate_domain(domain)?;
        let host = domain.replace("%3A", ":").replace("%3a", ":");

        let segments: Vec<&str> = parts.collect();
        if segments.is_empty() {
            Ok(format!("https://{}/.well-known/did.json", host))
        } else {
            Ok(format!("https://{}/{}/did.json", host, segments.join("/")))
        }
    }
}

impl Default for WebMethod {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl DidMethodProvider for WebMethod {
    fn method(&self) -> DidMethod {
        DidMethod::Web
    }

    fn derive(
        &self,
        params: &GenerateParams,
        keypair: &KeyPair,
    ) -> Result<(Did, DidDocument), IdentityError> {
        let public_key = keypair.public_key();
        let domain = params.domain.as_deref().unwrap_or(&self.default_domain);
        let segment = params.path.as_deref().unwrap_or(&self.default_segment);
        let id = match params.id.as_deref() {
            Some(id) => id.to_string(),
            None => public_key.to_hex()[..16].to_string(),
        };

        validate_domain(domain)?;
        validate_path_part(segment)?;
        validate_path_part(&id)?;

        let did = Did::from_parts(DidMethod::Web, &format!("{}:{}:{}", domain, segment, id))?;
        let document = DidDocument::new(did.clone(), WEB_KEY_FRAGMENT, &public_key);
        Ok((did, document))
    }
}

/// Lowercase DNS labels, at least one dot (or `localhost`), optional
/// `%3A`-encoded port.
fn validate_domain(domain: &str) -> Result<(), IdentityError> {
    let invalid = || IdentityError::InvalidDomainFormat(domain.to_string());

    let lowered = domain.replace("%3a", "%3A");
    let (host, port) = match lowered.split_once("%3A") {
        Some((host, port)) => (host, Some(port)),
        None => (lowered.as_str(), None),
    };
    if let Some(port) = port {
        if port.is_empty() || port.len() > 5 || !port.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
    }
    if host != "localhost" && !host.contains('.') {
        return Err(invalid());
    }
    let label_ok = |label: &str| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    };
    if !host.split('.').all(label_ok) {
        return Err(invalid());
    }
    Ok(())
}

fn validate_path_part(part: &str) -> Result<(), IdentityError> {
    if part.is_empty()
        || !part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(IdentityError::InvalidDomainFormat(format!(
            "invalid path component {:?}",
            part
        )));
    }
    Ok(())
}

/// Method providers keyed by method id (`key`, `web`).
#[derive(Clone)]
pub struct MethodRegistry {
    providers: HashMap<DidMethod, Arc<dyn DidMethodProvider>>,
}

impl MethodRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Registry with both built-in methods.
    pub fn new(config: &EngineConfig) -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(KeyMethod));
        registry.register(Arc::new(WebMethod::from_config(config)));
        registry
    }

    pub fn register(&mut self, provider: Arc<dyn DidMethodProvider>) {
        self.providers.insert(provider.method(), provider);
    }

    /// Provider for a method id string.
    pub fn provider(&self, method_id: &str) -> Result<&Arc<dyn DidMethodProvider>, IdentityError> {
        let method: DidMethod = method_id
            .parse()
            .map_err(|_| IdentityError::UnsupportedMethod(method_id.to_string()))?;
        self.providers
            .get(&method)
            .ok_or_else(|| IdentityError::UnsupportedMethod(method_id.to_string()))
    }

    /// Generate an identity with the named method.
    pub fn generate(
        &self,
        method_id: &str,
        params: &GenerateParams,
    ) -> Result<GeneratedIdentity, IdentityError> {
        self.provider(method_id)?.generate(params)
    }

    /// Registered methods, sorted by name.
    pub fn methods(&self) -> Vec<DidMethod> {
        let mut methods: Vec<DidMethod> = self.providers.keys().copied().collect();
        methods.sort_by_key(|m| m.as_str());
        methods
    }
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}
