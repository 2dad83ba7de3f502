use std::sync::Arc;

use serde_json::Value;

use cachet_core::{Clock, EngineConfig, SystemClock};
use cachet_crypto::Signer;
use cachet_identity::{
    DidDocument, DidResolver, DocumentFetcher, DocumentPublisher, GenerateParams,
    GeneratedIdentity, Identity, InMemoryDocumentRegistry, MethodRegistry, MethodRouter,
};

use crate::credential::VerifiableCredential;
use crate::error::CredentialError;
use crate::history::{CredentialHistory, HistoryBackend};
use crate::issuer::CredentialIssuer;
use crate::template::TemplateCatalog;
use crate::verifier::{CredentialVerifier, VerificationObserver, VerificationResult};

/// Collaborators of the credential engine, supplied by the caller.
#[derive(Clone)]
pub struct EngineContext {
    pub config: EngineConfig,
    pub clock: Arc<dyn Clock>,
    pub methods: MethodRegistry,
    pub resolver: Arc<dyn DidResolver>,
    pub publisher: Arc<dyn DocumentPublisher>,
    pub templates: Arc<TemplateCatalog>,
    pub history: Arc<CredentialHistory>,
}

impl EngineContext {
    /// A self-contained context: `did:web` documents are published to and
    /// fetched from an in-process registry, history lives in memory.
    pub fn in_memory(config: EngineConfig) -> Result<Self, CredentialError> {
        config.validate()?;
        let registry = Arc::new(InMemoryDocumentRegistry::new());
        let history = Arc::new(CredentialHistory::in_memory(config.history_capacity));
        Ok(Self::with_collaborators(config, registry.clone(), registry, history))
    }

    /// Context over an existing document transport and history backend.
    pub fn with_backend(
        config: EngineConfig,
        fetcher: Arc<dyn DocumentFetcher>,
        publisher: Arc<dyn DocumentPublisher>,
        backend: Arc<dyn HistoryBackend>,
    ) -> Result<Self, CredentialError> {
        config.validate()?;
        let history = Arc::new(CredentialHistory::restore(config.history_capacity, backend)?);
        Ok(Self::with_collaborators(config, fetcher, publisher, history))
    }

    fn with_collaborators(
        config: EngineConfig,
        fetcher: Arc<dyn DocumentFetcher>,
        publisher: Arc<dyn DocumentPublisher>,
        history: Arc<CredentialHistory>,
    ) -> Self {
        Self {
            methods: MethodRegistry::new(&config),
            resolver: Arc::new(MethodRouter::standard(fetcher, &config)),
            clock: Arc::new(SystemClock),
            publisher,
            templates: Arc::new(TemplateCatalog::new()),
            history,
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Identity generation, issuance, resolution and verification over one
/// [`EngineContext`].
pub struct CredentialEngine {
    ctx: EngineContext,
    issuer: CredentialIssuer,
    verifier: CredentialVerifier,
    observer: Option<Arc<dyn VerificationObserver>>,
}

impl CredentialEngine {
    pub fn new(ctx: EngineContext) -> Self {
        let issuer = CredentialIssuer::new(ctx.templates.clone(), ctx.clock.clone());
        let verifier = CredentialVerifier::new(ctx.resolver.clone());
        Self {
            ctx,
            issuer,
            verifier,
            observer: None,
        }
    }

    /// Report verification progress to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn VerificationObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn history(&self) -> &Arc<CredentialHistory> {
        &self.ctx.history
    }

    pub fn templates(&self) -> &Arc<TemplateCatalog> {
        &self.ctx.templates
    }

    /// Generate an identity. Documents of network-resolved methods are
    /// published so they resolve immediately; a DID that is already
    /// published fails with `DuplicateDid`.
    pub fn generate_identity(
        &self,
        method_id: &str,
        params: &GenerateParams,
    ) -> Result<GeneratedIdentity, CredentialError> {
        let generated = self.ctx.methods.generate(method_id, params)?;
        let self_certifying = generated
            .did
            .method()
            .map(|m| m.is_self_certifying())
            .unwrap_or(false);
        if !self_certifying {
            self.ctx.publisher.publish(&generated.document)?;
        }
        Ok(generated)
    }

    /// Issue a credential and record it in history.
    pub fn issue(
        &self,
        template_id: &str,
        issuer_did: &str,
        signer: &dyn Signer,
        subject_did: &str,
        extra_claims: &Value,
    ) -> Result<VerifiableCredential, CredentialError> {
        let credential =
            self.issuer
                .issue(template_id, issuer_did, signer, subject_did, extra_claims)?;
        self.record(credential)
    }

    /// Issue as a locally held identity, signing with its first assertion
    /// method.
    pub fn issue_as(
        &self,
        template_id: &str,
        identity: &Identity,
        subject_did: &str,
        extra_claims: &Value,
    ) -> Result<VerifiableCredential, CredentialError> {
        let key_id = identity.signing_method()?;
        let credential = self.issuer.issue_with_key_id(
            template_id,
            identity.did.as_str(),
            key_id,
            &identity.keypair,
            subject_did,
            extra_claims,
        )?;
        self.record(credential)
    }

    fn record(
        &self,
        credential: VerifiableCredential,
    ) -> Result<VerifiableCredential, CredentialError> {
        self.ctx
            .history
            .append(credential.clone(), self.ctx.clock.timestamp())?;
        Ok(credential)
    }

    /// Verify a serialized credential.
    pub async fn verify(&self, credential: &[u8]) -> VerificationResult {
        self.verifier
            .verify_observed(credential, self.observer.as_deref())
            .await
    }

    pub async fn resolve(&self, did: &str) -> Result<DidDocument, CredentialError> {
        Ok(self.ctx.resolver.resolve(did).await?)
    }
}
