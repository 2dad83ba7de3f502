//! Cachet Credentials: template catalog, issuance, staged verification,
//! and the bounded credential history, wired together by [`CredentialEngine`].

pub mod credential;
pub mod engine;
pub mod error;
pub mod history;
pub mod issuer;
pub mod template;
pub mod verifier;

pub use credential::{signing_input, Proof, ProtectedHeader, VerifiableCredential};
pub use engine::{CredentialEngine, EngineContext};
pub use error::CredentialError;
pub use history::{
    CredentialHistory, HistoryBackend, HistoryEntry, HistoryFilter, MemoryHistoryBackend,
};
pub use issuer::CredentialIssuer;
pub use template::{ClaimDefinition, ClaimType, CredentialTemplate, TemplateCatalog};
pub use verifier::{CredentialVerifier, VerificationObserver, VerificationResult};
