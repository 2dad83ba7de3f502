use cachet_core::{CoreError, ErrorKind};
use cachet_identity::IdentityError;

/// Credential engine errors.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("unknown credential template: {0}")]
    UnknownTemplate(String),

    #[error("invalid subject DID: {0}")]
    InvalidSubjectDid(String),

    #[error("invalid issuer DID: {0}")]
    InvalidIssuerDid(String),

    #[error("issuer signer unavailable: {0}")]
    IssuerSignerUnavailable(String),

    #[error("invalid claims: {0}")]
    InvalidClaims(String),

    #[error("canonicalization failed: {0}")]
    Canonicalization(String),

    #[error("credential not found: {0}")]
    CredentialNotFound(String),

    #[error("history storage error: {0}")]
    Storage(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),
}

impl CredentialError {
    /// Taxonomy bucket for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownTemplate(_)
            | Self::InvalidIssuerDid(_)
            | Self::InvalidClaims(_)
            | Self::CredentialNotFound(_)
            | Self::Canonicalization(_)
            | Self::InvalidConfig(_)
            | Self::Serialization(_) => ErrorKind::Input,
            Self::InvalidSubjectDid(_) => ErrorKind::Policy,
            Self::IssuerSignerUnavailable(_) => ErrorKind::Cryptographic,
            Self::Storage(_) => ErrorKind::Resolution,
            Self::Identity(e) => e.kind(),
        }
    }
}

impl From<CoreError> for CredentialError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Canonicalization(msg) => Self::Canonicalization(msg),
            CoreError::InvalidConfig(msg) => Self::InvalidConfig(msg),
            other => Self::Serialization(other.to_string()),
        }
    }
}
