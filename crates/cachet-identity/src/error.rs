use cachet_core::{CoreError, ErrorKind};

/// Identity-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("unsupported DID method for generation: {0}")]
    UnsupportedMethod(String),

    #[error("invalid domain format: {0}")]
    InvalidDomainFormat(String),

    #[error("invalid DID format: {0}")]
    InvalidDid(String),

    #[error("DID not found: {0}")]
    NotFound(String),

    #[error("DID document malformed: {0}")]
    DocumentMalformed(String),

    #[error("DID method not resolvable: {0}")]
    MethodUnsupported(String),

    #[error("resolution of {did} timed out after {timeout_ms} ms")]
    ResolutionTimeout { did: String, timeout_ms: u64 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("duplicate DID: {0}")]
    DuplicateDid(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] cachet_crypto::CryptoError),
}

impl IdentityError {
    /// Taxonomy bucket for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedMethod(_)
            | Self::InvalidDomainFormat(_)
            | Self::InvalidDid(_)
            | Self::DuplicateDid(_) => ErrorKind::Input,
            Self::NotFound(_)
            | Self::DocumentMalformed(_)
            | Self::MethodUnsupported(_)
            | Self::ResolutionTimeout { .. }
            | Self::Transport(_) => ErrorKind::Resolution,
            Self::Crypto(_) => ErrorKind::Cryptographic,
        }
    }
}

impl From<CoreError> for IdentityError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::UnsupportedMethod(m) => Self::MethodUnsupported(m),
            other => Self::InvalidDid(other.to_string()),
        }
    }
}
