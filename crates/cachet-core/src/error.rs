use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse error taxonomy shared by every Cachet crate.
///
/// Callers switch on the kind to pick a diagnostic or an HTTP status
/// without matching every concrete variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed or missing input fields.
    Input,
    /// Unresolvable DID, timeout, unsupported method.
    Resolution,
    /// Invalid or unsupported signature, key failure.
    Cryptographic,
    /// Subject binding or other policy violation.
    Policy,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "InputError"),
            Self::Resolution => write!(f, "ResolutionError"),
            Self::Cryptographic => write!(f, "CryptographicError"),
            Self::Policy => write!(f, "PolicyError"),
        }
    }
}

/// Core protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid DID format: {0}")]
    InvalidDid(String),

    #[error("unsupported DID method: {0}")]
    UnsupportedMethod(String),

    #[error("canonicalization failed: {0}")]
    Canonicalization(String),

    #[error("invalid stage transition from {from} to {to}")]
    InvalidStageTransition { from: String, to: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CoreError {
    /// Taxonomy bucket for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedMethod(_) => ErrorKind::Resolution,
            Self::InvalidDid(_)
            | Self::Canonicalization(_)
            | Self::InvalidStageTransition { .. }
            | Self::InvalidConfig(_) => ErrorKind::Input,
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Canonicalization(e.to_string())
    }
}
