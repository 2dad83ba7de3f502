/// Cryptographic operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("key generation failed: {0}")]
    KeyGenerationFailed(String),

    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("signature verification failed")]
    SignatureVerificationFailed,

    #[error("signer unavailable: {0}")]
    SignerUnavailable(String),

    #[error("unsupported key codec: {0:#x}")]
    UnsupportedCodec(u16),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}
