use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ed25519_dalek::Signer as _;

use crate::error::CryptoError;
use crate::keys::{KeyPair, PublicKey};

/// Ed25519 signature (64 bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    inner: ed25519_dalek::Signature,
}

impl Signature {
    /// Get the raw bytes (64 bytes).
    pub fn to_bytes(&self) -> [u8; 64] {
        self.inner.to_bytes()
    }

    /// Create from raw bytes (64 bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes_arr: [u8; 64] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidInput(format!("signature must be 64 bytes, got {}", bytes.len()))
        })?;
        let inner = ed25519_dalek::Signature::from_bytes(&bytes_arr);
        Ok(Self { inner })
    }

    /// Encode as unpadded base64url, the wire form of `proof.signature`.
    pub fn to_base64url(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.to_bytes())
    }

    /// Decode from unpadded base64url.
    pub fn from_base64url(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| CryptoError::InvalidInput(format!("invalid base64url: {}", e)))?;
        Self::from_bytes(&bytes)
    }
}

/// Something that can produce EdDSA signatures on behalf of an issuer.
///
/// Implemented by [`KeyPair`]; remote or hardware-backed signers implement
/// it to keep private keys out of process.
pub trait Signer: Send + Sync {
    /// Public half of the signing key.
    fn public_key(&self) -> PublicKey;

    /// Sign `message`. Fails with [`CryptoError::SignerUnavailable`] when the
    /// backend cannot sign.
    fn try_sign(&self, message: &[u8]) -> Result<Signature, CryptoError>;
}

impl Signer for KeyPair {
    fn public_key(&self) -> PublicKey {
        KeyPair::public_key(self)
    }

    fn try_sign(&self, message: &[u8]) -> Result<Signature, CryptoError> {
        Ok(sign(message, self))
    }
}

/// Sign a message using Ed25519.
pub fn sign(message: &[u8], keypair: &KeyPair) -> Signature {
    let sig = keypair.signing_key().sign(message);
    Signature { inner: sig }
}

/// Verify an Ed25519 signature.
pub fn verify(
    message: &[u8],
    signature: &Signature,
    pubkey: &PublicKey,
) -> Result<(), CryptoError> {
    pubkey
        .verifying_key()
        .verify_strict(message, &signature.inner)
        .map_err(|_| CryptoError::SignatureVerificationFailed)
}

/// Boolean form of [`verify`].
pub fn is_valid(message: &[u8], signature: &Signature, pubkey: &PublicKey) -> bool {
    verify(message, signature, pubkey).is_ok()
}
