//! Multibase encoding of Ed25519 public keys.
//!
//! A key is prefixed with the `ed25519-pub` multicodec varint (`0xed 0x01`),
//! base58btc-encoded and tagged with the multibase prefix `z`. The result is
//! both the `publicKeyMultibase` of a verification method and the
//! method-specific identifier of a `did:key`.

use crate::error::CryptoError;

/// Multicodec varint for `ed25519-pub`.
pub const ED25519_PUB_CODEC: [u8; 2] = [0xed, 0x01];

/// Multibase prefix for base58btc.
pub const BASE58BTC_PREFIX: char = 'z';

/// Encode raw Ed25519 public key bytes as a multibase multikey.
pub fn encode_multibase_key(key: &[u8; 32]) -> String {
    let mut buf = Vec::with_capacity(ED25519_PUB_CODEC.len() + key.len());
    buf.extend_from_slice(&ED25519_PUB_CODEC);
    buf.extend_from_slice(key);
    format!("{}{}", BASE58BTC_PREFIX, bs58::encode(buf).into_string())
}

/// Decode a multibase multikey back to raw Ed25519 public key bytes.
pub fn decode_multibase_key(encoded: &str) -> Result<[u8; 32], CryptoError> {
    let body = encoded.strip_prefix(BASE58BTC_PREFIX).ok_or_else(|| {
        CryptoError::InvalidInput(format!(
            "unsupported multibase prefix in {:?}, expected 'z'",
            encoded
        ))
    })?;
    let bytes = bs58::decode(body)
        .into_vec()
        .map_err(|e| CryptoError::InvalidInput(format!("invalid base58: {}", e)))?;

    let key = bytes.strip_prefix(&ED25519_PUB_CODEC[..]).ok_or_else(|| {
        let codec = match bytes.as_slice() {
            [a, b, ..] => u16::from_be_bytes([*a, *b]),
            _ => 0,
        };
        CryptoError::UnsupportedCodec(codec)
    })?;

    key.try_into().map_err(|_| CryptoError::InvalidKeyLength {
        expected: 32,
        actual: key.len(),
    })
}
