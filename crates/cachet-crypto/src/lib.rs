//! Cachet Crypto: key material and signing primitives.
//!
//! The private half of a key never leaves this crate except through
//! [`KeyPair::export_secret`]. Signing is deterministic EdDSA (Ed25519) with
//! no per-call randomness, so every function here is safe to call
//! concurrently without locking.

pub mod error;
pub mod keys;
pub mod multikey;
pub mod signing;

pub use error::CryptoError;
pub use keys::{KeyPair, PublicKey};
pub use multikey::{decode_multibase_key, encode_multibase_key};
pub use signing::{is_valid, sign, verify, Signature, Signer};
