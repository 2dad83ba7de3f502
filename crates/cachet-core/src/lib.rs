//! Cachet Core: fundamental types, errors, canonicalization, and constants
//! for the Cachet credential lifecycle engine.

pub mod canonical;
pub mod clock;
pub mod config;
pub mod error;
pub mod types;
pub mod verification_state;

pub use canonical::{canonicalize, CanonicalBytes};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use error::{CoreError, ErrorKind};
pub use types::{Did, DidMethod};
pub use verification_state::{
    StageOutcome, VerificationFailure, VerificationPipeline, VerificationStage,
};

/// First element of every credential `type` list.
pub const VC_TYPE_MARKER: &str = "VerifiableCredential";

/// Base JSON-LD context of every credential.
pub const VC_CONTEXT_V1: &str = "https://www.w3.org/2018/credentials/v1";

/// JSON-LD context of every DID document.
pub const DID_CONTEXT_V1: &str = "https://www.w3.org/ns/did/v1";

/// Signature suite tag carried in `proof.type`.
pub const PROOF_SUITE: &str = "Ed25519Signature2020";

/// Fixed `proof.proofPurpose` value.
pub const PROOF_PURPOSE: &str = "assertionMethod";

/// JOSE algorithm name for Ed25519 signatures.
pub const SIGNATURE_ALG: &str = "EdDSA";

/// Verification method type used in DID documents.
pub const VERIFICATION_KEY_TYPE: &str = "Ed25519VerificationKey2020";
