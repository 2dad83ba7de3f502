use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use cachet_core::{canonicalize, CanonicalBytes, CoreError, Did, VC_TYPE_MARKER};

use crate::error::CredentialError;

/// A W3C Verifiable Credential with an embedded Ed25519 proof.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    /// `urn:uuid:<v7>`.
    pub id: String,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    pub issuer: Did,
    /// ISO-8601 UTC, second precision.
    pub issuance_date: String,
    /// Subject DID under `id` plus the template claims.
    pub credential_subject: Map<String, Value>,
    pub proof: Proof,
}

/// Proof block of a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(rename = "type")]
    pub proof_type: String,
    pub created: String,
    pub proof_purpose: String,
    /// Issuer DID plus key fragment.
    pub verification_method: String,
    /// Unpadded base64url Ed25519 signature over the signing input.
    pub signature: String,
    /// Unpadded base64url JSON of the [`ProtectedHeader`].
    pub protected: String,
}

/// Header carried in `proof.protected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedHeader {
    pub alg: String,
    pub kid: String,
}

impl ProtectedHeader {
    pub fn new(alg: impl Into<String>, kid: impl Into<String>) -> Self {
        Self {
            alg: alg.into(),
            kid: kid.into(),
        }
    }

    /// Canonical JSON, base64url-encoded.
    pub fn encode(&self) -> Result<String, CoreError> {
        let bytes = CanonicalBytes::new(self)?;
        Ok(URL_SAFE_NO_PAD.encode(bytes.as_bytes()))
    }

    pub fn decode(encoded: &str) -> Result<Self, String> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| format!("protected header is not base64url: {}", e))?;
        serde_json::from_slice(&bytes).map_err(|e| format!("protected header is not valid: {}", e))
    }
}

/// The bytes a credential signature covers: the canonical form of the whole
/// credential with `proof.signature` removed.
///
/// Issuance and verification both go through this function, so any added,
/// removed, or changed field outside the signature value changes the input.
pub fn signing_input(credential: &Value) -> Result<CanonicalBytes, CoreError> {
    let mut unsigned = credential.clone();
    if let Some(proof) = unsigned.get_mut("proof").and_then(Value::as_object_mut) {
        proof.remove("signature");
    }
    canonicalize(&unsigned)
}

impl VerifiableCredential {
    /// Credential types other than `VerifiableCredential`.
    pub fn credential_types(&self) -> impl Iterator<Item = &str> {
        self.types
            .iter()
            .map(String::as_str)
            .filter(|t| *t != VC_TYPE_MARKER)
    }

    /// `credentialSubject.id`.
    pub fn subject_id(&self) -> Option<&str> {
        self.credential_subject.get("id").and_then(Value::as_str)
    }

    pub fn to_value(&self) -> Result<Value, CredentialError> {
        serde_json::to_value(self).map_err(|e| CredentialError::Serialization(e.to_string()))
    }

    /// Wire bytes.
    pub fn to_json(&self) -> Result<Vec<u8>, CredentialError> {
        serde_json::to_vec(self).map_err(|e| CredentialError::Serialization(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, CredentialError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CredentialError::Serialization(e.to_string()))
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, CredentialError> {
        serde_json::from_slice(bytes).map_err(|e| CredentialError::Serialization(e.to_string()))
    }

    /// Recompute the signing input of this credential.
    pub fn signing_input(&self) -> Result<CanonicalBytes, CredentialError> {
        Ok(signing_input(&self.to_value()?)?)
    }
}
