use serde::{Deserialize, Serialize};

use cachet_core::{Did, DID_CONTEXT_V1, VERIFICATION_KEY_TYPE};
use cachet_crypto::PublicKey;

use crate::error::IdentityError;

/// A verification method within a DID Document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// Verification method identifier (e.g., "did:web:example.com#key-1").
    pub id: String,
    /// Type of the verification method (e.g., "Ed25519VerificationKey2020").
    #[serde(rename = "type")]
    pub method_type: String,
    /// The DID that controls this verification method.
    pub controller: String,
    /// Multibase-encoded public key material.
    pub public_key_multibase: String,
}

impl VerificationMethod {
    /// Decode the embedded public key.
    pub fn public_key(&self) -> Result<PublicKey, IdentityError> {
        if self.method_type != VERIFICATION_KEY_TYPE {
            return Err(IdentityError::DocumentMalformed(format!(
                "verification method {} has unsupported type {}",
                self.id, self.method_type
            )));
        }
        PublicKey::from_multibase(&self.public_key_multibase).map_err(|e| {
            IdentityError::DocumentMalformed(format!("verification method {}: {}", self.id, e))
        })
    }
}

/// W3C DID Document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    #[serde(rename = "@context", default = "default_context")]
    pub context: Vec<String>,
    /// The DID subject.
    pub id: Did,
    /// Verification methods (public keys) associated with this DID.
    #[serde(default)]
    pub verification_method: Vec<VerificationMethod>,
    /// Verification method ids usable for authentication.
    #[serde(default)]
    pub authentication: Vec<String>,
    /// Verification method ids usable for signing credentials.
    #[serde(default)]
    pub assertion_method: Vec<String>,
}

fn default_context() -> Vec<String> {
    vec![DID_CONTEXT_V1.to_string()]
}

impl DidDocument {
    /// Create a DID Document with a single Ed25519 verification method
    /// referenced from both `authentication` and `assertionMethod`.
    pub fn new(id: Did, fragment: &str, public_key: &PublicKey) -> Self {
        let vm_id = id.with_fragment(fragment);
        let vm = VerificationMethod {
            id: vm_id.clone(),
            method_type: VERIFICATION_KEY_TYPE.to_string(),
            controller: id.to_string(),
            public_key_multibase: public_key.to_multibase(),
        };
        Self {
            context: default_context(),
            id,
            verification_method: vec![vm],
            authentication: vec![vm_id.clone()],
            assertion_method: vec![vm_id],
        }
    }

    /// Parse a document from JSON bytes and check its internal consistency.
    pub fn from_json(bytes: &[u8]) -> Result<Self, IdentityError> {
        let doc: DidDocument = serde_json::from_slice(bytes)
            .map_err(|e| IdentityError::DocumentMalformed(e.to_string()))?;
        doc.validate()?;
        Ok(doc)
    }

    /// Check that the document is internally consistent: every
    /// verification method is controlled by a DID, carries a decodable key,
    /// and every purpose reference points at a listed method.
    pub fn validate(&self) -> Result<(), IdentityError> {
        if self.verification_method.is_empty() {
            return Err(IdentityError::DocumentMalformed(format!(
                "{} has no verification methods",
                self.id
            )));
        }
        for vm in &self.verification_method {
            if !Did::is_valid(&vm.controller) {
                return Err(IdentityError::DocumentMalformed(format!(
                    "verification method {} has invalid controller {}",
                    vm.id, vm.controller
                )));
            }
            vm.public_key()?;
        }
        for reference in self.authentication.iter().chain(&self.assertion_method) {
            if self.verification_method(reference).is_none() {
                return Err(IdentityError::DocumentMalformed(format!(
                    "dangling verification method reference {}",
                    reference
                )));
            }
        }
        Ok(())
    }

    /// Look up a verification method by absolute (`did#frag`) or relative
    /// (`#frag`) id.
    pub fn verification_method(&self, id: &str) -> Option<&VerificationMethod> {
        let absolute = self.absolute_id(id);
        self.verification_method
            .iter()
            .find(|vm| self.absolute_id(&vm.id) == absolute)
    }

    /// Whether `id` is listed under `assertionMethod`.
    pub fn is_assertion_method(&self, id: &str) -> bool {
        let absolute = self.absolute_id(id);
        self.assertion_method
            .iter()
            .any(|r| self.absolute_id(r) == absolute)
    }

    /// Public key of the assertion method `kid`.
    pub fn assertion_key(&self, kid: &str) -> Result<PublicKey, IdentityError> {
        if !self.is_assertion_method(kid) {
            return Err(IdentityError::NotFound(format!(
                "{} is not an assertion method of {}",
                kid, self.id
            )));
        }
        let vm = self.verification_method(kid).ok_or_else(|| {
            IdentityError::NotFound(format!("verification method {} in {}", kid, self.id))
        })?;
        if vm.controller != self.id.as_str() {
            return Err(IdentityError::DocumentMalformed(format!(
                "verification method {} is controlled by {}, not {}",
                vm.id, vm.controller, self.id
            )));
        }
        vm.public_key()
    }

    /// Id of the first assertion method, the default signing key.
    pub fn primary_assertion_method(&self) -> Option<&str> {
        self.assertion_method.first().map(String::as_str)
    }

    fn absolute_id(&self, id: &str) -> String {
        if id.starts_with('#') {
            format!("{}{}", self.id, id)
        } else {
            id.to_string()
        }
    }
}
