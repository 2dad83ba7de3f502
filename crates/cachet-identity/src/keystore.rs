use std::sync::Arc;

use dashmap::DashMap;

use cachet_core::Did;
use cachet_crypto::KeyPair;

use crate::document::DidDocument;
use crate::error::IdentityError;
use crate::method::GeneratedIdentity;

/// An identity whose private key this process holds.
#[derive(Debug)]
pub struct Identity {
    pub did: Did,
    pub document: DidDocument,
    pub keypair: KeyPair,
}

impl Identity {
    /// Id of the verification method credentials are signed with.
    pub fn signing_method(&self) -> Result<&str, IdentityError> {
        self.document
            .primary_assertion_method()
            .ok_or_else(|| IdentityError::NotFound(format!("assertion method of {}", self.did)))
    }
}

impl From<GeneratedIdentity> for Identity {
    fn from(generated: GeneratedIdentity) -> Self {
        Self {
            did: generated.did,
            document: generated.document,
            keypair: generated.keypair,
        }
    }
}

/// In-memory store of locally held identities, keyed by DID.
#[derive(Debug, Default)]
pub struct Keystore {
    identities: DashMap<Did, Arc<Identity>>,
}

impl Keystore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an identity. A DID can only be stored once.
    pub fn insert(&self, identity: Identity) -> Result<Arc<Identity>, IdentityError> {
        use dashmap::mapref::entry::Entry;

        match self.identities.entry(identity.did.clone()) {
            Entry::Occupied(_) => Err(IdentityError::DuplicateDid(identity.did.to_string())),
            Entry::Vacant(slot) => {
                let identity = Arc::new(identity);
                slot.insert(identity.clone());
                tracing::info!(did = %identity.did, "identity stored");
                Ok(identity)
            }
        }
    }

    pub fn get(&self, did: &Did) -> Option<Arc<Identity>> {
        self.identities.get(did).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, did: &Did) -> Option<Arc<Identity>> {
        self.identities.remove(did).map(|(_, identity)| identity)
    }

    /// All stored DIDs, sorted.
    pub fn list_dids(&self) -> Vec<Did> {
        let mut dids: Vec<Did> = self.identities.iter().map(|e| e.key().clone()).collect();
        dids.sort();
        dids
    }

    pub fn count(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}
