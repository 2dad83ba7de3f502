//! Cachet Identity Layer
//!
//! Provides decentralised identity primitives:
//! - DID generation for the self-certifying `did:key` and the domain-bound
//!   `did:web` methods
//! - DID Documents (W3C-compatible)
//! - DID resolution (pure local for `did:key`, fetched and cached for `did:web`)
//! - An in-process keystore for generated identities

pub mod did_resolver;
pub mod document;
pub mod error;
pub mod keystore;
pub mod method;

pub use did_resolver::{
    DidResolver, DocumentFetcher, DocumentPublisher, HttpsDocumentFetcher,
    InMemoryDocumentRegistry, KeyDidResolver, MethodRouter, WebDidResolver,
};
pub use document::{DidDocument, VerificationMethod};
pub use error::IdentityError;
pub use keystore::{Identity, Keystore};
pub use method::{
    DidMethodProvider, GenerateParams, GeneratedIdentity, KeyMethod, MethodRegistry, WebMethod,
};
