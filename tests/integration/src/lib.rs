//! Shared fixtures for the cross-crate scenarios under `tests/`.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::Value;

use cachet_core::{EngineConfig, FixedClock};
use cachet_credentials::{CredentialEngine, EngineContext, VerifiableCredential};
use cachet_identity::{GenerateParams, Identity};

/// Every built-in template id.
pub const TEMPLATE_IDS: [&str; 4] = [
    "age-verification",
    "employment-verification",
    "professional-certification",
    "university-degree",
];

/// Issuance timestamp of every fixture engine.
pub const FIXED_NOW: &str = "2024-06-01T09:30:00Z";

/// An in-memory engine with a fixed clock.
pub fn engine_with_config(config: EngineConfig) -> CredentialEngine {
    let clock = FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap());
    let ctx = EngineContext::in_memory(config)
        .expect("valid engine config")
        .with_clock(Arc::new(clock));
    CredentialEngine::new(ctx)
}

pub fn engine() -> CredentialEngine {
    engine_with_config(EngineConfig::default())
}

/// Generate an identity. `location` is a `domain[:segment[:id]]` triple.
pub fn identity(engine: &CredentialEngine, method: &str, location: Option<&str>) -> Identity {
    let params = match location {
        Some(triple) => GenerateParams::from_triple(triple).expect("valid triple"),
        None => GenerateParams::default(),
    };
    engine
        .generate_identity(method, &params)
        .expect("identity generation")
        .into()
}

/// Serialize `credential` after applying `mutate` to its JSON form.
pub fn mutated(credential: &VerifiableCredential, mutate: impl FnOnce(&mut Value)) -> Vec<u8> {
    let mut value = credential.to_value().expect("credential serializes");
    mutate(&mut value);
    serde_json::to_vec(&value).expect("value serializes")
}

