//! Integration test: any change to a signed credential outside the
//! signature value is detected.

use serde_json::{json, Value};

use cachet_core::VerificationFailure;
use cachet_credentials::{CredentialEngine, VerifiableCredential};
use cachet_integration_tests::{engine, identity, mutated};

/// Fields of an `age-verification` credential that the signature covers.
const BODY_FIELDS: [&str; 11] = [
    "id",
    "issuanceDate",
    "@context",
    "extra type",
    "subject claim",
    "added claim",
    "removed claim",
    "proof.created",
    "proof.type",
    "proof.proofPurpose",
    "top-level field",
];

fn tamper(field: &str, v: &mut Value) {
    match field {
        "id" => v["id"] = json!("urn:uuid:00000000-0000-7000-8000-000000000000"),
        "issuanceDate" => v["issuanceDate"] = json!("2030-01-01T00:00:00Z"),
        "@context" => v["@context"][0] = json!("https://example.org/ctx"),
        "extra type" => {
            if let Some(types) = v["type"].as_array_mut() {
                types.push(json!("GovernmentIdCredential"));
            }
        }
        "subject claim" => v["credentialSubject"]["ageOver"] = json!(21),
        "added claim" => v["credentialSubject"]["admin"] = json!(true),
        "removed claim" => {
            if let Some(subject) = v["credentialSubject"].as_object_mut() {
                subject.remove("verified");
            }
        }
        "proof.created" => v["proof"]["created"] = json!("2030-01-01T00:00:00Z"),
        "proof.type" => v["proof"]["type"] = json!("JsonWebSignature2020"),
        "proof.proofPurpose" => v["proof"]["proofPurpose"] = json!("authentication"),
        "top-level field" => v["expirationDate"] = json!("2099-01-01T00:00:00Z"),
        other => panic!("unknown field {}", other),
    }
}

async fn issued(method: &str) -> (CredentialEngine, VerifiableCredential) {
    let engine = engine();
    let issuer = identity(&engine, method, None);
    let subject = identity(&engine, "key", None);
    let vc = engine
        .issue_as("age-verification", &issuer, subject.did.as_str(), &Value::Null)
        .unwrap();
    (engine, vc)
}

#[tokio::test]
async fn test_body_mutations_break_signature() {
    for method in ["key", "web"] {
        let (engine, vc) = issued(method).await;
        assert!(engine.verify(&vc.to_json().unwrap()).await.verified);

        for field in BODY_FIELDS {
            let result = engine.verify(&mutated(&vc, |v| tamper(field, v))).await;
            assert_eq!(
                result.failure,
                Some(VerificationFailure::InvalidSignature),
                "{} on {} issuer: {:?}",
                field,
                method,
                result
            );
        }
    }
}

#[tokio::test]
async fn test_swapped_issuer_breaks_signature() {
    let (engine, vc) = issued("key").await;
    let other = identity(&engine, "key", None);
    let forged = mutated(&vc, |v| v["issuer"] = json!(other.did.as_str()));
    let result = engine.verify(&forged).await;
    assert_eq!(result.failure, Some(VerificationFailure::InvalidSignature));
}

#[tokio::test]
async fn test_signature_from_other_key_rejected() {
    let (engine, vc) = issued("web").await;
    let (_, other) = issued("web").await;
    let forged = mutated(&vc, |v| v["proof"]["signature"] = json!(other.proof.signature));
    let result = engine.verify(&forged).await;
    assert_eq!(result.failure, Some(VerificationFailure::InvalidSignature));
}

#[tokio::test]
async fn test_kid_mismatch_is_malformed_header() {
    let (engine, vc) = issued("web").await;
    let forged = mutated(&vc, |v| {
        v["proof"]["verificationMethod"] = json!("did:web:example.com:users:other#key-1")
    });
    let result = engine.verify(&forged).await;
    assert_eq!(result.failure, Some(VerificationFailure::MalformedHeader));
}

#[tokio::test]
async fn test_missing_signature_is_missing_proof() {
    let (engine, vc) = issued("key").await;
    let forged = mutated(&vc, |v| {
        v["proof"].as_object_mut().unwrap().remove("signature");
    });
    let result = engine.verify(&forged).await;
    assert_eq!(result.failure, Some(VerificationFailure::MissingProof));
}
