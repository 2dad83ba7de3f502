//! Integration test: self-certifying resolution and canonical signing are
//! deterministic.

use serde_json::{json, Map, Value};

use cachet_core::canonicalize;
use cachet_credentials::signing_input;
use cachet_crypto::{sign, KeyPair};
use cachet_identity::{DidResolver, KeyDidResolver, KeyMethod};
use cachet_integration_tests::{engine, identity};

#[tokio::test]
async fn test_key_resolution_is_idempotent() {
    let kp = KeyPair::from_seed(&[42u8; 32]);
    let did = KeyMethod::did_for(&kp.public_key()).unwrap();

    let first = KeyDidResolver.resolve(did.as_str()).await.unwrap();
    let second = KeyDidResolver.resolve(did.as_str()).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );

    // A different process deriving from the same key gets the same DID.
    assert_eq!(KeyMethod::did_for(&kp.public_key()).unwrap(), did);
}

#[tokio::test]
async fn test_key_resolution_through_engine_matches_generation() {
    let engine = engine();
    let holder = identity(&engine, "key", None);
    let resolved = engine.resolve(holder.did.as_str()).await.unwrap();
    assert_eq!(resolved, holder.document);
    assert_eq!(
        resolved.assertion_key(holder.signing_method().unwrap()).unwrap(),
        holder.keypair.public_key()
    );
}

fn credential_in_order(reversed: bool) -> Value {
    let mut fields: Vec<(&str, Value)> = vec![
        ("@context", json!(["https://www.w3.org/2018/credentials/v1"])),
        ("id", json!("urn:uuid:0190c8a4-0000-7000-8000-000000000000")),
        ("type", json!(["VerifiableCredential", "AgeVerificationCredential"])),
        ("issuer", json!("did:web:example.com:users:abc")),
        ("issuanceDate", json!("2024-06-01T09:30:00Z")),
        (
            "credentialSubject",
            json!({"id": "did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK", "ageOver": 18, "verified": true}),
        ),
    ];
    if reversed {
        fields.reverse();
    }
    let mut map = Map::new();
    for (k, v) in fields {
        map.insert(k.to_string(), v);
    }
    Value::Object(map)
}

#[test]
fn test_insertion_order_does_not_change_signature() {
    let a = credential_in_order(false);
    let b = credential_in_order(true);

    let bytes_a = signing_input(&a).unwrap();
    let bytes_b = signing_input(&b).unwrap();
    assert_eq!(bytes_a, bytes_b);
    assert_eq!(canonicalize(&a).unwrap(), canonicalize(&b).unwrap());

    let kp = KeyPair::from_seed(&[9u8; 32]);
    let sig_a = sign(bytes_a.as_bytes(), &kp);
    let sig_b = sign(bytes_b.as_bytes(), &kp);
    assert_eq!(sig_a.to_base64url(), sig_b.to_base64url());
}

#[tokio::test]
async fn test_reserialized_credential_still_verifies() {
    let engine = engine();
    let issuer = identity(&engine, "web", None);
    let subject = identity(&engine, "key", None);
    let vc = engine
        .issue_as("university-degree", &issuer, subject.did.as_str(), &Value::Null)
        .unwrap();

    // Pretty-printing changes whitespace and nothing else.
    let pretty = vc.to_json_pretty().unwrap();
    let result = engine.verify(pretty.as_bytes()).await;
    assert!(result.verified, "{:?}", result);
}
