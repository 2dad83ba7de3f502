//! Integration test: identity generation, issuance, verification and
//! history across cachet-identity, cachet-credentials and cachet-crypto.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use cachet_core::{EngineConfig, VerificationFailure, VerificationStage};
use cachet_credentials::{
    CredentialEngine, EngineContext, HistoryFilter, MemoryHistoryBackend,
};
use cachet_identity::InMemoryDocumentRegistry;
use cachet_integration_tests::{engine, engine_with_config, identity, mutated, FIXED_NOW, TEMPLATE_IDS};

// =========================================================================
// Registrar (did:web) issues a degree to a holder (did:key)
// =========================================================================

#[tokio::test]
async fn test_degree_from_registrar_to_key_holder() {
    let engine = engine();
    let holder = identity(&engine, "key", None);
    let registrar = identity(&engine, "web", Some("example.edu:registrar:2024"));
    assert_eq!(registrar.did.as_str(), "did:web:example.edu:registrar:2024");

    let vc = engine
        .issue_as("university-degree", &registrar, holder.did.as_str(), &Value::Null)
        .expect("issuance should succeed");
    assert_eq!(vc.issuance_date, FIXED_NOW);
    assert_eq!(
        vc.proof.verification_method,
        "did:web:example.edu:registrar:2024#key-1"
    );

    let result = engine.verify(&vc.to_json().unwrap()).await;
    assert!(result.verified, "{:?}", result);
    assert_eq!(result.issuer.as_deref(), Some(registrar.did.as_str()));
    assert_eq!(result.subject.as_deref(), Some(holder.did.as_str()));
    assert_eq!(result.algorithm.as_deref(), Some("EdDSA"));
    assert_eq!(result.passed_stages(), VerificationStage::ALL.to_vec());
    assert!(result.failure.is_none());
}

#[tokio::test]
async fn test_raised_gpa_is_rejected() {
    let engine = engine();
    let holder = identity(&engine, "key", None);
    let registrar = identity(&engine, "web", Some("example.edu:registrar:2024"));
    let vc = engine
        .issue_as("university-degree", &registrar, holder.did.as_str(), &Value::Null)
        .unwrap();
    assert_eq!(vc.credential_subject["degree"]["gpa"], "3.8");

    let forged = mutated(&vc, |v| v["credentialSubject"]["degree"]["gpa"] = json!("4.0"));
    let result = engine.verify(&forged).await;
    assert!(!result.verified);
    assert_eq!(result.failure, Some(VerificationFailure::InvalidSignature));
    assert_eq!(
        result.stages.last().map(|o| o.stage),
        Some(VerificationStage::ValidateSignature)
    );
}

#[tokio::test]
async fn test_unpublished_issuer_is_unresolvable() {
    let issuing = engine();
    let registrar = identity(&issuing, "web", Some("example.edu:registrar:2024"));
    let holder = identity(&issuing, "key", None);
    let vc = issuing
        .issue_as("age-verification", &registrar, holder.did.as_str(), &Value::Null)
        .unwrap();

    // A second engine has never seen the registrar's document.
    let verifying = engine();
    let result = verifying.verify(&vc.to_json().unwrap()).await;
    assert!(!result.verified);
    assert_eq!(result.failure, Some(VerificationFailure::IssuerUnresolvable));
    assert_eq!(result.issuer.as_deref(), Some(registrar.did.as_str()));
}

#[tokio::test]
async fn test_slow_document_host_times_out() {
    let config = EngineConfig {
        resolution_timeout_ms: 20,
        ..EngineConfig::default()
    };
    let registry = Arc::new(InMemoryDocumentRegistry::with_latency(Duration::from_millis(500)));
    let ctx = EngineContext::with_backend(
        config,
        registry.clone(),
        registry,
        Arc::new(MemoryHistoryBackend::new()),
    )
    .unwrap();
    let engine = CredentialEngine::new(ctx);

    let issuer = identity(&engine, "web", None);
    let holder = identity(&engine, "key", None);
    let vc = engine
        .issue_as("employment-verification", &issuer, holder.did.as_str(), &Value::Null)
        .unwrap();

    let result = engine.verify(&vc.to_json().unwrap()).await;
    assert_eq!(result.failure, Some(VerificationFailure::IssuerUnresolvable));
    assert!(result.reason.unwrap_or_default().contains("timed out"));
}

// =========================================================================
// Every template with both DID methods
// =========================================================================

#[tokio::test]
async fn test_all_templates_verify_for_both_methods() {
    let engine = engine();
    let subject = identity(&engine, "key", None);

    for method in ["key", "web"] {
        let issuer = identity(&engine, method, None);
        for template in TEMPLATE_IDS {
            let vc = engine
                .issue_as(template, &issuer, subject.did.as_str(), &Value::Null)
                .unwrap_or_else(|e| panic!("{} via {}: {}", template, method, e));
            assert_eq!(vc.subject_id(), Some(subject.did.as_str()));
            assert_eq!(vc.types[0], "VerifiableCredential");

            let result = engine.verify(&vc.to_json().unwrap()).await;
            assert!(result.verified, "{} via {}: {:?}", template, method, result);
            assert_eq!(result.subject.as_deref(), Some(subject.did.as_str()));
        }
    }
    assert_eq!(engine.history().len(), 2 * TEMPLATE_IDS.len());
}

#[tokio::test]
async fn test_extra_claims_cannot_override_subject() {
    let engine = engine();
    let issuer = identity(&engine, "key", None);
    let subject = identity(&engine, "key", None);
    let vc = engine
        .issue_as(
            "employment-verification",
            &issuer,
            subject.did.as_str(),
            &json!({"id": "did:key:zSomeoneElse", "employer": "Acme Corp"}),
        )
        .unwrap();
    assert_eq!(vc.subject_id(), Some(subject.did.as_str()));
    assert_eq!(vc.credential_subject["employer"], "Acme Corp");
    assert!(engine.verify(&vc.to_json().unwrap()).await.verified);
}

// =========================================================================
// History
// =========================================================================

#[tokio::test]
async fn test_history_keeps_ten_most_recent() {
    let engine = engine_with_config(EngineConfig {
        history_capacity: 10,
        ..EngineConfig::default()
    });
    let issuer = identity(&engine, "key", None);
    let subject = identity(&engine, "key", None);

    let ids: Vec<String> = (0..11)
        .map(|_| {
            engine
                .issue_as("age-verification", &issuer, subject.did.as_str(), &Value::Null)
                .unwrap()
                .id
        })
        .collect();

    let listed: Vec<String> = engine
        .history()
        .list(&HistoryFilter::default())
        .into_iter()
        .map(|e| e.credential_id)
        .collect();
    assert_eq!(listed.len(), 10);
    assert!(!listed.contains(&ids[0]));
    let expected: Vec<String> = ids[1..].iter().rev().cloned().collect();
    assert_eq!(listed, expected);
}

#[tokio::test]
async fn test_history_filters() {
    let engine = engine();
    let registrar = identity(&engine, "web", Some("example.edu:registrar:2024"));
    let employer = identity(&engine, "web", Some("acme.example:hr"));
    let alice = identity(&engine, "key", None);
    let bob = identity(&engine, "key", None);

    engine
        .issue_as("university-degree", &registrar, alice.did.as_str(), &Value::Null)
        .unwrap();
    engine
        .issue_as("university-degree", &registrar, bob.did.as_str(), &Value::Null)
        .unwrap();
    engine
        .issue_as("employment-verification", &employer, alice.did.as_str(), &Value::Null)
        .unwrap();

    let by_issuer = engine.history().list(&HistoryFilter {
        issuer: Some(registrar.did.to_string()),
        ..Default::default()
    });
    assert_eq!(by_issuer.len(), 2);

    let by_subject = engine.history().list(&HistoryFilter {
        subject: Some(alice.did.to_string()),
        ..Default::default()
    });
    assert_eq!(by_subject.len(), 2);
    assert_eq!(by_subject[0].types, vec!["EmploymentCredential".to_string()]);

    let by_type = engine.history().list(&HistoryFilter {
        credential_type: Some("UniversityDegreeCredential".into()),
        subject: Some(bob.did.to_string()),
        ..Default::default()
    });
    assert_eq!(by_type.len(), 1);
}

#[tokio::test]
async fn test_forgotten_credential_still_verifies() {
    let engine = engine();
    let issuer = identity(&engine, "web", None);
    let subject = identity(&engine, "key", None);
    let vc = engine
        .issue_as("professional-certification", &issuer, subject.did.as_str(), &Value::Null)
        .unwrap();

    engine.history().remove(&vc.id).unwrap();
    assert!(engine.history().get(&vc.id).is_none());
    assert!(engine.history().remove(&vc.id).is_err());

    assert!(engine.verify(&vc.to_json().unwrap()).await.verified);
}
