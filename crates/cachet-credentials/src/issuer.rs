use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use cachet_core::{Clock, Did, DidMethod, PROOF_PURPOSE, PROOF_SUITE, SIGNATURE_ALG};
use cachet_crypto::{CryptoError, Signer};
use cachet_identity::method::WEB_KEY_FRAGMENT;

use crate::credential::{signing_input, Proof, ProtectedHeader, VerifiableCredential};
use crate::error::CredentialError;
use crate::template::TemplateCatalog;

/// Builds and signs verifiable credentials from catalog templates.
pub struct CredentialIssuer {
    templates: Arc<TemplateCatalog>,
    clock: Arc<dyn Clock>,
}

impl CredentialIssuer {
    pub fn new(templates: Arc<TemplateCatalog>, clock: Arc<dyn Clock>) -> Self {
        Self { templates, clock }
    }

    /// Issue a credential, signing with the issuer's default verification
    /// method: the multikey fragment for `did:key`, `#key-1` for `did:web`.
    pub fn issue(
        &self,
        template_id: &str,
        issuer_did: &str,
        signer: &dyn Signer,
        subject_did: &str,
        extra_claims: &Value,
    ) -> Result<VerifiableCredential, CredentialError> {
        let issuer = parse_issuer(issuer_did)?;
        let fragment = match issuer.method() {
            Ok(DidMethod::Key) => {
                let multibase = signer.public_key().to_multibase();
                if issuer.identifier() != multibase {
                    return Err(CredentialError::IssuerSignerUnavailable(format!(
                        "signer key {} does not control {}",
                        multibase, issuer
                    )));
                }
                multibase
            }
            _ => WEB_KEY_FRAGMENT.to_string(),
        };
        let kid = issuer.with_fragment(&fragment);
        self.issue_with_key_id(template_id, issuer_did, &kid, signer, subject_did, extra_claims)
    }

    /// Issue a credential signed under an explicit verification method id.
    ///
    /// Every fallible step runs before the credential is returned; on error
    /// nothing is produced.
    pub fn issue_with_key_id(
        &self,
        template_id: &str,
        issuer_did: &str,
        key_id: &str,
        signer: &dyn Signer,
        subject_did: &str,
        extra_claims: &Value,
    ) -> Result<VerifiableCredential, CredentialError> {
        let template = self.templates.get(template_id)?;
        let issuer = parse_issuer(issuer_did)?;
        if !Did::is_valid(subject_did) {
            return Err(CredentialError::InvalidSubjectDid(subject_did.to_string()));
        }
        match Did::from_did_url(key_id) {
            Ok(owner) if owner == issuer && key_id.contains('#') => {}
            _ => {
                return Err(CredentialError::InvalidIssuerDid(format!(
                    "verification method {} does not belong to {}",
                    key_id, issuer
                )))
            }
        }

        let credential_subject = template.build_subject(subject_did, extra_claims)?;
        let now = self.clock.timestamp();
        let protected = ProtectedHeader::new(SIGNATURE_ALG, key_id).encode()?;

        let mut credential = VerifiableCredential {
            context: template.full_context(),
            id: format!("urn:uuid:{}", Uuid::now_v7()),
            types: template.full_types(),
            issuer,
            issuance_date: now.clone(),
            credential_subject,
            proof: Proof {
                proof_type: PROOF_SUITE.to_string(),
                created: now,
                proof_purpose: PROOF_PURPOSE.to_string(),
                verification_method: key_id.to_string(),
                signature: String::new(),
                protected,
            },
        };

        let input = signing_input(&credential.to_value()?)?;
        let signature = signer.try_sign(input.as_bytes()).map_err(|e| match e {
            CryptoError::SignerUnavailable(msg) => CredentialError::IssuerSignerUnavailable(msg),
            other => CredentialError::IssuerSignerUnavailable(other.to_string()),
        })?;
        credential.proof.signature = signature.to_base64url();

        tracing::info!(
            issuer = %credential.issuer,
            subject = subject_did,
            template = template_id,
            credential_id = %credential.id,
            "credential issued"
        );

        Ok(credential)
    }

    pub fn templates(&self) -> &Arc<TemplateCatalog> {
        &self.templates
    }
}

fn parse_issuer(issuer_did: &str) -> Result<Did, CredentialError> {
    Did::new(issuer_did).map_err(|e| CredentialError::InvalidIssuerDid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cachet_core::FixedClock;
    use cachet_crypto::{is_valid, KeyPair, PublicKey, Signature};
    use cachet_identity::KeyMethod;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn test_issuer() -> CredentialIssuer {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap());
        CredentialIssuer::new(Arc::new(TemplateCatalog::new()), Arc::new(clock))
    }

    fn key_identity(seed: u8) -> (String, KeyPair) {
        let kp = KeyPair::from_seed(&[seed; 32]);
        let did = KeyMethod::did_for(&kp.public_key()).unwrap();
        (did.to_string(), kp)
    }

    struct OfflineSigner(PublicKey);

    impl Signer for OfflineSigner {
        fn public_key(&self) -> PublicKey {
            self.0.clone()
        }

        fn try_sign(&self, _message: &[u8]) -> Result<Signature, CryptoError> {
            Err(CryptoError::SignerUnavailable("hardware token removed".into()))
        }
    }

    #[test]
    fn test_issue_credential() {
        let issuer = test_issuer();
        let (issuer_did, kp) = key_identity(1);
        let (subject_did, _) = key_identity(2);

        let vc = issuer
            .issue("university-degree", &issuer_did, &kp, &subject_did, &Value::Null)
            .unwrap();

        assert!(vc.id.starts_with("urn:uuid:"));
        assert_eq!(vc.types[0], "VerifiableCredential");
        assert_eq!(vc.types[1], "UniversityDegreeCredential");
        assert_eq!(vc.issuer.as_str(), issuer_did);
        assert_eq!(vc.issuance_date, "2024-06-01T09:30:00Z");
        assert_eq!(vc.subject_id(), Some(subject_did.as_str()));
        assert_eq!(vc.credential_subject["degree"]["gpa"], "3.8");
        assert_eq!(vc.proof.proof_type, "Ed25519Signature2020");
        assert_eq!(vc.proof.proof_purpose, "assertionMethod");
        assert_eq!(
            vc.proof.verification_method,
            format!("{}#{}", issuer_did, kp.public_key().to_multibase())
        );
    }

    #[test]
    fn test_signature_covers_signing_input() {
        let issuer = test_issuer();
        let (issuer_did, kp) = key_identity(3);
        let (subject_did, _) = key_identity(4);
        let vc = issuer
            .issue("age-verification", &issuer_did, &kp, &subject_did, &Value::Null)
            .unwrap();

        let input = vc.signing_input().unwrap();
        let sig = Signature::from_base64url(&vc.proof.signature).unwrap();
        assert!(is_valid(input.as_bytes(), &sig, &kp.public_key()));
    }

    #[test]
    fn test_protected_header_contents() {
        let issuer = test_issuer();
        let (issuer_did, kp) = key_identity(5);
        let (subject_did, _) = key_identity(6);
        let vc = issuer
            .issue("employment-verification", &issuer_did, &kp, &subject_did, &Value::Null)
            .unwrap();

        let header = ProtectedHeader::decode(&vc.proof.protected).unwrap();
        assert_eq!(header.alg, "EdDSA");
        assert_eq!(header.kid, vc.proof.verification_method);
    }

    #[test]
    fn test_web_issuer_uses_key_1() {
        let issuer = test_issuer();
        let kp = KeyPair::from_seed(&[7u8; 32]);
        let (subject_did, _) = key_identity(8);
        let vc = issuer
            .issue(
                "professional-certification",
                "did:web:example.edu:registrar:2024",
                &kp,
                &subject_did,
                &Value::Null,
            )
            .unwrap();
        assert_eq!(
            vc.proof.verification_method,
            "did:web:example.edu:registrar:2024#key-1"
        );
    }

    #[test]
    fn test_extra_claims_merged() {
        let issuer = test_issuer();
        let (issuer_did, kp) = key_identity(9);
        let (subject_did, _) = key_identity(10);
        let vc = issuer
            .issue(
                "university-degree",
                &issuer_did,
                &kp,
                &subject_did,
                &json!({"degree": {"name": "MSc Physics"}, "id": "did:key:zIgnored"}),
            )
            .unwrap();
        assert_eq!(vc.credential_subject["degree"]["name"], "MSc Physics");
        assert_eq!(vc.credential_subject["degree"]["type"], "BachelorDegree");
        assert_eq!(vc.subject_id(), Some(subject_did.as_str()));
    }

    #[test]
    fn test_unknown_template() {
        let issuer = test_issuer();
        let (issuer_did, kp) = key_identity(11);
        let (subject_did, _) = key_identity(12);
        let result = issuer.issue("nonexistent", &issuer_did, &kp, &subject_did, &Value::Null);
        assert!(matches!(result, Err(CredentialError::UnknownTemplate(_))));
    }

    #[test]
    fn test_invalid_subject_did() {
        let issuer = test_issuer();
        let (issuer_did, kp) = key_identity(13);
        let result = issuer.issue("age-verification", &issuer_did, &kp, "alice", &Value::Null);
        assert!(matches!(result, Err(CredentialError::InvalidSubjectDid(_))));
    }

    #[test]
    fn test_invalid_issuer_did() {
        let issuer = test_issuer();
        let kp = KeyPair::from_seed(&[14u8; 32]);
        let (subject_did, _) = key_identity(15);
        let result = issuer.issue("age-verification", "issuer", &kp, &subject_did, &Value::Null);
        assert!(matches!(result, Err(CredentialError::InvalidIssuerDid(_))));
    }

    #[test]
    fn test_key_id_must_belong_to_issuer() {
        let issuer = test_issuer();
        let (issuer_did, kp) = key_identity(16);
        let (subject_did, _) = key_identity(17);
        let result = issuer.issue_with_key_id(
            "age-verification",
            &issuer_did,
            "did:web:example.com:users:x#key-1",
            &kp,
            &subject_did,
            &Value::Null,
        );
        assert!(matches!(result, Err(CredentialError::InvalidIssuerDid(_))));
    }

    #[test]
    fn test_did_key_issuer_with_foreign_signer() {
        let issuer = test_issuer();
        let (issuer_did, _) = key_identity(18);
        let other = KeyPair::from_seed(&[19u8; 32]);
        let (subject_did, _) = key_identity(20);
        let result = issuer.issue("age-verification", &issuer_did, &other, &subject_did, &Value::Null);
        assert!(matches!(
            result,
            Err(CredentialError::IssuerSignerUnavailable(_))
        ));
    }

    #[test]
    fn test_signer_unavailable() {
        let issuer = test_issuer();
        let kp = KeyPair::from_seed(&[21u8; 32]);
        let signer = OfflineSigner(kp.public_key());
        let (subject_did, _) = key_identity(22);
        let result = issuer.issue(
            "age-verification",
            "did:web:example.com:users:offline",
            &signer,
            &subject_did,
            &Value::Null,
        );
        assert!(matches!(
            result,
            Err(CredentialError::IssuerSignerUnavailable(_))
        ));
    }

    #[test]
    fn test_unique_credential_ids() {
        let issuer = test_issuer();
        let (issuer_did, kp) = key_identity(23);
        let (subject_did, _) = key_identity(24);
        let a = issuer
            .issue("age-verification", &issuer_did, &kp, &subject_did, &Value::Null)
            .unwrap();
        let b = issuer
            .issue("age-verification", &issuer_did, &kp, &subject_did, &Value::Null)
            .unwrap();
        assert_ne!(a.id, b.id);
    }
}
