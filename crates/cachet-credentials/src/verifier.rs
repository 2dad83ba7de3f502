use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use cachet_core::{
    Did, StageOutcome, VerificationFailure, VerificationPipeline, VerificationStage,
    SIGNATURE_ALG, VC_TYPE_MARKER,
};
use cachet_crypto::{verify, Signature};
use cachet_identity::{DidDocument, DidResolver};

use crate::credential::{signing_input, ProtectedHeader};

/// Receives each stage outcome as verification progresses.
pub trait VerificationObserver: Send + Sync {
    fn on_stage(&self, outcome: &StageOutcome);
}

/// Structured result of one verification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub verified: bool,
    /// Stage outcomes in execution order, ending at the first failure.
    pub stages: Vec<StageOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<VerificationFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl VerificationResult {
    /// Stages that passed, in order.
    pub fn passed_stages(&self) -> Vec<VerificationStage> {
        self.stages
            .iter()
            .filter(|o| o.passed)
            .map(|o| o.stage)
            .collect()
    }
}

/// Fields collected while walking the stages.
#[derive(Default)]
struct Findings {
    credential_id: Option<String>,
    issuer: Option<String>,
    subject: Option<String>,
    algorithm: Option<String>,
    verification_method: Option<String>,
}

/// Runs credentials through the staged verification pipeline.
///
/// Verification never errors: every outcome, including malformed input and
/// resolution failure, is reported in the returned [`VerificationResult`].
pub struct CredentialVerifier {
    resolver: Arc<dyn DidResolver>,
}

struct Run<'a> {
    pipeline: VerificationPipeline,
    reported: usize,
    observer: Option<&'a dyn VerificationObserver>,
}

impl Run<'_> {
    fn pass(&mut self) {
        self.pipeline.pass();
        self.report();
    }

    fn fail(&mut self, reason: String) {
        self.pipeline.fail(reason);
        self.report();
    }

    fn report(&mut self) {
        let outcomes = self.pipeline.outcomes();
        if let Some(observer) = self.observer {
            for outcome in &outcomes[self.reported..] {
                observer.on_stage(outcome);
            }
        }
        self.reported = outcomes.len();
    }
}

impl CredentialVerifier {
    pub fn new(resolver: Arc<dyn DidResolver>) -> Self {
        Self { resolver }
    }

    /// Verify a serialized credential.
    pub async fn verify(&self, credential: &[u8]) -> VerificationResult {
        self.verify_observed(credential, None).await
    }

    /// Verify a serialized credential, reporting each stage to `observer`.
    pub async fn verify_observed(
        &self,
        credential: &[u8],
        observer: Option<&dyn VerificationObserver>,
    ) -> VerificationResult {
        let mut run = Run {
            pipeline: VerificationPipeline::new(),
            reported: 0,
            observer,
        };
        let mut findings = Findings::default();
        let outcome = self.run_stages(credential, &mut run, &mut findings).await;
        if let Err(reason) = outcome {
            run.fail(reason);
        }

        let failure = run.pipeline.failure();
        let stages = run.pipeline.into_outcomes();
        let reason = stages.iter().find(|o| !o.passed).and_then(|o| o.detail.clone());
        let verified = failure.is_none()
            && stages
                .last()
                .is_some_and(|o| o.stage == VerificationStage::Verified);

        if verified {
            tracing::info!(
                issuer = findings.issuer.as_deref().unwrap_or_default(),
                credential_id = findings.credential_id.as_deref().unwrap_or_default(),
                "credential verified"
            );
        } else {
            tracing::warn!(
                failure = ?failure,
                reason = reason.as_deref().unwrap_or_default(),
                "credential rejected"
            );
        }

        VerificationResult {
            verified,
            stages,
            credential_id: findings.credential_id,
            issuer: findings.issuer,
            subject: findings.subject,
            algorithm: findings.algorithm,
            verification_method: findings.verification_method,
            failure,
            reason,
        }
    }

    /// Walk the stages in order. An `Err` rejects at the pipeline's current
    /// stage.
    async fn run_stages(
        &self,
        bytes: &[u8],
        run: &mut Run<'_>,
        findings: &mut Findings,
    ) -> Result<(), String> {
        // ParseCredential
        let credential: Value =
            serde_json::from_slice(bytes).map_err(|e| format!("not valid JSON: {}", e))?;
        let issuer = parse_credential(&credential)?;
        findings.credential_id = credential.get("id").and_then(Value::as_str).map(String::from);
        findings.issuer = Some(issuer.to_string());
        run.pass();

        // ExtractProof
        let proof = &credential["proof"];
        let verification_method = required_str(proof, "verificationMethod")?;
        let signature = required_str(proof, "signature")?;
        findings.verification_method = Some(verification_method.to_string());
        run.pass();

        // DecodeHeader
        let protected = proof
            .get("protected")
            .and_then(Value::as_str)
            .ok_or_else(|| "proof.protected missing".to_string())?;
        let header = ProtectedHeader::decode(protected)?;
        if header.kid != verification_method {
            return Err(format!(
                "header kid {} does not match proof.verificationMethod {}",
                header.kid, verification_method
            ));
        }
        findings.algorithm = Some(header.alg.clone());
        run.pass();

        // ResolveIssuer
        let method_did = Did::from_did_url(verification_method)
            .map_err(|e| format!("verification method is not a DID URL: {}", e))?;
        let document = self
            .resolver
            .resolve(method_did.as_str())
            .await
            .map_err(|e| format!("cannot resolve {}: {}", method_did, e))?;
        run.pass();

        // ValidateSignature
        check_signature(&credential, &issuer, &method_did, &document, &header, signature)?;
        run.pass();

        // ValidateSubject
        let subject = credential["credentialSubject"]
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| "credentialSubject.id missing".to_string())?;
        if !Did::is_valid(subject) {
            return Err(format!("credentialSubject.id {} is not a DID", subject));
        }
        findings.subject = Some(subject.to_string());
        run.pass();

        Ok(())
    }
}

fn parse_credential(credential: &Value) -> Result<Did, String> {
    if !credential.is_object() {
        return Err("credential must be a JSON object".into());
    }
    let is_vc = credential
        .get("type")
        .and_then(Value::as_array)
        .is_some_and(|types| types.iter().any(|t| t == VC_TYPE_MARKER));
    if !is_vc {
        return Err(format!("type must include {}", VC_TYPE_MARKER));
    }
    let issuer = credential
        .get("issuer")
        .and_then(Value::as_str)
        .ok_or_else(|| "issuer missing".to_string())?;
    let issuer = Did::new(issuer).map_err(|e| format!("issuer: {}", e))?;
    if !credential
        .get("credentialSubject")
        .is_some_and(Value::is_object)
    {
        return Err("credentialSubject missing".into());
    }
    if !credential.get("proof").is_some_and(Value::is_object) {
        return Err("proof missing".into());
    }
    Ok(issuer)
}

fn required_str<'a>(proof: &'a Value, field: &str) -> Result<&'a str, String> {
    proof
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("proof.{} missing", field))
}

fn check_signature(
    credential: &Value,
    issuer: &Did,
    method_did: &Did,
    document: &DidDocument,
    header: &ProtectedHeader,
    signature: &str,
) -> Result<(), String> {
    if header.alg != SIGNATURE_ALG {
        return Err(format!("unsupported algorithm {}", header.alg));
    }
    if method_did != issuer {
        return Err(format!(
            "verification method {} is not controlled by issuer {}",
            header.kid, issuer
        ));
    }
    let public_key = document
        .assertion_key(&header.kid)
        .map_err(|e| e.to_string())?;
    let signature =
        Signature::from_base64url(signature).map_err(|e| format!("signature: {}", e))?;
    let input = signing_input(credential).map_err(|e| e.to_string())?;
    verify(input.as_bytes(), &signature, &public_key).map_err(|e| e.to_string())
}
