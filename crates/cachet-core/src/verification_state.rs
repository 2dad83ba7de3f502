use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, ErrorKind};

/// The stages of credential verification, in the only order they may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VerificationStage {
    /// Deserialize and require issuer, credentialSubject and proof.
    ParseCredential,
    /// Require proof.verificationMethod and proof.signature.
    ExtractProof,
    /// Decode the protected header and read alg/kid.
    DecodeHeader,
    /// Resolve the issuer's DID document.
    ResolveIssuer,
    /// Recompute the signing input and check the signature.
    ValidateSignature,
    /// Require a DID-syntactically valid credentialSubject.id.
    ValidateSubject,
    /// All checks passed. Final state.
    Verified,
}

impl VerificationStage {
    /// Every stage in execution order.
    pub const ALL: [VerificationStage; 7] = [
        Self::ParseCredential,
        Self::ExtractProof,
        Self::DecodeHeader,
        Self::ResolveIssuer,
        Self::ValidateSignature,
        Self::ValidateSubject,
        Self::Verified,
    ];

    /// Whether this is the terminal success state.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Verified)
    }

    /// The stage that follows this one, or `None` at `Verified`.
    pub fn next(&self) -> Option<VerificationStage> {
        match self {
            Self::ParseCredential => Some(Self::ExtractProof),
            Self::ExtractProof => Some(Self::DecodeHeader),
            Self::DecodeHeader => Some(Self::ResolveIssuer),
            Self::ResolveIssuer => Some(Self::ValidateSignature),
            Self::ValidateSignature => Some(Self::ValidateSubject),
            Self::ValidateSubject => Some(Self::Verified),
            Self::Verified => None,
        }
    }

    /// The failure tag emitted when this stage rejects a credential.
    pub fn failure(&self) -> Option<VerificationFailure> {
        match self {
            Self::ParseCredential => Some(VerificationFailure::MalformedCredential),
            Self::ExtractProof => Some(VerificationFailure::MissingProof),
            Self::DecodeHeader => Some(VerificationFailure::MalformedHeader),
            Self::ResolveIssuer => Some(VerificationFailure::IssuerUnresolvable),
            Self::ValidateSignature => Some(VerificationFailure::InvalidSignature),
            Self::ValidateSubject => Some(VerificationFailure::InvalidSubject),
            Self::Verified => None,
        }
    }

    /// Check that `to` directly follows `from`.
    pub fn transition(
        from: VerificationStage,
        to: VerificationStage,
    ) -> Result<VerificationStage, CoreError> {
        if from.next() == Some(to) {
            tracing::debug!(from = %from, to = %to, "verification stage transition");
            Ok(to)
        } else {
            Err(CoreError::InvalidStageTransition {
                from: from.to_string(),
                to: to.to_string(),
            })
        }
    }
}

impl fmt::Display for VerificationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ParseCredential => "ParseCredential",
            Self::ExtractProof => "ExtractProof",
            Self::DecodeHeader => "DecodeHeader",
            Self::ResolveIssuer => "ResolveIssuer",
            Self::ValidateSignature => "ValidateSignature",
            Self::ValidateSubject => "ValidateSubject",
            Self::Verified => "Verified",
        };
        f.write_str(name)
    }
}

/// Stage-tagged reason a credential was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationFailure {
    MalformedCredential,
    MissingProof,
    MalformedHeader,
    IssuerUnresolvable,
    InvalidSignature,
    InvalidSubject,
}

impl VerificationFailure {
    /// The stage that emits this failure.
    pub fn stage(&self) -> VerificationStage {
        match self {
            Self::MalformedCredential => VerificationStage::ParseCredential,
            Self::MissingProof => VerificationStage::ExtractProof,
            Self::MalformedHeader => VerificationStage::DecodeHeader,
            Self::IssuerUnresolvable => VerificationStage::ResolveIssuer,
            Self::InvalidSignature => VerificationStage::ValidateSignature,
            Self::InvalidSubject => VerificationStage::ValidateSubject,
        }
    }

    /// Taxonomy bucket for this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedCredential | Self::MissingProof | Self::MalformedHeader => {
                ErrorKind::Input
            }
            Self::IssuerUnresolvable => ErrorKind::Resolution,
            Self::InvalidSignature => ErrorKind::Cryptographic,
            Self::InvalidSubject => ErrorKind::Policy,
        }
    }
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MalformedCredential => "MalformedCredential",
            Self::MissingProof => "MissingProof",
            Self::MalformedHeader => "MalformedHeader",
            Self::IssuerUnresolvable => "IssuerUnresolvable",
            Self::InvalidSignature => "InvalidSignature",
            Self::InvalidSubject => "InvalidSubject",
        };
        f.write_str(name)
    }
}

/// Recorded result of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOutcome {
    pub stage: VerificationStage,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Drives one verification run through the stages.
///
/// The pipeline only ever acts on its current stage, so stages cannot be
/// skipped or reordered. Once a stage fails, or `Verified` is reached, the
/// pipeline is closed and further calls are ignored.
#[derive(Debug, Clone)]
pub struct VerificationPipeline {
    current: VerificationStage,
    outcomes: Vec<StageOutcome>,
    failure: Option<VerificationFailure>,
}

impl VerificationPipeline {
    pub fn new() -> Self {
        Self {
            current: VerificationStage::ParseCredential,
            outcomes: Vec::with_capacity(VerificationStage::ALL.len()),
            failure: None,
        }
    }

    /// The stage currently executing.
    pub fn current(&self) -> VerificationStage {
        self.current
    }

    /// Whether the run has finished, successfully or not.
    pub fn is_closed(&self) -> bool {
        self.failure.is_some() || self.current.is_final()
    }

    /// Mark the current stage passed and move to the next one.
    pub fn pass(&mut self) -> VerificationStage {
        if self.is_closed() {
            return self.current;
        }
        let stage = self.current;
        self.outcomes.push(StageOutcome {
            stage,
            passed: true,
            detail: None,
        });
        if let Some(next) = stage.next() {
            if let Ok(to) = VerificationStage::transition(stage, next) {
                self.current = to;
            }
        }
        if self.current.is_final() {
            self.outcomes.push(StageOutcome {
                stage: self.current,
                passed: true,
                detail: None,
            });
        }
        stage
    }

    /// Reject at the current stage.
    pub fn fail(&mut self, reason: impl Into<String>) -> Option<VerificationFailure> {
        if self.is_closed() {
            return self.failure;
        }
        let failure = self.current.failure();
        self.outcomes.push(StageOutcome {
            stage: self.current,
            passed: false,
            detail: Some(reason.into()),
        });
        self.failure = failure;
        failure
    }

    /// The failure that closed the run, if any.
    pub fn failure(&self) -> Option<VerificationFailure> {
        self.failure
    }

    /// Recorded outcomes in execution order.
    pub fn outcomes(&self) -> &[StageOutcome] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<StageOutcome> {
        self.outcomes
    }
}

impl Default for VerificationPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        let mut stage = VerificationStage::ParseCredential;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            stage = VerificationStage::transition(stage, next).unwrap();
            seen.push(stage);
        }
        assert_eq!(seen, VerificationStage::ALL.to_vec());
        assert!(stage.is_final());
    }

    #[test]
    fn test_skip_rejected() {
        let result = VerificationStage::transition(
            VerificationStage::ParseCredential,
            VerificationStage::ValidateSignature,
        );
        assert!(matches!(
            result,
            Err(CoreError::InvalidStageTransition { .. })
        ));
    }

    #[test]
    fn test_backwards_rejected() {
        assert!(VerificationStage::transition(
            VerificationStage::ResolveIssuer,
            VerificationStage::DecodeHeader
        )
        .is_err());
        assert!(VerificationStage::transition(
            VerificationStage::Verified,
            VerificationStage::ParseCredential
        )
        .is_err());
    }

    #[test]
    fn test_failure_stage_mapping() {
        for stage in VerificationStage::ALL {
            match stage.failure() {
                Some(failure) => assert_eq!(failure.stage(), stage),
                None => assert!(stage.is_final()),
            }
        }
    }

    #[test]
    fn test_failure_kinds() {
        assert_eq!(VerificationFailure::MalformedHeader.kind(), ErrorKind::Input);
        assert_eq!(
            VerificationFailure::IssuerUnresolvable.kind(),
            ErrorKind::Resolution
        );
        assert_eq!(
            VerificationFailure::InvalidSignature.kind(),
            ErrorKind::Cryptographic
        );
        assert_eq!(VerificationFailure::InvalidSubject.kind(), ErrorKind::Policy);
    }

    #[test]
    fn test_pipeline_full_pass() {
        let mut pipeline = VerificationPipeline::new();
        for _ in 0..6 {
            pipeline.pass();
        }
        assert!(pipeline.is_closed());
        assert_eq!(pipeline.current(), VerificationStage::Verified);
        assert!(pipeline.failure().is_none());
        let stages: Vec<_> = pipeline.outcomes().iter().map(|o| o.stage).collect();
        assert_eq!(stages, VerificationStage::ALL.to_vec());
        assert!(pipeline.outcomes().iter().all(|o| o.passed));
    }

    #[test]
    fn test_pipeline_fail_closes() {
        let mut pipeline = VerificationPipeline::new();
        pipeline.pass();
        pipeline.pass();
        let failure = pipeline.fail("bad base64");
        assert_eq!(failure, Some(VerificationFailure::MalformedHeader));
        assert!(pipeline.is_closed());

        // Further calls do nothing.
        pipeline.pass();
        pipeline.fail("ignored");
        assert_eq!(pipeline.outcomes().len(), 3);
        let last = pipeline.outcomes().last().unwrap();
        assert!(!last.passed);
        assert_eq!(last.detail.as_deref(), Some("bad base64"));
    }

    #[test]
    fn test_display() {
        assert_eq!(VerificationStage::ResolveIssuer.to_string(), "ResolveIssuer");
        assert_eq!(
            VerificationFailure::InvalidSignature.to_string(),
            "InvalidSignature"
        );
    }
}
