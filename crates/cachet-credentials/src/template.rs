use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use cachet_core::{VC_CONTEXT_V1, VC_TYPE_MARKER};

use crate::error::CredentialError;

/// JSON type a claim value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl ClaimType {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }
}

/// Definition of a claim within a credential template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimDefinition {
    /// Claim name.
    pub name: String,
    /// Expected JSON type.
    pub value_type: ClaimType,
    /// Whether this claim must be present after merging.
    pub required: bool,
    pub description: Option<String>,
}

impl ClaimDefinition {
    fn new(name: &str, value_type: ClaimType, required: bool, description: &str) -> Self {
        Self {
            name: name.into(),
            value_type,
            required,
            description: Some(description.into()),
        }
    }
}

/// A fixed credential shape selected by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialTemplate {
    /// Catalog key (e.g., "university-degree").
    pub id: String,
    /// Human-readable name.
    pub name: String,
    pub description: String,
    /// `@context` entries after the base credentials context.
    pub context: Vec<String>,
    /// Credential types after `VerifiableCredential`.
    pub types: Vec<String>,
    pub claims: Vec<ClaimDefinition>,
    /// Claim values used when the caller supplies none.
    pub default_claims: Value,
}

impl CredentialTemplate {
    /// The full `@context` list of a credential built from this template.
    pub fn full_context(&self) -> Vec<String> {
        let mut context = vec![VC_CONTEXT_V1.to_string()];
        context.extend(self.context.iter().filter(|c| *c != VC_CONTEXT_V1).cloned());
        context
    }

    /// The full `type` list, always led by `VerifiableCredential`.
    pub fn full_types(&self) -> Vec<String> {
        let mut types = vec![VC_TYPE_MARKER.to_string()];
        types.extend(self.types.iter().filter(|t| *t != VC_TYPE_MARKER).cloned());
        types
    }

    /// Merge the default claim shape with caller claims and bind the subject.
    ///
    /// Objects merge recursively with caller values winning; any other value
    /// is replaced. `id` is always the subject DID.
    pub fn build_subject(
        &self,
        subject_did: &str,
        extra_claims: &Value,
    ) -> Result<Map<String, Value>, CredentialError> {
        let mut merged = self.default_claims.clone();
        match extra_claims {
            Value::Null => {}
            Value::Object(_) => deep_merge(&mut merged, extra_claims),
            _ => {
                return Err(CredentialError::InvalidClaims(
                    "extra claims must be a JSON object".into(),
                ))
            }
        }
        let Value::Object(mut subject) = merged else {
            return Err(CredentialError::InvalidClaims(format!(
                "template {} has a non-object claim shape",
                self.id
            )));
        };
        subject.insert("id".into(), Value::String(subject_did.to_string()));
        self.validate(&subject)?;
        Ok(subject)
    }

    /// Check merged claims against the claim definitions.
    pub fn validate(&self, claims: &Map<String, Value>) -> Result<(), CredentialError> {
        for def in &self.claims {
            match claims.get(&def.name) {
                None if def.required => {
                    return Err(CredentialError::InvalidClaims(format!(
                        "missing required claim: {}",
                        def.name
                    )))
                }
                Some(value) if !def.value_type.matches(value) => {
                    return Err(CredentialError::InvalidClaims(format!(
                        "claim {} must be of type {:?}",
                        def.name, def.value_type
                    )))
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let nested = value.is_object() && base.get(key).is_some_and(Value::is_object);
                match base.get_mut(key) {
                    Some(existing) if nested => deep_merge(existing, value),
                    _ => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

/// Catalog of credential templates.
pub struct TemplateCatalog {
    templates: DashMap<String, CredentialTemplate>,
}

impl TemplateCatalog {
    /// Create a catalog with the built-in templates.
    pub fn new() -> Self {
        let catalog = Self::empty();
        for template in builtin_templates() {
            catalog.templates.insert(template.id.clone(), template);
        }
        catalog
    }

    pub fn empty() -> Self {
        Self {
            templates: DashMap::new(),
        }
    }

    /// Register a custom template. The default claim shape must satisfy the
    /// template's own definitions.
    pub fn register(&self, template: CredentialTemplate) -> Result<(), CredentialError> {
        if template.id.is_empty() {
            return Err(CredentialError::InvalidClaims("template id must be set".into()));
        }
        let Value::Object(defaults) = &template.default_claims else {
            return Err(CredentialError::InvalidClaims(format!(
                "template {} default claims must be an object",
                template.id
            )));
        };
        template.validate(defaults)?;
        self.templates.insert(template.id.clone(), template);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<CredentialTemplate, CredentialError> {
        self.templates
            .get(id)
            .map(|entry| entry.clone())
            .ok_or_else(|| CredentialError::UnknownTemplate(id.to_string()))
    }

    /// All templates, sorted by id.
    pub fn list(&self) -> Vec<CredentialTemplate> {
        let mut templates: Vec<CredentialTemplate> =
            self.templates.iter().map(|e| e.value().clone()).collect();
        templates.sort_by(|a, b| a.id.cmp(&b.id));
        templates
    }

    pub fn count(&self) -> usize {
        self.templates.len()
    }
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin_templates() -> Vec<CredentialTemplate> {
    vec![
        CredentialTemplate {
            id: "university-degree".into(),
            name: "University Degree".into(),
            description: "Academic degree conferred by a university".into(),
            context: vec!["https://www.w3.org/2018/credentials/examples/v1".into()],
            types: vec!["UniversityDegreeCredential".into()],
            claims: vec![
                ClaimDefinition::new("degree", ClaimType::Object, true, "Degree type, name and GPA"),
                ClaimDefinition::new("university", ClaimType::String, true, "Conferring institution"),
                ClaimDefinition::new("graduationDate", ClaimType::String, false, "Date of graduation"),
            ],
            default_claims: json!({
                "degree": {
                    "type": "BachelorDegree",
                    "name": "Bachelor of Science in Computer Science",
                    "gpa": "3.8"
                },
                "university": "Example University",
                "graduationDate": "2024-05-15"
            }),
        },
        CredentialTemplate {
            id: "employment-verification".into(),
            name: "Employment Verification".into(),
            description: "Current or past employment with an organisation".into(),
            context: vec![],
            types: vec!["EmploymentCredential".into()],
            claims: vec![
                ClaimDefinition::new("employer", ClaimType::String, true, "Employing organisation"),
                ClaimDefinition::new("position", ClaimType::String, true, "Job title"),
                ClaimDefinition::new("startDate", ClaimType::String, true, "Employment start date"),
                ClaimDefinition::new("employmentType", ClaimType::String, false, "full-time, part-time, contract"),
            ],
            default_claims: json!({
                "employer": "Example Corp",
                "position": "Software Engineer",
                "startDate": "2022-01-10",
                "employmentType": "full-time"
            }),
        },
        CredentialTemplate {
            id: "age-verification".into(),
            name: "Age Verification".into(),
            description: "Attests a minimum age without revealing the date of birth".into(),
            context: vec![],
            types: vec!["AgeVerificationCredential".into()],
            claims: vec![
                ClaimDefinition::new("ageOver", ClaimType::Number, true, "Minimum age that was verified"),
                ClaimDefinition::new("verified", ClaimType::Boolean, true, "Whether the check succeeded"),
            ],
            default_claims: json!({
                "ageOver": 18,
                "verified": true
            }),
        },
        CredentialTemplate {
            id: "professional-certification".into(),
            name: "Professional Certification".into(),
            description: "Certification granted by a professional body".into(),
            context: vec![],
            types: vec!["ProfessionalCertificationCredential".into()],
            claims: vec![
                ClaimDefinition::new("certification", ClaimType::Object, true, "Certification name, body and number"),
                ClaimDefinition::new("validUntil", ClaimType::String, false, "Expiry of the certification"),
            ],
            default_claims: json!({
                "certification": {
                    "name": "Certified Cloud Architect",
                    "issuingBody": "Example Certification Board",
                    "certificationId": "CCA-2024-0001"
                },
                "validUntil": "2027-01-01"
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUBJECT: &str = "did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK";

    #[test]
    fn test_builtin_templates() {
        let catalog = TemplateCatalog::new();
        assert_eq!(catalog.count(), 4);
        let ids: Vec<String> = catalog.list().into_iter().map(|t| t.id).collect();
        assert_eq!(
            ids,
            vec![
                "age-verification",
                "employment-verification",
                "professional-certification",
                "university-degree"
            ]
        );
    }

    #[test]
    fn test_builtin_defaults_satisfy_definitions() {
        for template in TemplateCatalog::new().list() {
            assert!(
                template.build_subject(SUBJECT, &Value::Null).is_ok(),
                "{} defaults invalid",
                template.id
            );
        }
    }

    #[test]
    fn test_unknown_template() {
        assert!(matches!(
            TemplateCatalog::new().get("nonexistent"),
            Err(CredentialError::UnknownTemplate(_))
        ));
    }

    #[test]
    fn test_full_types_and_context() {
        let t = TemplateCatalog::new().get("university-degree").unwrap();
        assert_eq!(t.full_types(), vec!["VerifiableCredential", "UniversityDegreeCredential"]);
        assert_eq!(t.full_context()[0], VC_CONTEXT_V1);
        assert_eq!(t.full_context().len(), 2);
    }

    #[test]
    fn test_deep_merge_extra_wins() {
        let t = TemplateCatalog::new().get("university-degree").unwrap();
        let subject = t
            .build_subject(SUBJECT, &json!({"degree": {"gpa": "4.0"}, "honors": true}))
            .unwrap();
        assert_eq!(subject["degree"]["gpa"], "4.0");
        // Untouched nested fields survive the merge.
        assert_eq!(subject["degree"]["type"], "BachelorDegree");
        assert_eq!(subject["honors"], true);
        assert_eq!(subject["id"], SUBJECT);
    }

    #[test]
    fn test_subject_id_cannot_be_overridden() {
        let t = TemplateCatalog::new().get("age-verification").unwrap();
        let subject = t
            .build_subject(SUBJECT, &json!({"id": "did:key:zSomeoneElse"}))
            .unwrap();
        assert_eq!(subject["id"], SUBJECT);
    }

    #[test]
    fn test_claim_type_mismatch() {
        let t = TemplateCatalog::new().get("age-verification").unwrap();
        assert!(matches!(
            t.build_subject(SUBJECT, &json!({"ageOver": "eighteen"})),
            Err(CredentialError::InvalidClaims(_))
        ));
    }

    #[test]
    fn test_non_object_claims_rejected() {
        let t = TemplateCatalog::new().get("age-verification").unwrap();
        assert!(t.build_subject(SUBJECT, &json!([1, 2])).is_err());
    }

    #[test]
    fn test_register_custom_template() {
        let catalog = TemplateCatalog::empty();
        let template = CredentialTemplate {
            id: "membership".into(),
            name: "Membership".into(),
            description: "Club membership".into(),
            context: vec![],
            types: vec!["MembershipCredential".into()],
            claims: vec![ClaimDefinition::new("club", ClaimType::String, true, "Club name")],
            default_claims: json!({"club": "Chess"}),
        };
        catalog.register(template).unwrap();
        assert_eq!(catalog.get("membership").unwrap().name, "Membership");
    }

    #[test]
    fn test_register_invalid_defaults() {
        let catalog = TemplateCatalog::empty();
        let template = CredentialTemplate {
            id: "broken".into(),
            name: "Broken".into(),
            description: String::new(),
            context: vec![],
            types: vec![],
            claims: vec![ClaimDefinition::new("club", ClaimType::String, true, "Club name")],
            default_claims: json!({}),
        };
        assert!(catalog.register(template).is_err());
        assert_eq!(catalog.count(), 0);
    }
}
