use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// DID methods understood by Cachet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DidMethod {
    /// Self-certifying `did:key`: the identifier encodes the public key.
    Key,
    /// Domain-bound `did:web`: the document lives at a well-known HTTPS location.
    Web,
}

impl DidMethod {
    /// Method name as it appears in the DID (`key`, `web`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::Web => "web",
        }
    }

    /// Whether resolution is a pure local computation.
    pub fn is_self_certifying(&self) -> bool {
        matches!(self, Self::Key)
    }
}

impl fmt::Display for DidMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DidMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "key" => Ok(Self::Key),
            "web" => Ok(Self::Web),
            other => Err(CoreError::UnsupportedMethod(other.to_string())),
        }
    }
}

/// Decentralized Identifier.
/// Format: `did:<method>:<method-specific-id>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

impl Did {
    /// Parse and validate a DID URI. Fragments and queries are rejected;
    /// use [`Did::from_did_url`] for verification method references.
    pub fn new(uri: impl Into<String>) -> Result<Self, CoreError> {
        let uri = uri.into();
        validate_did_syntax(&uri)?;
        Ok(Self(uri))
    }

    /// Extract the DID from a DID URL such as `did:key:z6Mk...#z6Mk...`.
    pub fn from_did_url(url: &str) -> Result<Self, CoreError> {
        let end = url.find(['#', '?', '/']).unwrap_or(url.len());
        Self::new(&url[..end])
    }

    /// Create a DID from method and identifier components.
    pub fn from_parts(method: DidMethod, identifier: &str) -> Result<Self, CoreError> {
        Self::new(format!("did:{}:{}", method, identifier))
    }

    /// Whether a string is a syntactically valid DID.
    pub fn is_valid(uri: &str) -> bool {
        validate_did_syntax(uri).is_ok()
    }

    /// Get the full DID URI.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract the method name (`key`, `web`, ...).
    pub fn method_name(&self) -> &str {
        self.0.split(':').nth(1).unwrap_or_default()
    }

    /// The method, if it is one Cachet supports.
    pub fn method(&self) -> Result<DidMethod, CoreError> {
        self.method_name().parse()
    }

    /// Extract the method-specific identifier.
    pub fn identifier(&self) -> &str {
        self.0.splitn(3, ':').nth(2).unwrap_or_default()
    }

    /// Build a DID URL by appending a fragment.
    pub fn with_fragment(&self, fragment: &str) -> String {
        format!("{}#{}", self.0, fragment)
    }
}

fn validate_did_syntax(uri: &str) -> Result<(), CoreError> {
    let invalid = |reason: &str| CoreError::InvalidDid(format!("{}: {}", reason, uri));

    let rest = uri
        .strip_prefix("did:")
        .ok_or_else(|| invalid("DID must start with 'did:'"))?;
    let (method, id) = rest
        .split_once(':')
        .ok_or_else(|| invalid("DID must have format 'did:<method>:<identifier>'"))?;

    if method.is_empty()
        || !method
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    {
        return Err(invalid("invalid method name"));
    }
    if id.is_empty() || id.ends_with(':') {
        return Err(invalid("empty method-specific identifier"));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '%' | ':'))
    {
        return Err(invalid("illegal character in identifier"));
    }
    Ok(())
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Did {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Did {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}

impl AsRef<str> for Did {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
