//! Canonical JSON serialization.
//!
//! `CanonicalBytes` is the only type accepted by signing and signature
//! verification of credentials. Issuer and verifier both produce it through
//! [`canonicalize`], so the signing input is reconstructed identically on
//! both sides.
//!
//! Rules:
//! - object keys sorted by their UTF-8 byte order, recursively;
//! - array order preserved;
//! - no whitespace between tokens;
//! - strings and numbers written by `serde_json` (shortest round-trip form).
//!
//! Key order is enforced here rather than relying on the ordering of
//! `serde_json::Map`, which changes when the `preserve_order` feature is
//! enabled anywhere in the dependency graph.

use serde::Serialize;
use serde_json::Value;

use crate::error::CoreError;

/// Bytes produced by canonical JSON serialization.
///
/// The inner buffer is private; [`canonicalize`] and [`CanonicalBytes::new`]
/// are the only constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    pub fn new(obj: &impl Serialize) -> Result<Self, CoreError> {
        let value = serde_json::to_value(obj)?;
        canonicalize(&value)
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// View as UTF-8 text. Canonical JSON is always valid UTF-8.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Canonicalize a JSON value.
pub fn canonicalize(value: &Value) -> Result<CanonicalBytes, CoreError> {
    let mut out = Vec::with_capacity(256);
    write_value(value, &mut out)?;
    Ok(CanonicalBytes(out))
}

fn write_value(value: &Value, out: &mut Vec<u8>) -> Result<(), CoreError> {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                if !f.is_finite() {
                    return Err(CoreError::Canonicalization(format!(
                        "non-finite number: {}",
                        n
                    )));
                }
            }
            out.extend_from_slice(n.to_string().as_bytes());
        }
        Value::String(s) => serde_json::to_writer(&mut *out, s)?,
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(item, out)?;
            }
            out.push(b']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
            out.push(b'{');
            for (i, (key, val)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                serde_json::to_writer(&mut *out, key)?;
                out.push(b':');
                write_value(val, out)?;
            }
            out.push(b'}');
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sorted_keys_compact() {
        let cb = canonicalize(&json!({"b": 2, "a": 1, "c": "hello"})).unwrap();
        assert_eq!(cb.as_str(), r#"{"a":1,"b":2,"c":"hello"}"#);
    }

    #[test]
    fn test_nested_objects_sorted() {
        let cb = canonicalize(&json!({
            "outer": {"z": true, "a": null},
            "list": [3, 2, 1]
        }))
        .unwrap();
        assert_eq!(cb.as_str(), r#"{"list":[3,2,1],"outer":{"a":null,"z":true}}"#);
    }

    #[test]
    fn test_construction_order_irrelevant() {
        let mut first = serde_json::Map::new();
        first.insert("issuer".into(), json!("did:key:a"));
        first.insert("type".into(), json!(["VerifiableCredential"]));
        first.insert("credentialSubject".into(), json!({"id": "did:key:b", "gpa": "3.8"}));

        let mut second = serde_json::Map::new();
        second.insert("credentialSubject".into(), json!({"gpa": "3.8", "id": "did:key:b"}));
        second.insert("type".into(), json!(["VerifiableCredential"]));
        second.insert("issuer".into(), json!("did:key:a"));

        let a = canonicalize(&Value::Object(first)).unwrap();
        let b = canonicalize(&Value::Object(second)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_string_escaping() {
        let cb = canonicalize(&json!({"name": "Ada \"Countess\"\nLovelace"})).unwrap();
        assert_eq!(cb.as_str(), r#"{"name":"Ada \"Countess\"\nLovelace"}"#);
    }

    #[test]
    fn test_unicode_passthrough() {
        let cb = canonicalize(&json!({"city": "São Paulo"})).unwrap();
        assert_eq!(cb.as_str(), "{\"city\":\"São Paulo\"}");
    }

    #[test]
    fn test_numbers() {
        let cb = canonicalize(&json!({"n": 42, "neg": -7, "f": 3.5})).unwrap();
        assert_eq!(cb.as_str(), r#"{"f":3.5,"n":42,"neg":-7}"#);
    }

    #[test]
    fn test_key_order_is_bytewise() {
        let cb = canonicalize(&json!({"a": 1, "B": 2, "@context": 3})).unwrap();
        assert_eq!(cb.as_str(), r#"{"@context":3,"B":2,"a":1}"#);
    }

    #[test]
    fn test_new_from_struct() {
        #[derive(Serialize)]
        struct Payload {
            zeta: u8,
            alpha: &'static str,
        }
        let cb = CanonicalBytes::new(&Payload { zeta: 1, alpha: "x" }).unwrap();
        assert_eq!(cb.as_str(), r#"{"alpha":"x","zeta":1}"#);
        assert_eq!(cb.len(), cb.as_bytes().len());
        assert!(!cb.is_empty());
    }
}
