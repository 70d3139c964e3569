use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::IdentityError;

/// Base DID core context.
pub const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

/// Verification relationships that may reference or embed methods.
pub const RELATIONSHIPS: [&str; 5] = [
    "authentication",
    "assertionMethod",
    "keyAgreement",
    "capabilityInvocation",
    "capabilityDelegation",
];

/// A W3C DID document.
///
/// Kept as JSON since documents are open-world; accessors cover the fields
/// verification needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DidDocument(Value);

impl DidDocument {
    /// Wrap a JSON value, requiring an object with a string `id`.
    pub fn from_value(value: Value) -> Result<Self, IdentityError> {
        match value.get("id") {
            Some(Value::String(_)) => Ok(Self(value)),
            _ => Err(IdentityError::InvalidDocument(
                "document must be an object with a string id".into(),
            )),
        }
    }

    pub fn id(&self) -> &str {
        self.0.get("id").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn context(&self) -> Option<&Value> {
        self.0.get("@context")
    }

    pub fn has_context(&self) -> bool {
        self.context().is_some()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// All verification methods, including ones embedded in relationships.
    pub fn verification_methods(&self) -> Vec<&Value> {
        let listed = self
            .0
            .get("verificationMethod")
            .and_then(Value::as_array)
            .into_iter()
            .flatten();
        let embedded = RELATIONSHIPS
            .iter()
            .filter_map(|rel| self.0.get(*rel).and_then(Value::as_array))
            .flatten()
            .filter(|entry| entry.is_object());
        listed.chain(embedded).collect()
    }

    /// Find the method a DID URL points at. Relative ids on either side are
    /// read against this document's id, so a method only matches a URL on
    /// the same DID.
    pub fn find_method(&self, did_url: &str) -> Option<&Value> {
        let wanted = self.absolute_id(did_url);
        self.verification_methods().into_iter().find(|method| {
            method
                .get("id")
                .and_then(Value::as_str)
                .is_some_and(|id| self.absolute_id(id) == wanted)
        })
    }

    /// Whether `relationship` lists `method_id`, by reference or embedded.
    pub fn has_relationship(&self, relationship: &str, method_id: &str) -> bool {
        let Some(entries) = self.0.get(relationship).and_then(Value::as_array) else {
            return false;
        };
        let wanted = self.absolute_id(method_id);
        entries.iter().any(|entry| {
            let id = match entry {
                Value::String(s) => Some(s.as_str()),
                Value::Object(_) => entry.get("id").and_then(Value::as_str),
                _ => None,
            };
            id.is_some_and(|id| self.absolute_id(id) == wanted)
        })
    }

    /// `#frag` becomes `<document id>#frag`; absolute ids are unchanged.
    pub fn absolute_id(&self, id: &str) -> String {
        if id.starts_with('#') {
            format!("{}{}", self.id(), id)
        } else {
            id.to_string()
        }
    }
}

/// Split a DID URL into the bare DID and its fragment.
pub fn split_did_url(did_url: &str) -> (&str, Option<&str>) {
    match did_url.split_once('#') {
        Some((did, fragment)) => (did, Some(fragment)),
        None => (did_url, None),
    }
}

/// Method name of a DID (`did:web:x` → `web`).
pub fn did_method(did: &str) -> Option<&str> {
    let rest = did.strip_prefix("did:")?;
    let (method, id) = rest.split_once(':')?;
    (!method.is_empty() && !id.is_empty()).then_some(method)
}
