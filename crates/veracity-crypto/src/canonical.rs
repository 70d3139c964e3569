//! JSON Canonicalization Scheme (RFC 8785) for Data Integrity `*-jcs-*` suites.

use serde_json::Value;

use crate::error::CryptoError;

/// Serialize a JSON value to its canonical byte form: sorted keys, compact
/// separators, ECMAScript number formatting.
pub fn canonicalize(value: &Value) -> Result<Vec<u8>, CryptoError> {
    serde_jcs::to_vec(value).map_err(|e| CryptoError::Canonicalization(e.to_string()))
}
