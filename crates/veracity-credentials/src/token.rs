//! Compact JWT credentials: decoding and signature verification against keys
//! published in the issuer's DID document.

use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use veracity_core::issuer_id;
use veracity_crypto::base64url_decode;
use veracity_identity::DidDocument;
use veracity_loader::DocumentLoader;

use crate::error::CredentialError;

/// Header and claims of a compact token, signature unchecked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedToken {
    pub header: Value,
    pub payload: Value,
}

/// Outcome of token verification. Failures are data, not errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenVerification {
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl TokenVerification {
    fn from_result(result: Result<Value, CredentialError>) -> Self {
        match result {
            Ok(payload) => Self {
                verified: true,
                message: None,
                payload: Some(payload),
            },
            Err(e) => Self {
                verified: false,
                message: Some(e.to_string()),
                payload: None,
            },
        }
    }
}

/// Whether `s` is a compact JWS: three non-empty base64url segments.
pub fn is_compact_token(s: &str) -> bool {
    let segments: Vec<&str> = s.split('.').collect();
    segments.len() == 3
        && segments.iter().all(|seg| {
            !seg.is_empty()
                && seg
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        })
}

/// Decode header and payload without checking the signature.
///
/// An SD-JWT is accepted; only its issuer-signed part is decoded.
pub fn decode(token: &str) -> Result<DecodedToken, CredentialError> {
    let jws = token.trim().split('~').next().unwrap_or_default();
    if !is_compact_token(jws) {
        return Err(CredentialError::MalformedToken(
            "expected three base64url segments".into(),
        ));
    }
    let mut parts = jws.split('.');
    let header = decode_segment(parts.next().unwrap_or_default(), "header")?;
    let payload = decode_segment(parts.next().unwrap_or_default(), "payload")?;
    Ok(DecodedToken { header, payload })
}

pub(crate) fn decode_segment(segment: &str, name: &str) -> Result<Value, CredentialError> {
    let bytes = base64url_decode(segment)
        .map_err(|e| CredentialError::MalformedToken(format!("{}: {}", name, e)))?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| CredentialError::MalformedToken(format!("{}: {}", name, e)))?;
    if !value.is_object() {
        return Err(CredentialError::MalformedToken(format!(
            "{} is not a JSON object",
            name
        )));
    }
    Ok(value)
}

/// Issuer of a token payload: `issuer`, `iss`, or `vc.issuer`.
pub fn token_issuer(payload: &Value) -> Option<&str> {
    issuer_id(payload).or_else(|| payload.get("vc").and_then(issuer_id))
}

/// Verify `token` with the key its `kid` selects from `did_document`.
pub fn verify(token: &str, did_document: &DidDocument) -> TokenVerification {
    TokenVerification::from_result(verify_token(token, did_document))
}

/// Like [`verify`], returning the payload or the typed failure.
pub fn verify_token(token: &str, did_document: &DidDocument) -> Result<Value, CredentialError> {
    let header = jsonwebtoken::decode_header(token)
        .map_err(|e| CredentialError::MalformedToken(e.to_string()))?;
    let kid = header
        .kid
        .as_deref()
        .ok_or_else(|| CredentialError::MalformedToken("token header has no kid".into()))?;

    let method = find_method_by_kid(did_document, kid).ok_or_else(|| {
        CredentialError::TokenSignature(format!("no verification method found for kid {}", kid))
    })?;

    let method_type = method.get("type").and_then(Value::as_str).unwrap_or_default();
    if !matches!(method_type, "JsonWebKey" | "JsonWebKey2020") {
        return Err(CredentialError::TokenSignature(format!(
            "verification method type '{}' not yet implemented",
            method_type
        )));
    }
    let mut jwk = method
        .get("publicKeyJwk")
        .cloned()
        .ok_or_else(|| CredentialError::TokenSignature("method has no publicKeyJwk".into()))?;
    if let Some(obj) = jwk.as_object_mut() {
        if !obj.contains_key("alg") {
            let alg = serde_json::to_value(header.alg)
                .map_err(|e| CredentialError::MalformedToken(e.to_string()))?;
            obj.insert("alg".into(), alg);
        }
    }

    let jwk: Jwk = serde_json::from_value(jwk)
        .map_err(|e| CredentialError::TokenSignature(format!("invalid JWK: {}", e)))?;
    let key = DecodingKey::from_jwk(&jwk)
        .map_err(|e| CredentialError::TokenSignature(format!("invalid JWK: {}", e)))?;

    let mut validation = Validation::new(header.alg);
    validation.required_spec_claims = HashSet::new();
    validation.validate_aud = false;

    let data = jsonwebtoken::decode::<Value>(token, &key, &validation)
        .map_err(|e| CredentialError::TokenSignature(e.to_string()))?;
    Ok(data.claims)
}

/// Resolve the issuer DID of `token` and verify against it.
pub async fn handle_token(token: &str, loader: &dyn DocumentLoader) -> TokenVerification {
    TokenVerification::from_result(verify_with_issuer(token, loader).await)
}

/// Like [`handle_token`], returning the payload or the typed failure.
pub async fn verify_with_issuer(
    token: &str,
    loader: &dyn DocumentLoader,
) -> Result<Value, CredentialError> {
    let decoded = decode(token)?;
    let issuer = token_issuer(&decoded.payload)
        .ok_or_else(|| CredentialError::MalformedToken("token has no issuer".into()))?;
    if !issuer.starts_with("did:") {
        return Err(CredentialError::IssuerKey(format!(
            "issuer '{}' is not a DID",
            issuer
        )));
    }

    tracing::debug!(%issuer, "verifying JWT credential");
    let document = loader.resolve_did(issuer).await?;
    verify_token(token, &document)
}

/// A DID URL `kid` must name a method on this document; a bare `kid` is read
/// as a fragment of it.
fn find_method_by_kid<'a>(document: &'a DidDocument, kid: &str) -> Option<&'a Value> {
    if kid.starts_with("did:") {
        return document.find_method(kid);
    }
    let fragment = kid.trim_start_matches('#');
    document.find_method(&format!("#{}", fragment))
}
