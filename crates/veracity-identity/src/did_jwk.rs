use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{json, Value};

use crate::did_resolver::DidResolver;
use crate::document::{DidDocument, DID_CONTEXT};
use crate::error::IdentityError;

const JWS_2020_CONTEXT: &str = "https://w3id.org/security/suites/jws-2020/v1";

/// Resolves `did:jwk` identifiers, whose method-specific id is a
/// base64url-encoded public JWK.
#[derive(Debug, Default, Clone, Copy)]
pub struct DidJwkResolver;

impl DidJwkResolver {
    pub fn new() -> Self {
        Self
    }

    /// Decode the JWK embedded in a `did:jwk`.
    pub fn decode_jwk(did: &str) -> Result<Value, IdentityError> {
        let encoded = did
            .strip_prefix("did:jwk:")
            .ok_or_else(|| IdentityError::InvalidDid(did.to_string()))?;
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded.trim_end_matches('='))
            .map_err(|e| IdentityError::InvalidDid(format!("{}: {}", did, e)))?;
        let jwk: Value = serde_json::from_slice(&bytes)
            .map_err(|e| IdentityError::InvalidDid(format!("{}: {}", did, e)))?;

        if jwk.get("kty").and_then(Value::as_str).is_none() {
            return Err(IdentityError::InvalidDid(format!("{}: JWK has no kty", did)));
        }
        if jwk.get("d").is_some() {
            return Err(IdentityError::InvalidDid(format!(
                "{}: JWK contains private key material",
                did
            )));
        }
        Ok(jwk)
    }

    /// Build the DID document for a `did:jwk` without any I/O.
    pub fn document_for(did: &str) -> Result<DidDocument, IdentityError> {
        let jwk = Self::decode_jwk(did)?;
        let method_id = format!("{}#0", did);
        let key_use = jwk.get("use").and_then(Value::as_str).map(str::to_string);

        let mut document = json!({
            "@context": [DID_CONTEXT, JWS_2020_CONTEXT],
            "id": did,
            "verificationMethod": [{
                "id": method_id,
                "type": "JsonWebKey2020",
                "controller": did,
                "publicKeyJwk": jwk,
            }],
        });

        let relationships: &[&str] = match key_use.as_deref() {
            Some("enc") => &["keyAgreement"],
            Some("sig") => &[
                "assertionMethod",
                "authentication",
                "capabilityInvocation",
                "capabilityDelegation",
            ],
            _ => &[
                "assertionMethod",
                "authentication",
                "capabilityInvocation",
                "capabilityDelegation",
                "keyAgreement",
            ],
        };
        if let Some(obj) = document.as_object_mut() {
            for rel in relationships {
                obj.insert(rel.to_string(), json!([method_id]));
            }
        }

        DidDocument::from_value(document)
    }
}

#[async_trait]
impl DidResolver for DidJwkResolver {
    fn method(&self) -> &'static str {
        "jwk"
    }

    async fn resolve(&self, did: &str) -> Result<DidDocument, IdentityError> {
        Self::document_for(did)
    }
}
