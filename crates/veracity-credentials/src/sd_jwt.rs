//! SD-JWT verification: issuer signature, disclosures, key binding.
//!
//! A presentation is `<issuer-jwt>~<disclosure>~...~<kb-jwt?>`. The issuer key
//! comes from a DID `kid`, the issuer DID, or the issuer's
//! `/.well-known/jwt-vc-issuer` metadata.

use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use veracity_core::VerificationResult;
use veracity_crypto::{base64url_decode, sha256_base64url, verify_signature, KeyMaterial, KeyType};
use veracity_identity::split_did_url;
use veracity_loader::{DocumentLoader, LoaderError};

use crate::error::CredentialError;
use crate::token::{decode_segment, is_compact_token};

const SD_ALG: &str = "sha-256";
const KB_JWT_TYPE: &str = "kb+jwt";
const ISSUER_METADATA_PATH: &str = "/.well-known/jwt-vc-issuer";
/// Clock skew tolerated on `exp` and `nbf`, in seconds.
const TIME_LEEWAY: i64 = 60;

/// The parts of a compact SD-JWT presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdJwt<'a> {
    pub issuer_jwt: &'a str,
    pub disclosures: Vec<&'a str>,
    pub key_binding: Option<&'a str>,
    /// Everything up to and including the last `~`; the input to `sd_hash`.
    pub presented: &'a str,
}

impl<'a> SdJwt<'a> {
    pub fn parse(compact: &'a str) -> Result<Self, CredentialError> {
        let compact = compact.trim();
        let last_tilde = compact
            .rfind('~')
            .ok_or_else(|| CredentialError::MalformedToken("SD-JWT has no '~' separator".into()))?;
        let presented = &compact[..=last_tilde];

        let parts: Vec<&str> = compact.split('~').collect();
        let issuer_jwt = parts[0];
        if !is_compact_token(issuer_jwt) {
            return Err(CredentialError::MalformedToken(
                "issuer-signed JWT is not a compact JWS".into(),
            ));
        }

        let key_binding = match parts[parts.len() - 1] {
            "" => None,
            kb if is_compact_token(kb) => Some(kb),
            _ => {
                return Err(CredentialError::MalformedToken(
                    "key binding JWT is not a compact JWS".into(),
                ))
            }
        };

        let disclosures = parts[1..parts.len() - 1].to_vec();
        if disclosures.iter().any(|d| d.is_empty()) {
            return Err(CredentialError::Disclosure("empty disclosure".into()));
        }

        Ok(Self {
            issuer_jwt,
            disclosures,
            key_binding,
            presented,
        })
    }
}

/// Verifies SD-JWT credentials.
pub struct SdJwtVerifier {
    loader: Arc<dyn DocumentLoader>,
}

impl SdJwtVerifier {
    pub fn new(loader: Arc<dyn DocumentLoader>) -> Self {
        Self { loader }
    }

    /// Verify `compact`; `audience` and `nonce` are checked against the
    /// key-binding JWT. The disclosed claims become the result payload.
    pub async fn verify(
        &self,
        compact: &str,
        audience: Option<&str>,
        nonce: Option<&str>,
    ) -> VerificationResult {
        match self.verify_claims(compact, audience, nonce).await {
            Ok(claims) => VerificationResult {
                payload: Some(claims),
                ..VerificationResult::success()
            },
            Err(e) => {
                tracing::debug!(error = %e, "SD-JWT verification failed");
                VerificationResult::failure(e.into())
            }
        }
    }

    /// Like [`verify`](Self::verify), returning the disclosed claims or the
    /// typed failure.
    pub async fn verify_claims(
        &self,
        compact: &str,
        audience: Option<&str>,
        nonce: Option<&str>,
    ) -> Result<Value, CredentialError> {
        let sd_jwt = SdJwt::parse(compact)?;
        let (header, payload) = decode_jws(sd_jwt.issuer_jwt, "")?;

        let key = self.issuer_key(&header, &payload).await?;
        verify_jws(sd_jwt.issuer_jwt, &header, &key)?;
        check_time_claims(&payload, Utc::now().timestamp())?;

        let claims = disclose(&payload, &sd_jwt.disclosures)?;

        match sd_jwt.key_binding {
            Some(kb) => verify_key_binding(kb, &claims, sd_jwt.presented, audience, nonce)?,
            None if audience.is_some() || nonce.is_some() => {
                return Err(CredentialError::KeyBinding(
                    "audience or nonce supplied but the presentation has no key binding JWT".into(),
                ))
            }
            None => {}
        }

        tracing::debug!(
            disclosures = sd_jwt.disclosures.len(),
            key_binding = sd_jwt.key_binding.is_some(),
            "SD-JWT verified"
        );
        Ok(claims)
    }

    async fn issuer_key(&self, header: &Value, payload: &Value) -> Result<KeyMaterial, CredentialError> {
        let kid = header.get("kid").and_then(Value::as_str);
        let iss = payload.get("iss").and_then(Value::as_str);

        if let Some(kid) = kid.filter(|k| k.starts_with("did:")) {
            let kid_did = split_did_url(kid).0;
            if iss != Some(kid_did) {
                return Err(CredentialError::IssuerKey(format!(
                    "kid {} does not belong to issuer '{}'",
                    kid,
                    iss.unwrap_or_default()
                )));
            }
            let method = self.loader.load(kid).await?.document;
            return Ok(KeyMaterial::from_verification_method(&method)?);
        }

        match iss {
            Some(iss) if iss.starts_with("did:") => {
                let document = self.loader.resolve_did(iss).await?;
                let method = match kid {
                    Some(kid) => document.find_method(&absolute_kid(iss, kid)),
                    None => document.verification_methods().into_iter().next(),
                }
                .ok_or_else(|| {
                    CredentialError::IssuerKey(format!(
                        "{} has no verification method for kid {}",
                        iss,
                        kid.unwrap_or("<none>")
                    ))
                })?;
                Ok(KeyMaterial::from_verification_method(method)?)
            }
            Some(iss) if iss.starts_with("https://") || iss.starts_with("http://") => {
                self.metadata_key(iss, kid).await
            }
            _ => Err(CredentialError::IssuerKey(
                "token has neither a DID kid nor a resolvable issuer".into(),
            )),
        }
    }

    /// Key published in the issuer's JWT-VC metadata, chosen by `kid`.
    async fn metadata_key(&self, iss: &str, kid: Option<&str>) -> Result<KeyMaterial, CredentialError> {
        let url = issuer_metadata_url(iss)?;
        let metadata = self
            .loader
            .load(&url)
            .await
            .map_err(|e| unavailable(&url, e))?
            .document;
        if let Some(declared) = metadata.get("issuer").and_then(Value::as_str) {
            if declared.trim_end_matches('/') != iss.trim_end_matches('/') {
                return Err(CredentialError::IssuerKey(format!(
                    "metadata issuer '{}' does not match token issuer '{}'",
                    declared, iss
                )));
            }
        }

        let jwks = match (metadata.get("jwks"), metadata.get("jwks_uri").and_then(Value::as_str)) {
            (Some(jwks), _) => jwks.clone(),
            (None, Some(jwks_uri)) => {
                self.loader
                    .load(jwks_uri)
                    .await
                    .map_err(|e| unavailable(jwks_uri, e))?
                    .document
            }
            _ => {
                return Err(CredentialError::IssuerKey(
                    "issuer metadata has neither jwks nor jwks_uri".into(),
                ))
            }
        };

        let keys = jwks
            .get("keys")
            .and_then(Value::as_array)
            .ok_or_else(|| CredentialError::IssuerKey("JWKS has no keys".into()))?;
        let jwk = match kid {
            Some(kid) => keys
                .iter()
                .find(|k| k.get("kid").and_then(Value::as_str) == Some(kid)),
            None if keys.len() == 1 => keys.first(),
            None => None,
        }
        .ok_or_else(|| {
            CredentialError::IssuerKey(format!(
                "no issuer key with kid {}",
                kid.unwrap_or("<none>")
            ))
        })?;

        Ok(KeyMaterial::from_jwk(jwk)?)
    }
}

/// `https://host/path` → `https://host/.well-known/jwt-vc-issuer/path`.
pub fn issuer_metadata_url(iss: &str) -> Result<String, CredentialError> {
    let (scheme, rest) = iss
        .split_once("://")
        .filter(|(scheme, _)| matches!(*scheme, "https" | "http"))
        .ok_or_else(|| CredentialError::IssuerKey(format!("issuer '{}' is not a URL", iss)))?;
    let rest = rest.trim_end_matches('/');
    let (host, path) = match rest.find('/') {
        Some(i) => rest.split_at(i),
        None => (rest, ""),
    };
    if host.is_empty() {
        return Err(CredentialError::IssuerKey(format!("issuer '{}' has no host", iss)));
    }
    Ok(format!("{}://{}{}{}", scheme, host, ISSUER_METADATA_PATH, path))
}

/// Reject an issuer JWT that has expired or is not yet valid at `now`.
fn check_time_claims(payload: &Value, now: i64) -> Result<(), CredentialError> {
    if let Some(exp) = numeric_claim(payload, "exp")? {
        if exp + TIME_LEEWAY < now {
            return Err(CredentialError::Validity(format!("SD-JWT expired at {}", exp)));
        }
    }
    if let Some(nbf) = numeric_claim(payload, "nbf")? {
        if nbf - TIME_LEEWAY > now {
            return Err(CredentialError::Validity(format!("SD-JWT not valid before {}", nbf)));
        }
    }
    Ok(())
}

fn numeric_claim(payload: &Value, claim: &str) -> Result<Option<i64>, CredentialError> {
    match payload.get(claim) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_f64()
            .map(|t| Some(t as i64))
            .ok_or_else(|| CredentialError::Validity(format!("{} must be a number", claim))),
    }
}

fn unavailable(what: &str, err: LoaderError) -> CredentialError {
    CredentialError::IssuerKey(format!("{} unavailable: {}", what, err))
}

fn absolute_kid(did: &str, kid: &str) -> String {
    if kid.starts_with("did:") {
        kid.to_string()
    } else if kid.starts_with('#') {
        format!("{}{}", did, kid)
    } else {
        format!("{}#{}", did, kid)
    }
}

fn decode_jws(jws: &str, label: &str) -> Result<(Value, Value), CredentialError> {
    let mut parts = jws.split('.');
    let header = decode_segment(parts.next().unwrap_or_default(), &format!("{}header", label))?;
    let payload = decode_segment(parts.next().unwrap_or_default(), &format!("{}payload", label))?;
    Ok((header, payload))
}

/// Check a compact JWS signature with `key`. `ES256` needs a P-256 key and
/// `EdDSA` an Ed25519 key.
fn verify_jws(jws: &str, header: &Value, key: &KeyMaterial) -> Result<(), CredentialError> {
    let alg = header.get("alg").and_then(Value::as_str).unwrap_or_default();
    let expected = match alg {
        "ES256" => KeyType::P256,
        "EdDSA" => KeyType::Ed25519,
        other => {
            return Err(CredentialError::TokenSignature(format!(
                "unsupported alg '{}'",
                other
            )))
        }
    };
    if key.key_type() != expected {
        return Err(CredentialError::TokenSignature(format!(
            "alg {} cannot be verified with a {} key",
            alg,
            key.key_type()
        )));
    }

    let (signing_input, signature) = jws
        .rsplit_once('.')
        .ok_or_else(|| CredentialError::MalformedToken("missing signature".into()))?;
    let signature = base64url_decode(signature)
        .map_err(|e| CredentialError::MalformedToken(format!("signature: {}", e)))?;
    verify_signature(key, signing_input.as_bytes(), &signature)
        .map_err(|e| CredentialError::TokenSignature(e.to_string()))
}

/// A decoded disclosure.
#[derive(Debug, Clone, PartialEq)]
enum Disclosure {
    /// `[salt, name, value]`
    Property { name: String, value: Value },
    /// `[salt, value]`
    Element(Value),
}

impl Disclosure {
    fn decode(raw: &str) -> Result<Self, CredentialError> {
        let invalid = |reason: &str| CredentialError::Disclosure(format!("{}: {}", raw, reason));
        let bytes = base64url_decode(raw).map_err(|_| invalid("not base64url"))?;
        let value: Value = serde_json::from_slice(&bytes).map_err(|_| invalid("not JSON"))?;
        let items = value.as_array().ok_or_else(|| invalid("not an array"))?;
        if !items.first().is_some_and(Value::is_string) {
            return Err(invalid("salt must be a string"));
        }

        match items.as_slice() {
            [_, Value::String(name), value] => {
                if name == "_sd" || name == "..." {
                    return Err(invalid("reserved claim name"));
                }
                Ok(Self::Property {
                    name: name.clone(),
                    value: value.clone(),
                })
            }
            [_, value] => Ok(Self::Element(value.clone())),
            _ => Err(invalid("expected 2 or 3 elements")),
        }
    }
}

/// Replace digests in `payload` with the claims their disclosures reveal.
///
/// Every disclosure must be referenced exactly once. Digests without a
/// disclosure are decoys and are dropped.
fn disclose(payload: &Value, disclosures: &[&str]) -> Result<Value, CredentialError> {
    if let Some(alg) = payload.get("_sd_alg") {
        if alg.as_str() != Some(SD_ALG) {
            return Err(CredentialError::Disclosure(format!(
                "unsupported _sd_alg {}",
                alg
            )));
        }
    }

    let mut by_digest = HashMap::with_capacity(disclosures.len());
    for raw in disclosures {
        let digest = sha256_base64url(raw.as_bytes());
        if by_digest.insert(digest, Disclosure::decode(raw)?).is_some() {
            return Err(CredentialError::Disclosure(format!(
                "duplicate disclosure {}",
                raw
            )));
        }
    }

    let mut claims = payload.clone();
    let mut used = HashSet::new();
    expand(&mut claims, &by_digest, &mut used)?;
    if used.len() != by_digest.len() {
        return Err(CredentialError::Disclosure(
            "disclosure is not referenced by the credential".into(),
        ));
    }

    if let Some(obj) = claims.as_object_mut() {
        obj.remove("_sd_alg");
    }
    Ok(claims)
}

fn expand(
    value: &mut Value,
    disclosures: &HashMap<String, Disclosure>,
    used: &mut HashSet<String>,
) -> Result<(), CredentialError> {
    match value {
        Value::Object(obj) => {
            let digests = obj.remove("_sd");
            for child in obj.values_mut() {
                expand(child, disclosures, used)?;
            }
            if let Some(digests) = digests {
                reveal_properties(obj, &digests, disclosures, used)?;
            }
        }
        Value::Array(items) => {
            let mut revealed = Vec::with_capacity(items.len());
            for mut item in items.drain(..) {
                let Some(digest) = array_digest(&item) else {
                    expand(&mut item, disclosures, used)?;
                    revealed.push(item);
                    continue;
                };
                match disclosures.get(&digest) {
                    None => {}
                    Some(Disclosure::Element(element)) => {
                        mark_used(used, &digest)?;
                        let mut element = element.clone();
                        expand(&mut element, disclosures, used)?;
                        revealed.push(element);
                    }
                    Some(Disclosure::Property { .. }) => {
                        return Err(CredentialError::Disclosure(
                            "property disclosure referenced from an array".into(),
                        ))
                    }
                }
            }
            *items = revealed;
        }
        _ => {}
    }
    Ok(())
}

fn reveal_properties(
    obj: &mut Map<String, Value>,
    digests: &Value,
    disclosures: &HashMap<String, Disclosure>,
    used: &mut HashSet<String>,
) -> Result<(), CredentialError> {
    let digests = digests
        .as_array()
        .ok_or_else(|| CredentialError::Disclosure("_sd must be an array".into()))?;

    for digest in digests {
        let digest = digest
            .as_str()
            .ok_or_else(|| CredentialError::Disclosure("_sd digest must be a string".into()))?;
        match disclosures.get(digest) {
            None => {}
            Some(Disclosure::Property { name, value }) => {
                mark_used(used, digest)?;
                if obj.contains_key(name) {
                    return Err(CredentialError::Disclosure(format!(
                        "claim '{}' is both disclosed and present",
                        name
                    )));
                }
                let mut value = value.clone();
                expand(&mut value, disclosures, used)?;
                obj.insert(name.clone(), value);
            }
            Some(Disclosure::Element(_)) => {
                return Err(CredentialError::Disclosure(
                    "array element disclosure referenced from _sd".into(),
                ))
            }
        }
    }
    Ok(())
}

fn mark_used(used: &mut HashSet<String>, digest: &str) -> Result<(), CredentialError> {
    if used.insert(digest.to_string()) {
        Ok(())
    } else {
        Err(CredentialError::Disclosure(format!(
            "digest {} is referenced more than once",
            digest
        )))
    }
}

/// Digest of a `{"...": digest}` array element.
fn array_digest(item: &Value) -> Option<String> {
    let obj = item.as_object()?;
    if obj.len() != 1 {
        return None;
    }
    obj.get("...").and_then(Value::as_str).map(str::to_string)
}

fn verify_key_binding(
    kb_jwt: &str,
    claims: &Value,
    presented: &str,
    audience: Option<&str>,
    nonce: Option<&str>,
) -> Result<(), CredentialError> {
    let jwk = claims
        .get("cnf")
        .and_then(|cnf| cnf.get("jwk"))
        .ok_or_else(|| CredentialError::KeyBinding("credential has no cnf.jwk".into()))?;
    let holder_key = KeyMaterial::from_jwk(jwk)?;

    let (header, kb_claims) = decode_jws(kb_jwt, "key binding ")?;
    if header.get("typ").and_then(Value::as_str) != Some(KB_JWT_TYPE) {
        return Err(CredentialError::KeyBinding(format!(
            "key binding JWT typ must be {}",
            KB_JWT_TYPE
        )));
    }
    verify_jws(kb_jwt, &header, &holder_key)
        .map_err(|e| CredentialError::KeyBinding(e.to_string()))?;

    let sd_hash = sha256_base64url(presented.as_bytes());
    if kb_claims.get("sd_hash").and_then(Value::as_str) != Some(sd_hash.as_str()) {
        return Err(CredentialError::KeyBinding("sd_hash does not match".into()));
    }

    if let Some(nonce) = nonce {
        if kb_claims.get("nonce").and_then(Value::as_str) != Some(nonce) {
            return Err(CredentialError::KeyBinding("nonce does not match".into()));
        }
    }
    if let Some(audience) = audience {
        let matches = match kb_claims.get("aud") {
            Some(Value::String(aud)) => aud == audience,
            Some(Value::Array(auds)) => auds.iter().any(|a| a.as_str() == Some(audience)),
            _ => false,
        };
        if !matches {
            return Err(CredentialError::KeyBinding("audience does not match".into()));
        }
    }
    Ok(())
}
