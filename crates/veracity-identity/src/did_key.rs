use async_trait::async_trait;
use serde_json::json;
use veracity_crypto::{encode_multibase, KeyMaterial, KeyType};

use crate::did_resolver::DidResolver;
use crate::document::{DidDocument, DID_CONTEXT};
use crate::error::IdentityError;

const ED25519_2020_CONTEXT: &str = "https://w3id.org/security/suites/ed25519-2020/v1";
const MULTIKEY_CONTEXT: &str = "https://w3id.org/security/multikey/v1";

/// Resolves `did:key` identifiers by expanding the embedded public key.
#[derive(Debug, Default, Clone, Copy)]
pub struct DidKeyResolver;

impl DidKeyResolver {
    pub fn new() -> Self {
        Self
    }

    /// Build the DID document for a `did:key` without any I/O.
    pub fn document_for(did: &str) -> Result<DidDocument, IdentityError> {
        let multibase = did
            .strip_prefix("did:key:")
            .filter(|mb| mb.starts_with('z'))
            .ok_or_else(|| IdentityError::InvalidDid(did.to_string()))?;
        let key = KeyMaterial::from_multibase(multibase, "")?;

        let method_id = format!("{}#{}", did, multibase);
        let (method_type, context) = match key.key_type() {
            KeyType::Ed25519 => ("Ed25519VerificationKey2020", ED25519_2020_CONTEXT),
            KeyType::P256 | KeyType::Secp256k1 => ("Multikey", MULTIKEY_CONTEXT),
            KeyType::X25519 => {
                return Err(IdentityError::InvalidDid(format!(
                    "{} is a key-agreement key and cannot verify signatures",
                    did
                )))
            }
        };

        DidDocument::from_value(json!({
            "@context": [DID_CONTEXT, context],
            "id": did,
            "verificationMethod": [{
                "id": method_id,
                "type": method_type,
                "controller": did,
                "publicKeyMultibase": multibase,
            }],
            "assertionMethod": [method_id],
            "authentication": [method_id],
            "capabilityInvocation": [method_id],
            "capabilityDelegation": [method_id],
        }))
    }
}

#[async_trait]
impl DidResolver for DidKeyResolver {
    fn method(&self) -> &'static str {
        "key"
    }

    async fn resolve(&self, did: &str) -> Result<DidDocument, IdentityError> {
        Self::document_for(did)
    }
}

/// Encode a public key as a `did:key` identifier.
pub fn did_key_from_key(key: &KeyMaterial) -> String {
    let mut bytes = key.key_type().multicodec_prefix().to_vec();
    bytes.extend_from_slice(key.public_key_bytes());
    format!("did:key:{}", encode_multibase(&bytes))
}
