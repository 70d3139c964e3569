//! Proof suite selection, and the Data Integrity suites over
//! JCS-canonicalized JSON.
//!
//! `eddsa-jcs-2022` (Ed25519) and `ecdsa-jcs-2019` (P-256) share one hashing
//! scheme: `sha256(JCS(proof config)) || sha256(JCS(unsecured document))`,
//! where the proof config is the proof without `proofValue` carrying the
//! document's `@context`. Suites over RDF-canonicalized data are handed to
//! [`linked_data`](crate::linked_data).

use serde_json::Value;
use veracity_crypto::{
    canonicalize, decode_multibase, sha256, verify_signature, CryptoError, KeyMaterial, KeyType,
};

use crate::error::CredentialError;

pub const DATA_INTEGRITY_PROOF: &str = "DataIntegrityProof";
pub const EDDSA_JCS_2022: &str = "eddsa-jcs-2022";
pub const ECDSA_JCS_2019: &str = "ecdsa-jcs-2019";

/// Legacy Linked Data proof types.
const LINKED_DATA_PROOF_TYPES: [&str; 5] = [
    "Ed25519Signature2018",
    "Ed25519Signature2020",
    "JsonWebSignature2020",
    "EcdsaSecp256k1Signature2019",
    "RsaSignature2018",
];

/// `DataIntegrityProof` cryptosuites over RDF-canonicalized data.
const LINKED_DATA_CRYPTOSUITES: [&str; 3] = ["eddsa-rdfc-2022", "ecdsa-rdfc-2019", "ecdsa-sd-2023"];

/// A supported cryptosuite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cryptosuite {
    EddsaJcs2022,
    EcdsaJcs2019,
    /// Verified by the `ssi` suite registry; holds the proof type or
    /// cryptosuite name.
    LinkedData(&'static str),
}

impl Cryptosuite {
    /// Select the suite named by a proof, or fail naming what was found.
    pub fn for_proof(proof: &Value) -> Result<Self, CredentialError> {
        let proof_type = proof.get("type").and_then(Value::as_str).unwrap_or_default();
        let suite = proof.get("cryptosuite").and_then(Value::as_str);
        match (proof_type, suite) {
            (DATA_INTEGRITY_PROOF, Some(EDDSA_JCS_2022)) => Ok(Self::EddsaJcs2022),
            (DATA_INTEGRITY_PROOF, Some(ECDSA_JCS_2019)) => Ok(Self::EcdsaJcs2019),
            (DATA_INTEGRITY_PROOF, Some(other)) => LINKED_DATA_CRYPTOSUITES
                .into_iter()
                .find(|name| *name == other)
                .map(Self::LinkedData)
                .ok_or_else(|| {
                    CredentialError::UnsupportedSuite(format!("{}/{}", proof_type, other))
                }),
            (DATA_INTEGRITY_PROOF, None) => Err(CredentialError::UnsupportedSuite(
                "DataIntegrityProof without cryptosuite".into(),
            )),
            ("", _) => Err(CredentialError::UnsupportedSuite("proof has no type".into())),
            (other, _) => LINKED_DATA_PROOF_TYPES
                .into_iter()
                .find(|name| *name == other)
                .map(Self::LinkedData)
                .ok_or_else(|| CredentialError::UnsupportedSuite(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::EddsaJcs2022 => EDDSA_JCS_2022,
            Self::EcdsaJcs2019 => ECDSA_JCS_2019,
            Self::LinkedData(name) => name,
        }
    }

    /// Key type a JCS suite signs with; `None` for linked-data suites.
    pub fn key_type(&self) -> Option<KeyType> {
        match self {
            Self::EddsaJcs2022 => Some(KeyType::Ed25519),
            Self::EcdsaJcs2019 => Some(KeyType::P256),
            Self::LinkedData(_) => None,
        }
    }
}

/// The proofs of a secured document, one or many.
pub fn proofs(document: &Value) -> Vec<Value> {
    match document.get("proof") {
        Some(Value::Array(items)) => items.clone(),
        Some(proof @ Value::Object(_)) => vec![proof.clone()],
        _ => Vec::new(),
    }
}

/// The document with its `proof` removed.
pub fn unsecured(document: &Value) -> Value {
    let mut doc = document.clone();
    if let Some(obj) = doc.as_object_mut() {
        obj.remove("proof");
    }
    doc
}

/// The bytes a Data Integrity JCS proof signs.
pub fn hash_data(document: &Value, proof: &Value) -> Result<Vec<u8>, CredentialError> {
    let mut config = proof.clone();
    if let Some(obj) = config.as_object_mut() {
        obj.remove("proofValue");
        if let Some(context) = document.get("@context") {
            obj.insert("@context".into(), context.clone());
        }
    }

    let mut out = Vec::with_capacity(64);
    out.extend_from_slice(&sha256(&canonicalize(&config)?));
    out.extend_from_slice(&sha256(&canonicalize(&unsecured(document))?));
    Ok(out)
}

/// Verify one proof over `document` with `key`.
pub fn verify_proof(
    document: &Value,
    proof: &Value,
    key: &KeyMaterial,
) -> Result<(), CredentialError> {
    let suite = Cryptosuite::for_proof(proof)?;
    let Some(expected) = suite.key_type() else {
        return Err(CredentialError::UnsupportedSuite(format!(
            "{} is not a JCS suite",
            suite.name()
        )));
    };
    if key.key_type() != expected {
        return Err(CredentialError::UnsupportedSuite(format!(
            "{} requires a {} key, got {}",
            suite.name(),
            expected,
            key.key_type()
        )));
    }

    let proof_value = proof
        .get("proofValue")
        .and_then(Value::as_str)
        .ok_or_else(|| CredentialError::MissingProof("proof has no proofValue".into()))?;
    if !proof_value.starts_with('z') {
        return Err(CryptoError::UnsupportedEncoding(
            "proofValue must be base58btc multibase".into(),
        )
        .into());
    }
    let signature = decode_multibase(proof_value)?;
    let data = hash_data(document, proof)?;

    verify_signature(key, &data, &signature)?;
    tracing::trace!(suite = suite.name(), "proof verified");
    Ok(())
}
