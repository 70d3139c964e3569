//! Key material extraction from verification methods.
//!
//! A verification method may carry its public key as `publicKeyJwk`,
//! `publicKeyMultibase`, `publicKeyBase58`, or `publicKeyBase64`. All of them
//! are normalized into one [`KeyMaterial`] value. Extraction is pure: no I/O.

use serde_json::Value;
use std::fmt;

use crate::encoding::{base64_decode, base64url_decode, base64url_encode, decode_multibase};
use crate::error::CryptoError;

/// Multicodec varint prefixes of public keys.
const MULTICODEC_ED25519: [u8; 2] = [0xed, 0x01];
const MULTICODEC_X25519: [u8; 2] = [0xec, 0x01];
const MULTICODEC_SECP256K1: [u8; 2] = [0xe7, 0x01];
const MULTICODEC_P256: [u8; 2] = [0x80, 0x24];

/// Public key algorithm family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    Ed25519,
    X25519,
    P256,
    Secp256k1,
}

impl KeyType {
    /// JWS `alg` used with this key type, if it can sign.
    pub fn jws_algorithm(&self) -> Option<&'static str> {
        match self {
            Self::Ed25519 => Some("EdDSA"),
            Self::P256 => Some("ES256"),
            Self::Secp256k1 => Some("ES256K"),
            Self::X25519 => None,
        }
    }

    /// Multicodec prefix for `did:key` / `Multikey` encodings.
    pub fn multicodec_prefix(&self) -> [u8; 2] {
        match self {
            Self::Ed25519 => MULTICODEC_ED25519,
            Self::X25519 => MULTICODEC_X25519,
            Self::P256 => MULTICODEC_P256,
            Self::Secp256k1 => MULTICODEC_SECP256K1,
        }
    }

    fn from_multicodec(prefix: &[u8]) -> Option<Self> {
        match prefix {
            p if p == MULTICODEC_ED25519 => Some(Self::Ed25519),
            p if p == MULTICODEC_X25519 => Some(Self::X25519),
            p if p == MULTICODEC_P256 => Some(Self::P256),
            p if p == MULTICODEC_SECP256K1 => Some(Self::Secp256k1),
            _ => None,
        }
    }

    /// Infer the key type from a verification method `type` label.
    fn from_method_type(method_type: &str) -> Option<Self> {
        if method_type.contains("Ed25519") {
            Some(Self::Ed25519)
        } else if method_type.contains("X25519") {
            Some(Self::X25519)
        } else if method_type.contains("Secp256k1") {
            Some(Self::Secp256k1)
        } else if method_type.contains("Secp256r1") || method_type.contains("P256") {
            Some(Self::P256)
        } else {
            None
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ed25519 => write!(f, "Ed25519"),
            Self::X25519 => write!(f, "X25519"),
            Self::P256 => write!(f, "P-256"),
            Self::Secp256k1 => write!(f, "secp256k1"),
        }
    }
}

/// Which verification-method field the key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEncoding {
    Jwk,
    Multibase,
    Base58,
    Base64,
}

/// Raw public key bytes with their inferred type.
///
/// Ed25519/X25519 keys are 32 raw bytes; EC keys are SEC1 encoded
/// (33-byte compressed or 65-byte uncompressed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    key_type: KeyType,
    public_key: Vec<u8>,
    encoding: KeyEncoding,
}

impl KeyMaterial {
    /// Build from raw bytes of a known type, checking the length.
    pub fn new(
        key_type: KeyType,
        public_key: Vec<u8>,
        encoding: KeyEncoding,
    ) -> Result<Self, CryptoError> {
        check_length(key_type, &public_key)?;
        Ok(Self {
            key_type,
            public_key,
            encoding,
        })
    }

    /// Extract the key from any supported field of a verification method.
    pub fn from_verification_method(method: &Value) -> Result<Self, CryptoError> {
        let method_type = method.get("type").and_then(Value::as_str).unwrap_or_default();

        if let Some(jwk) = method.get("publicKeyJwk") {
            return Self::from_jwk(jwk);
        }
        if let Some(multibase) = method.get("publicKeyMultibase").and_then(Value::as_str) {
            return Self::from_multibase(multibase, method_type);
        }
        if let Some(b58) = method.get("publicKeyBase58").and_then(Value::as_str) {
            let bytes = bs58::decode(b58)
                .into_vec()
                .map_err(|e| CryptoError::InvalidInput(format!("invalid base58: {}", e)))?;
            return Self::from_raw(bytes, method_type, KeyEncoding::Base58);
        }
        if let Some(b64) = method.get("publicKeyBase64").and_then(Value::as_str) {
            let bytes = base64_decode(b64)?;
            return Self::from_raw(bytes, method_type, KeyEncoding::Base64);
        }

        let id = method.get("id").and_then(Value::as_str).unwrap_or("<anonymous>");
        Err(CryptoError::MissingKeyMaterial(id.to_string()))
    }

    /// Decode a multibase key, honouring a multicodec prefix when present.
    pub fn from_multibase(value: &str, method_type: &str) -> Result<Self, CryptoError> {
        let bytes = decode_multibase(value)?;
        if bytes.len() > 2 {
            if let Some(key_type) = KeyType::from_multicodec(&bytes[..2]) {
                return Self::new(key_type, bytes[2..].to_vec(), KeyEncoding::Multibase);
            }
        }
        Self::from_raw(bytes, method_type, KeyEncoding::Multibase)
    }

    /// Import a public JWK (OKP Ed25519/X25519, EC P-256/secp256k1).
    pub fn from_jwk(jwk: &Value) -> Result<Self, CryptoError> {
        let field = |name: &str| -> Result<Vec<u8>, CryptoError> {
            let value = jwk
                .get(name)
                .and_then(Value::as_str)
                .ok_or_else(|| CryptoError::InvalidJwk(format!("missing '{}'", name)))?;
            base64url_decode(value)
        };
        let kty = jwk
            .get("kty")
            .and_then(Value::as_str)
            .ok_or_else(|| CryptoError::InvalidJwk("missing 'kty'".into()))?;
        let crv = jwk.get("crv").and_then(Value::as_str).unwrap_or_default();

        match (kty, crv) {
            ("OKP", "Ed25519") => Self::new(KeyType::Ed25519, field("x")?, KeyEncoding::Jwk),
            ("OKP", "X25519") => Self::new(KeyType::X25519, field("x")?, KeyEncoding::Jwk),
            ("EC", "P-256") | ("EC", "secp256k1") => {
                let key_type = if crv == "P-256" {
                    KeyType::P256
                } else {
                    KeyType::Secp256k1
                };
                let x = field("x")?;
                let y = field("y")?;
                if x.len() != 32 || y.len() != 32 {
                    return Err(CryptoError::InvalidJwk(format!(
                        "{} coordinates must be 32 bytes",
                        crv
                    )));
                }
                let mut sec1 = Vec::with_capacity(65);
                sec1.push(0x04);
                sec1.extend_from_slice(&x);
                sec1.extend_from_slice(&y);
                Self::new(key_type, sec1, KeyEncoding::Jwk)
            }
            (kty, crv) => Err(CryptoError::UnsupportedKeyType(format!(
                "kty={} crv={}",
                kty, crv
            ))),
        }
    }

    fn from_raw(
        bytes: Vec<u8>,
        method_type: &str,
        encoding: KeyEncoding,
    ) -> Result<Self, CryptoError> {
        let key_type = match KeyType::from_method_type(method_type) {
            Some(key_type) => key_type,
            // Bare 32-byte keys are Ed25519 by convention.
            None if bytes.len() == 32 => KeyType::Ed25519,
            None => {
                return Err(CryptoError::UnsupportedKeyType(format!(
                    "cannot infer key type of {}-byte key for method type '{}'",
                    bytes.len(),
                    method_type
                )))
            }
        };
        Self::new(key_type, bytes, encoding)
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn public_key_bytes(&self) -> &[u8] {
        &self.public_key
    }

    pub fn encoding(&self) -> KeyEncoding {
        self.encoding
    }

    /// Express an Ed25519 key as a public OKP JWK.
    pub fn to_ed25519_jwk(&self) -> Option<Value> {
        (self.key_type == KeyType::Ed25519).then(|| {
            serde_json::json!({
                "kty": "OKP",
                "crv": "Ed25519",
                "x": base64url_encode(&self.public_key),
            })
        })
    }
}

fn check_length(key_type: KeyType, bytes: &[u8]) -> Result<(), CryptoError> {
    match key_type {
        KeyType::Ed25519 | KeyType::X25519 if bytes.len() != 32 => {
            Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: bytes.len(),
            })
        }
        KeyType::P256 | KeyType::Secp256k1 => match (bytes.len(), bytes.first()) {
            (33, Some(0x02 | 0x03)) | (65, Some(0x04)) => Ok(()),
            _ => Err(CryptoError::InvalidKey(format!(
                "{} key is not a SEC1 point ({} bytes)",
                key_type,
                bytes.len()
            ))),
        },
        _ => Ok(()),
    }
}
