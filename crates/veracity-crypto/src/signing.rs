use ed25519_dalek::Verifier as _;
use p256::ecdsa::signature::Verifier as _;

use crate::error::CryptoError;
use crate::keys::{KeyMaterial, KeyType};

/// Verify a raw signature over `message` with the given public key.
///
/// Ed25519 signatures are 64 bytes. P-256 signatures must be the raw
/// `r || s` form (64 bytes); DER is not accepted.
pub fn verify_signature(
    key: &KeyMaterial,
    message: &[u8],
    signature: &[u8],
) -> Result<(), CryptoError> {
    let result = match key.key_type() {
        KeyType::Ed25519 => verify_ed25519(key.public_key_bytes(), message, signature),
        KeyType::P256 => verify_p256(key.public_key_bytes(), message, signature),
        other => Err(CryptoError::UnsupportedKeyType(format!(
            "{} signatures are not supported",
            other
        ))),
    };
    if let Err(ref e) = result {
        tracing::debug!(key_type = %key.key_type(), error = %e, "signature check failed");
    }
    result
}

fn verify_ed25519(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
    let key_bytes: [u8; 32] = public_key.try_into().map_err(|_| CryptoError::InvalidKeyLength {
        expected: 32,
        actual: public_key.len(),
    })?;
    let verifying_key = ed25519_dalek::VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    let signature = ed25519_dalek::Signature::from_slice(signature)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;

    verifying_key
        .verify(message, &signature)
        .map_err(|_| CryptoError::SignatureVerificationFailed)
}

fn verify_p256(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
    let verifying_key = p256::ecdsa::VerifyingKey::from_sec1_bytes(public_key)
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    let signature = p256::ecdsa::Signature::from_slice(signature)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;

    verifying_key
        .verify(message, &signature)
        .map_err(|_| CryptoError::SignatureVerificationFailed)
}
