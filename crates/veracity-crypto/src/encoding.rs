use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;

use crate::error::CryptoError;

/// Decode base64url, tolerating trailing padding.
pub fn base64url_decode(input: &str) -> Result<Vec<u8>, CryptoError> {
    URL_SAFE_NO_PAD
        .decode(input.trim_end_matches('='))
        .map_err(|e| CryptoError::InvalidInput(format!("invalid base64url: {}", e)))
}

/// Encode as unpadded base64url.
pub fn base64url_encode(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

/// Decode standard base64, falling back to base64url.
pub fn base64_decode(input: &str) -> Result<Vec<u8>, CryptoError> {
    STANDARD
        .decode(input)
        .or_else(|_| base64url_decode(input))
        .map_err(|e| CryptoError::InvalidInput(format!("invalid base64: {}", e)))
}

/// Decode a multibase string. Supports base58btc (`z`) and base64url (`u`).
pub fn decode_multibase(input: &str) -> Result<Vec<u8>, CryptoError> {
    let mut chars = input.chars();
    match chars.next() {
        Some('z') => bs58::decode(chars.as_str())
            .into_vec()
            .map_err(|e| CryptoError::InvalidInput(format!("invalid base58btc: {}", e))),
        Some('u') => base64url_decode(chars.as_str()),
        Some(prefix) => Err(CryptoError::UnsupportedEncoding(format!(
            "multibase prefix '{}'",
            prefix
        ))),
        None => Err(CryptoError::InvalidInput("empty multibase string".into())),
    }
}

/// Encode bytes as base58btc multibase (`z` prefix).
pub fn encode_multibase(input: &[u8]) -> String {
    format!("z{}", bs58::encode(input).into_string())
}
