use sha2::{Digest, Sha256};

use crate::encoding::base64url_encode;

/// SHA-256 digest (32 bytes).
pub type Hash = [u8; 32];

/// Hash arbitrary data using SHA-256.
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// SHA-256 digest encoded as unpadded base64url, as used by SD-JWT.
pub fn sha256_base64url(data: &[u8]) -> String {
    base64url_encode(&sha256(data))
}
