//! Veracity Crypto — key material extraction, signature verification,
//! hashing, and JSON canonicalization.
//!
//! Signature primitives are delegated to `ed25519-dalek` and `p256`; this crate
//! only normalizes the many ways a verification method encodes a public key.

pub mod canonical;
pub mod encoding;
pub mod error;
pub mod hashing;
pub mod keys;
pub mod signing;

pub use canonical::canonicalize;
pub use encoding::{base64url_decode, base64url_encode, decode_multibase, encode_multibase};
pub use error::CryptoError;
pub use hashing::{sha256, sha256_base64url, Hash};
pub use keys::{KeyEncoding, KeyMaterial, KeyType};
pub use signing::verify_signature;
