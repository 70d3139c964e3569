/// Cryptographic operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid public key: {0}")]
    InvalidKey(String),

    #[error("invalid JWK: {0}")]
    InvalidJwk(String),

    #[error("verification method {0} carries no supported public key field")]
    MissingKeyMaterial(String),

    #[error("unsupported key encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(String),

    #[error("invalid signature encoding: {0}")]
    InvalidSignature(String),

    #[error("signature verification failed")]
    SignatureVerificationFailed,

    #[error("canonicalization failed: {0}")]
    Canonicalization(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}
