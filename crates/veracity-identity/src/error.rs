use veracity_core::VerificationError;

/// DID resolution errors.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid DID: {0}")]
    InvalidDid(String),

    #[error("DID method not supported: {0}")]
    MethodNotSupported(String),

    #[error("DID not found: {0}")]
    NotFound(String),

    #[error("invalid DID document: {0}")]
    InvalidDocument(String),

    #[error("network error: {0}")]
    Network(#[from] veracity_network::NetworkError),

    #[error("crypto error: {0}")]
    Crypto(#[from] veracity_crypto::CryptoError),
}

impl From<IdentityError> for VerificationError {
    fn from(err: IdentityError) -> Self {
        VerificationError::Resolution(err.to_string())
    }
}
