use veracity_core::VerificationError;

/// Document loading errors.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// The DID document has no method matching the URL fragment.
    #[error("unknown verification method: {0}")]
    UnknownVerificationMethod(String),

    #[error("DID resolution failed: {0}")]
    Resolution(#[from] veracity_identity::IdentityError),

    #[error("{0}")]
    Network(#[from] veracity_network::NetworkError),

    #[error("document at {url} is not JSON: {reason}")]
    InvalidDocument { url: String, reason: String },
}

impl From<LoaderError> for VerificationError {
    fn from(err: LoaderError) -> Self {
        match err {
            LoaderError::UnknownVerificationMethod(_) => {
                VerificationError::Validation(err.to_string())
            }
            other => VerificationError::Resolution(other.to_string()),
        }
    }
}
