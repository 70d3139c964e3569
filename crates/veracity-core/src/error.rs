use serde::{Deserialize, Serialize};

/// Verification error taxonomy.
///
/// Every failure surfaced in a [`VerificationResult`](crate::VerificationResult)
/// falls into exactly one of these classes. None of them aborts sibling items
/// of a batch; they are recorded on the item that caused them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    /// The input matches no known verifiable shape.
    #[error("classification error: {0}")]
    Classification(String),

    /// A DID or remote document could not be resolved.
    #[error("resolution error: {0}")]
    Resolution(String),

    /// A malformed status entry, missing field, or mismatched issuer/purpose.
    #[error("validation error: {0}")]
    Validation(String),

    /// A signature did not verify or the key encoding is unsupported.
    #[error("cryptographic failure: {0}")]
    Cryptographic(String),

    /// The item did not finish within its deadline.
    #[error("verification timed out after {0}s")]
    Timeout(u64),
}

impl VerificationError {
    /// Stable name of the error class, as reported to callers.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Classification(_) => "ClassificationError",
            Self::Resolution(_) => "ResolutionError",
            Self::Validation(_) => "ValidationError",
            Self::Cryptographic(_) => "CryptographicFailure",
            Self::Timeout(_) => "TimeoutError",
        }
    }

    /// Human-readable message without the class prefix.
    pub fn message(&self) -> String {
        match self {
            Self::Classification(m)
            | Self::Resolution(m)
            | Self::Validation(m)
            | Self::Cryptographic(m) => m.clone(),
            Self::Timeout(secs) => format!("verification did not complete within {}s", secs),
        }
    }

    /// Convert into the serializable report attached to results.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            name: self.name().to_string(),
            message: self.message(),
        }
    }
}

/// Serializable error payload attached to a failed result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Error class (e.g. `ValidationError`).
    pub name: String,
    /// Human-readable reason.
    pub message: String,
}

impl From<VerificationError> for ErrorReport {
    fn from(err: VerificationError) -> Self {
        err.report()
    }
}

impl From<&VerificationError> for ErrorReport {
    fn from(err: &VerificationError) -> Self {
        err.report()
    }
}
