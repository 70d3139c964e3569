use veracity_core::VerificationError;

/// Credential verification errors.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("token verification failed: {0}")]
    TokenSignature(String),

    #[error("unsupported proof suite: {0}")]
    UnsupportedSuite(String),

    #[error("proof rejected: {0}")]
    ProofRejected(String),

    #[error("missing proof: {0}")]
    MissingProof(String),

    #[error("proof purpose mismatch: {0}")]
    ProofPurpose(String),

    #[error("challenge mismatch: {0}")]
    Challenge(String),

    #[error("domain mismatch: {0}")]
    Domain(String),

    #[error("credential not valid at this time: {0}")]
    Validity(String),

    #[error("invalid disclosure: {0}")]
    Disclosure(String),

    #[error("key binding failed: {0}")]
    KeyBinding(String),

    #[error("issuer key unavailable: {0}")]
    IssuerKey(String),

    #[error("schema not found: {0}")]
    SchemaNotFound(String),

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("status error: {0}")]
    Status(#[from] StatusError),

    #[error("crypto error: {0}")]
    Crypto(#[from] veracity_crypto::CryptoError),

    #[error("{0}")]
    Loader(#[from] veracity_loader::LoaderError),

    #[error("identity error: {0}")]
    Identity(#[from] veracity_identity::IdentityError),
}

/// Status-list checking errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusError {
    #[error("credential has no status entries")]
    NoEntries,

    #[error("unknown status entry type: {0}")]
    UnknownType(String),

    #[error("invalid status entry: {0}")]
    InvalidEntry(String),

    #[error("status list credential {uri} could not be loaded: {reason}")]
    ListUnavailable { uri: String, reason: String },

    #[error("status list credential {uri} failed verification: {reason}")]
    ListVerification { uri: String, reason: String },

    #[error("invalid status list credential: {0}")]
    InvalidList(String),

    #[error("status purpose mismatch: entry has '{entry}', list has '{list}'")]
    PurposeMismatch { entry: String, list: String },

    #[error("issuer mismatch: credential issued by '{credential}', status list by '{list}'")]
    IssuerMismatch { credential: String, list: String },

    #[error("status list index {index} out of range for list of {len} entries")]
    IndexOutOfRange { index: u64, len: u64 },

    #[error("status list credential {0} is already being verified")]
    Cycle(String),

    #[error("status list nesting exceeds {0} levels")]
    DepthExceeded(usize),
}

impl From<CredentialError> for VerificationError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Loader(e) => e.into(),
            CredentialError::Identity(e) => e.into(),
            CredentialError::MalformedToken(_)
            | CredentialError::TokenSignature(_)
            | CredentialError::UnsupportedSuite(_)
            | CredentialError::ProofRejected(_)
            | CredentialError::Crypto(_) => VerificationError::Cryptographic(err.to_string()),
            CredentialError::IssuerKey(_) => VerificationError::Resolution(err.to_string()),
            other => VerificationError::Validation(other.to_string()),
        }
    }
}

impl From<StatusError> for VerificationError {
    fn from(err: StatusError) -> Self {
        VerificationError::Validation(err.to_string())
    }
}
