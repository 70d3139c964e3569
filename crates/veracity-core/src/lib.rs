//! Veracity Core — Fundamental types, the verification error taxonomy, and
//! configuration for the Veracity credential verifier.

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    CacheConfig, LoaderConfig, SchemaConfig, StatusConfig, VerificationConfig, VerifierConfig,
};
pub use error::{ErrorReport, VerificationError};
pub use types::{
    classify, issuer_id, type_labels, ProofResult, StatusEntryResult, StatusResult, StatusScheme,
    VerifiableInput, VerificationResult, VerifyOptions,
};
