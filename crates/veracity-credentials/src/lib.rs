//! Veracity Credentials — Verification dispatcher, JWT and SD-JWT tokens,
//! Data Integrity and Linked Data suites, status lists, and the external rule-engine hooks.

pub mod dispatcher;
pub mod error;
pub mod external;
pub mod linked_data;
pub mod schema;
pub mod sd_jwt;
pub mod status;
pub mod status_list;
pub mod suite;
pub mod token;

pub use dispatcher::{check_validity, Verifier};
pub use error::{CredentialError, StatusError};
pub use external::ExternalHooks;
pub use schema::SchemaCache;
pub use sd_jwt::{SdJwt, SdJwtVerifier};
pub use status::{StatusListVerifier, VerificationContext, VerifyCredential};
pub use status_list::StatusList;
pub use suite::Cryptosuite;
pub use token::{DecodedToken, TokenVerification};
