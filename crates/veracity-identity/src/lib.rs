//! Veracity Identity — DID resolution for credential verification.
//!
//! Resolves `did:web`, `did:key`, and `did:jwk` identifiers to DID documents
//! through a method-keyed [`DidResolverRegistry`]. Resolution failures are
//! reported as resolution metadata, never as errors.

pub mod did_jwk;
pub mod did_key;
pub mod did_resolver;
pub mod did_web;
pub mod document;
pub mod error;

pub use did_jwk::DidJwkResolver;
pub use did_key::{did_key_from_key, DidKeyResolver};
pub use did_resolver::{
    DidResolutionMetadata, DidResolutionResult, DidResolver, DidResolverRegistry,
};
pub use did_web::{did_web_url, DidWebResolver};
pub use document::{did_method, split_did_url, DidDocument};
pub use error::IdentityError;
