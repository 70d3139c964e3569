//! Veracity Loader — dereferences every URI a verification touches.
//!
//! DID URLs go through the DID resolver registry; everything else is served
//! from the context cache or fetched over HTTP(S) / IPFS and cached.

pub mod contexts;
pub mod error;
pub mod loader;

pub use contexts::bundled_contexts;
pub use error::LoaderError;
pub use loader::{DefaultDocumentLoader, DocumentLoader, RemoteDocument};
