//! Veracity Network — remote document fetching for the verifier.
//!
//! - **HTTP** fetching with content negotiation and `Link` alternates
//! - **IPFS** gateway racing for `ipfs://` URIs
//! - **Caches** for JSON-LD contexts and TTL-bounded resolution results

pub mod cache;
pub mod error;
pub mod fetch;
pub mod ipfs;

pub use cache::{ContextCache, TtlCache};
pub use error::NetworkError;
pub use fetch::{FetchedResource, Fetcher, HttpFetcher};
pub use ipfs::{is_ipfs_uri, IpfsGateways};
