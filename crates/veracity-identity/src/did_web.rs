use async_trait::async_trait;
use std::sync::Arc;
use veracity_network::{Fetcher, TtlCache};

use crate::did_resolver::DidResolver;
use crate::document::DidDocument;
use crate::error::IdentityError;

const DID_WEB_ACCEPT: &str = "application/did+json, application/did+ld+json, application/json";

/// Map a `did:web` to the URL of its DID document.
///
/// `did:web:example.com` → `https://example.com/.well-known/did.json`,
/// `did:web:example.com:user:alice` → `https://example.com/user/alice/did.json`.
/// A percent-encoded colon in the host (`%3A`) separates the port.
pub fn did_web_url(did: &str, scheme: &str) -> Result<String, IdentityError> {
    let specific = did
        .strip_prefix("did:web:")
        .ok_or_else(|| IdentityError::InvalidDid(did.to_string()))?;

    let mut segments = specific.split(':');
    let host = segments
        .next()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| IdentityError::InvalidDid(did.to_string()))?
        .replace("%3A", ":")
        .replace("%3a", ":");
    if host.contains('/') {
        return Err(IdentityError::InvalidDid(format!("{}: host contains a path", did)));
    }

    let path: Vec<&str> = segments.collect();
    if path.iter().any(|s| s.is_empty()) {
        return Err(IdentityError::InvalidDid(format!("{}: empty path segment", did)));
    }

    Ok(if path.is_empty() {
        format!("{}://{}/.well-known/did.json", scheme, host)
    } else {
        format!("{}://{}/{}/did.json", scheme, host, path.join("/"))
    })
}

/// Resolves `did:web` identifiers over HTTPS, caching documents.
pub struct DidWebResolver {
    fetcher: Arc<dyn Fetcher>,
    cache: Arc<TtlCache<String, DidDocument>>,
    scheme: &'static str,
}

impl DidWebResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>, cache: Arc<TtlCache<String, DidDocument>>) -> Self {
        Self {
            fetcher,
            cache,
            scheme: "https",
        }
    }

    /// Resolve over plain HTTP. Only meant for local test servers.
    pub fn insecure(mut self) -> Self {
        self.scheme = "http";
        self
    }

    pub fn cache(&self) -> &Arc<TtlCache<String, DidDocument>> {
        &self.cache
    }
}

#[async_trait]
impl DidResolver for DidWebResolver {
    fn method(&self) -> &'static str {
        "web"
    }

    async fn resolve(&self, did: &str) -> Result<DidDocument, IdentityError> {
        if let Some(document) = self.cache.get(&did.to_string()) {
            tracing::trace!(%did, "did:web cache hit");
            return Ok(document);
        }

        let url = did_web_url(did, self.scheme)?;
        tracing::debug!(%did, %url, "resolving did:web");
        let resource = self.fetcher.get(&url, DID_WEB_ACCEPT).await?;
        let document = DidDocument::from_value(resource.json()?)?;

        self.cache.insert(did.to_string(), document.clone());
        Ok(document)
    }
}
