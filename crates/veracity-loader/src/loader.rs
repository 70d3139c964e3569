use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use veracity_core::VerifierConfig;
use veracity_identity::{split_did_url, DidDocument, DidResolverRegistry};
use veracity_network::{
    is_ipfs_uri, ContextCache, FetchedResource, Fetcher, HttpFetcher, IpfsGateways, TtlCache,
};

use crate::contexts::bundled_contexts;
use crate::error::LoaderError;

/// `Accept` header for every non-DID fetch.
pub const DOCUMENT_ACCEPT: &str = "application/ld+json, application/json";

/// A dereferenced document.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocument {
    /// JSON document, or a JSON string when the body was a compact token.
    pub document: Value,
    pub document_url: String,
    pub context_url: Option<String>,
}

impl RemoteDocument {
    fn new(document: Value, document_url: impl Into<String>) -> Self {
        Self {
            document,
            document_url: document_url.into(),
            context_url: None,
        }
    }
}

/// Dereferences DID URLs, contexts, status lists, and issuer metadata.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self, uri: &str) -> Result<RemoteDocument, LoaderError>;

    /// Resolve a bare DID to its document.
    async fn resolve_did(&self, did: &str) -> Result<DidDocument, LoaderError>;
}

/// Loader backed by the DID registry, a context cache, HTTP and IPFS.
pub struct DefaultDocumentLoader {
    fetcher: Arc<dyn Fetcher>,
    registry: Arc<DidResolverRegistry>,
    contexts: ContextCache,
    ipfs: IpfsGateways,
    web_cache: Option<Arc<TtlCache<String, DidDocument>>>,
}

impl DefaultDocumentLoader {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        registry: Arc<DidResolverRegistry>,
        contexts: ContextCache,
        ipfs_gateways: Vec<String>,
    ) -> Self {
        let ipfs = IpfsGateways::new(ipfs_gateways, Arc::clone(&fetcher));
        Self {
            fetcher,
            registry,
            contexts,
            ipfs,
            web_cache: None,
        }
    }

    /// Build the standard loader: HTTP fetcher, `web`/`key`/`jwk` resolvers,
    /// and a context cache seeded with the bundled contexts.
    pub fn from_config(config: &VerifierConfig) -> Result<Self, LoaderError> {
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&config.loader)?);
        let web_cache = Arc::new(TtlCache::new(
            config.cache.ttl(),
            config.cache.sweep_interval(),
        ));
        let registry = Arc::new(DidResolverRegistry::standard(
            Arc::clone(&fetcher),
            Arc::clone(&web_cache),
        ));

        let mut loader = Self::new(
            fetcher,
            registry,
            ContextCache::seeded(bundled_contexts()),
            config.loader.ipfs_gateways.clone(),
        );
        loader.web_cache = Some(web_cache);
        Ok(loader)
    }

    pub fn registry(&self) -> &Arc<DidResolverRegistry> {
        &self.registry
    }

    pub fn contexts(&self) -> &ContextCache {
        &self.contexts
    }

    /// Start background expiry of cached DID documents.
    pub fn start(&self) {
        if let Some(cache) = &self.web_cache {
            cache.start();
        }
    }

    pub fn stop(&self) {
        if let Some(cache) = &self.web_cache {
            cache.stop();
        }
    }

    async fn load_did_url(&self, uri: &str) -> Result<RemoteDocument, LoaderError> {
        let (did, fragment) = split_did_url(uri);
        let document = self.registry.resolve_document(did).await?;

        if fragment.is_none() {
            return Ok(RemoteDocument::new(document.into_value(), uri));
        }

        let mut method = document
            .find_method(uri)
            .cloned()
            .ok_or_else(|| LoaderError::UnknownVerificationMethod(uri.to_string()))?;
        if let Some(obj) = method.as_object_mut() {
            if !obj.contains_key("@context") {
                if let Some(context) = document.context() {
                    obj.insert("@context".into(), context.clone());
                }
            }
            if let Some(Value::String(id)) = obj.get_mut("id") {
                if id.starts_with('#') {
                    *id = format!("{}{}", did, id);
                }
            }
        }
        Ok(RemoteDocument::new(method, uri))
    }

    async fn fetch(&self, uri: &str) -> Result<FetchedResource, LoaderError> {
        let resource = if is_ipfs_uri(uri) {
            self.ipfs.fetch(uri, DOCUMENT_ACCEPT).await?
        } else {
            self.fetcher.get(uri, DOCUMENT_ACCEPT).await?
        };

        if resource.content_type.as_deref() != Some("application/ld+json") {
            if let Some(alternate) = resource.alternate_link() {
                tracing::debug!(%uri, %alternate, "following JSON-LD alternate link");
                return Ok(self.fetcher.get(&alternate, DOCUMENT_ACCEPT).await?);
            }
        }
        Ok(resource)
    }
}

#[async_trait]
impl DocumentLoader for DefaultDocumentLoader {
    async fn load(&self, uri: &str) -> Result<RemoteDocument, LoaderError> {
        if uri.starts_with("did:") {
            return self.load_did_url(uri).await;
        }

        if let Some(document) = self.contexts.get(uri) {
            tracing::trace!(%uri, "document cache hit");
            return Ok(RemoteDocument::new(document, uri));
        }

        let resource = self.fetch(uri).await?;
        let document = parse_body(&resource)?;
        self.contexts.insert(uri, document.clone());

        Ok(RemoteDocument {
            document,
            document_url: resource.url,
            context_url: None,
        })
    }

    async fn resolve_did(&self, did: &str) -> Result<DidDocument, LoaderError> {
        Ok(self.registry.resolve_document(did).await?)
    }
}

/// JSON body, or a compact JWT / SD-JWT returned as a JSON string.
fn parse_body(resource: &FetchedResource) -> Result<Value, LoaderError> {
    let invalid = |reason: String| LoaderError::InvalidDocument {
        url: resource.url.clone(),
        reason,
    };
    let text = resource.text().map_err(|e| invalid(e.to_string()))?.trim();

    if looks_like_compact_token(text) {
        return Ok(Value::String(text.to_string()));
    }
    serde_json::from_str(text).map_err(|e| invalid(e.to_string()))
}

fn looks_like_compact_token(text: &str) -> bool {
    let jws = text.split('~').next().unwrap_or_default();
    jws.split('.').count() == 3
        && jws
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
