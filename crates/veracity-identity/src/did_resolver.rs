use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use veracity_network::{Fetcher, TtlCache};

use crate::did_jwk::DidJwkResolver;
use crate::did_key::DidKeyResolver;
use crate::did_web::DidWebResolver;
use crate::document::{did_method, split_did_url, DidDocument};
use crate::error::IdentityError;

pub const CONTENT_TYPE_DID_LD_JSON: &str = "application/did+ld+json";
pub const CONTENT_TYPE_DID_JSON: &str = "application/did+json";

/// Trait for resolving DIDs of one method to their documents.
#[async_trait]
pub trait DidResolver: Send + Sync {
    /// DID method this resolver handles (e.g. `web`).
    fn method(&self) -> &'static str;

    /// Resolve a bare DID to its DID Document.
    async fn resolve(&self, did: &str) -> Result<DidDocument, IdentityError>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidResolutionMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Error code: `invalidDid`, `methodNotSupported`, or `notFound`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Outcome of DID resolution. Failures live in the metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidResolutionResult {
    pub did_document: Option<DidDocument>,
    pub did_resolution_metadata: DidResolutionMetadata,
    pub did_document_metadata: Value,
}

impl DidResolutionResult {
    fn resolved(document: DidDocument) -> Self {
        let content_type = if document.has_context() {
            CONTENT_TYPE_DID_LD_JSON
        } else {
            CONTENT_TYPE_DID_JSON
        };
        Self {
            did_document: Some(document),
            did_resolution_metadata: DidResolutionMetadata {
                content_type: Some(content_type.to_string()),
                ..Default::default()
            },
            did_document_metadata: Value::Object(Default::default()),
        }
    }

    fn failed(code: &str, message: impl Into<String>) -> Self {
        Self {
            did_document: None,
            did_resolution_metadata: DidResolutionMetadata {
                content_type: None,
                error: Some(code.to_string()),
                message: Some(message.into()),
            },
            did_document_metadata: Value::Object(Default::default()),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.did_document.is_some()
    }

    /// Convert into the document, or an error carrying the metadata.
    pub fn into_document(self) -> Result<DidDocument, IdentityError> {
        match self.did_document {
            Some(document) => Ok(document),
            None => {
                let meta = self.did_resolution_metadata;
                let message = meta.message.unwrap_or_default();
                Err(match meta.error.as_deref() {
                    Some("methodNotSupported") => IdentityError::MethodNotSupported(message),
                    Some("invalidDid") => IdentityError::InvalidDid(message),
                    _ => IdentityError::NotFound(message),
                })
            }
        }
    }
}

/// Dispatches DIDs to the resolver registered for their method.
#[derive(Default, Clone)]
pub struct DidResolverRegistry {
    resolvers: HashMap<&'static str, Arc<dyn DidResolver>>,
}

impl DidResolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `web`, `key`, and `jwk` methods.
    pub fn standard(
        fetcher: Arc<dyn Fetcher>,
        web_cache: Arc<TtlCache<String, DidDocument>>,
    ) -> Self {
        Self::new()
            .with_resolver(Arc::new(DidWebResolver::new(fetcher, web_cache)))
            .with_resolver(Arc::new(DidKeyResolver::new()))
            .with_resolver(Arc::new(DidJwkResolver::new()))
    }

    /// Register a resolver, replacing any previous one for its method.
    pub fn register(&mut self, resolver: Arc<dyn DidResolver>) {
        self.resolvers.insert(resolver.method(), resolver);
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn DidResolver>) -> Self {
        self.register(resolver);
        self
    }

    /// Registered method names, sorted.
    pub fn methods(&self) -> Vec<&'static str> {
        let mut methods: Vec<_> = self.resolvers.keys().copied().collect();
        methods.sort_unstable();
        methods
    }

    /// Resolve a DID (a fragment, if any, is ignored).
    pub async fn resolve(&self, did: &str) -> DidResolutionResult {
        let (did, _) = split_did_url(did);
        let Some(method) = did_method(did) else {
            return DidResolutionResult::failed("invalidDid", format!("invalid DID: {}", did));
        };
        let Some(resolver) = self.resolvers.get(method) else {
            return DidResolutionResult::failed(
                "methodNotSupported",
                format!("DID method '{}' is not supported", method),
            );
        };

        match resolver.resolve(did).await {
            Ok(document) if document.id() != did => {
                tracing::debug!(%did, document_id = document.id(), "DID document id mismatch");
                DidResolutionResult::failed("notFound", "document id does not match requested did")
            }
            Ok(document) => DidResolutionResult::resolved(document),
            Err(e) => {
                tracing::debug!(%did, error = %e, "DID resolution failed");
                DidResolutionResult::failed("notFound", e.to_string())
            }
        }
    }

    /// Resolve and return the document, or the failure as an error.
    pub async fn resolve_document(&self, did: &str) -> Result<DidDocument, IdentityError> {
        self.resolve(did).await.into_document()
    }
}

impl std::fmt::Debug for DidResolverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DidResolverRegistry")
            .field("methods", &self.methods())
            .finish()
    }
}
