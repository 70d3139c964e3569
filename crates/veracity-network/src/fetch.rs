use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{ACCEPT, CONTENT_TYPE, LINK};
use reqwest::Url;
use serde_json::Value;
use veracity_core::LoaderConfig;

use crate::error::NetworkError;

/// Media type of linked JSON-LD alternates.
const LD_JSON: &str = "application/ld+json";

/// A fetched remote resource.
#[derive(Debug, Clone)]
pub struct FetchedResource {
    /// Final URL after redirects.
    pub url: String,
    /// `Content-Type` header, without parameters.
    pub content_type: Option<String>,
    /// Raw `Link` header.
    pub link: Option<String>,
    pub body: Bytes,
}

impl FetchedResource {
    /// Parse the body as JSON.
    pub fn json(&self) -> Result<Value, NetworkError> {
        serde_json::from_slice(&self.body).map_err(|e| NetworkError::Body {
            url: self.url.clone(),
            reason: e.to_string(),
        })
    }

    /// Body as UTF-8 text.
    pub fn text(&self) -> Result<&str, NetworkError> {
        std::str::from_utf8(&self.body).map_err(|e| NetworkError::Body {
            url: self.url.clone(),
            reason: e.to_string(),
        })
    }

    /// Target of a `Link: <..>; rel="alternate"; type="application/ld+json"`
    /// header, resolved against the resource URL.
    pub fn alternate_link(&self) -> Option<String> {
        let header = self.link.as_deref()?;
        let target = parse_alternate_link(header)?;
        match Url::parse(&self.url).and_then(|base| base.join(&target)) {
            Ok(url) => Some(url.to_string()),
            Err(_) => Some(target),
        }
    }

    /// Whether the server labelled the body as JSON or JSON-LD.
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct == "application/json" || ct.ends_with("+json"))
            .unwrap_or(false)
    }
}

/// Retrieves remote resources by URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` with the given `Accept` header.
    async fn get(&self, url: &str, accept: &str) -> Result<FetchedResource, NetworkError>;
}

/// Fetcher backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &LoaderConfig) -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| NetworkError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str, accept: &str) -> Result<FetchedResource, NetworkError> {
        let parsed = Url::parse(url).map_err(|e| NetworkError::InvalidUrl(format!("{}: {}", url, e)))?;

        tracing::debug!(%url, "fetching remote document");
        let response = self
            .client
            .get(parsed)
            .header(ACCEPT, accept)
            .send()
            .await
            .map_err(|e| NetworkError::Request {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let header = |name: reqwest::header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type = header(CONTENT_TYPE)
            .map(|ct| ct.split(';').next().unwrap_or_default().trim().to_lowercase());
        let link = header(LINK);

        let body = response.bytes().await.map_err(|e| NetworkError::Body {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(FetchedResource {
            url: final_url,
            content_type,
            link,
            body,
        })
    }
}

/// Extract the JSON-LD alternate target from a `Link` header value.
fn parse_alternate_link(header: &str) -> Option<String> {
    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';').map(str::trim);
        let target = parts.next()?.strip_prefix('<')?.strip_suffix('>')?;

        let mut is_alternate = false;
        let mut is_ld = false;
        for param in parts {
            let (key, value) = param.split_once('=')?;
            let value = value.trim().trim_matches('"');
            match key.trim() {
                "rel" => is_alternate = value.split_whitespace().any(|r| r == "alternate"),
                "type" => is_ld = value == LD_JSON,
                _ => {}
            }
        }
        (is_alternate && is_ld).then(|| target.to_string())
    })
}
