use futures::future::select_ok;
use futures::FutureExt;
use std::sync::Arc;

use crate::error::NetworkError;
use crate::fetch::{FetchedResource, Fetcher};

const IPFS_SCHEME: &str = "ipfs://";

/// Whether `uri` uses the `ipfs://` scheme.
pub fn is_ipfs_uri(uri: &str) -> bool {
    uri.starts_with(IPFS_SCHEME)
}

/// Fetches `ipfs://` content by racing a set of HTTP gateways.
///
/// The first gateway to answer successfully wins. The remaining requests
/// are dropped, which cancels them.
#[derive(Clone)]
pub struct IpfsGateways {
    gateways: Vec<String>,
    fetcher: Arc<dyn Fetcher>,
}

impl IpfsGateways {
    /// Each gateway is a URL prefix the content path is appended to,
    /// e.g. `https://ipfs.io/ipfs/`.
    pub fn new(gateways: Vec<String>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { gateways, fetcher }
    }

    pub fn gateways(&self) -> &[String] {
        &self.gateways
    }

    /// Gateway URL for `uri` on `gateway`.
    pub fn gateway_url(gateway: &str, uri: &str) -> String {
        let content_path = uri.strip_prefix(IPFS_SCHEME).unwrap_or(uri);
        if gateway.ends_with('/') {
            format!("{}{}", gateway, content_path)
        } else {
            format!("{}/{}", gateway, content_path)
        }
    }

    /// Fetch `uri` from whichever gateway responds first.
    pub async fn fetch(&self, uri: &str, accept: &str) -> Result<FetchedResource, NetworkError> {
        if self.gateways.is_empty() {
            return Err(NetworkError::IpfsUnavailable);
        }

        let attempts = self.gateways.iter().map(|gateway| {
            let url = Self::gateway_url(gateway, uri);
            let fetcher = Arc::clone(&self.fetcher);
            let accept = accept.to_string();
            async move {
                let result = fetcher.get(&url, &accept).await;
                if let Err(ref e) = result {
                    tracing::debug!(%url, error = %e, "IPFS gateway failed");
                }
                result
            }
            .boxed()
        });

        match select_ok(attempts).await {
            Ok((resource, _pending)) => Ok(resource),
            Err(_) => {
                tracing::warn!(%uri, "all IPFS gateways failed");
                Err(NetworkError::IpfsUnavailable)
            }
        }
    }
}

impl std::fmt::Debug for IpfsGateways {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpfsGateways")
            .field("gateways", &self.gateways)
            .finish()
    }
}
