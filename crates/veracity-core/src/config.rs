use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Full configuration for the verification engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VerifierConfig {
    /// Remote document fetching.
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Resolution cache lifetimes.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Status-list checking.
    #[serde(default)]
    pub status: StatusConfig,

    /// Per-item verification limits.
    #[serde(default)]
    pub verification: VerificationConfig,

    /// JSON schema cache consulted by external rule engines.
    #[serde(default)]
    pub schemas: SchemaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// IPFS gateways raced for `ipfs://` URIs. Each is a prefix the CID is appended to.
    #[serde(default = "default_ipfs_gateways")]
    pub ipfs_gateways: Vec<String>,
    /// Timeout for a single HTTP fetch, in seconds.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// User-Agent header sent with every fetch.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of a TTL cache entry, in seconds.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Interval between expiry sweeps, in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    /// Require the status-list credential to share the credential's issuer.
    #[serde(default = "default_true")]
    pub verify_matching_issuers: bool,
    /// Maximum nesting of status-list credential verification.
    #[serde(default = "default_max_recursion_depth")]
    pub max_recursion_depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Deadline for verifying one batch item, in seconds.
    #[serde(default = "default_item_timeout_secs")]
    pub item_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SchemaConfig {
    /// Directory of additional `*.json` schemas loaded at startup.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

// Default value functions
fn default_ipfs_gateways() -> Vec<String> {
    vec![
        "https://ipfs.io/ipfs/".into(),
        "https://dweb.link/ipfs/".into(),
        "https://cloudflare-ipfs.com/ipfs/".into(),
    ]
}
fn default_fetch_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    concat!("veracity/", env!("CARGO_PKG_VERSION")).into()
}
fn default_ttl_secs() -> u64 {
    60 * 60
}
fn default_sweep_interval_secs() -> u64 {
    5 * 60
}
fn default_true() -> bool {
    true
}
fn default_max_recursion_depth() -> usize {
    4
}
fn default_item_timeout_secs() -> u64 {
    120
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            ipfs_gateways: default_ipfs_gateways(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            verify_matching_issuers: true,
            max_recursion_depth: default_max_recursion_depth(),
        }
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            item_timeout_secs: default_item_timeout_secs(),
        }
    }
}

impl LoaderConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl VerificationConfig {
    pub fn item_timeout(&self) -> Duration {
        Duration::from_secs(self.item_timeout_secs)
    }
}
