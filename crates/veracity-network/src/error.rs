/// Errors from remote document fetching.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("invalid response body from {url}: {reason}")]
    Body { url: String, reason: String },

    #[error("fetching from IPFS failed")]
    IpfsUnavailable,

    #[error("client setup failed: {0}")]
    Client(String),
}

impl NetworkError {
    /// HTTP status code, when the failure was a non-success response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
