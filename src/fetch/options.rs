//! Fetch options and configuration.

use std::time::Duration;

use super::digest::DigestAlgorithm;

/// Gateways tried in order when resolving a content identifier.
pub const DEFAULT_GATEWAYS: &[&str] = &[
    "https://{cid}.ipfs.cf-ipfs.com/",
    "https://{cid}.ipfs.dweb.link/",
];

/// Placeholder replaced by the content identifier in a gateway template.
pub const CID_PLACEHOLDER: &str = "{cid}";

/// Default read size for streaming copies.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Options for resolving and downloading content.
///
/// Owned by value by the fetcher it configures, so one call never sees
/// another caller's changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Gateway URL templates, tried in order
    pub gateways: Vec<String>,

    /// Bytes read per chunk while streaming a body
    pub chunk_size: usize,

    /// Total request timeout (None = wait indefinitely)
    pub timeout: Option<Duration>,

    /// Connection establishment timeout
    pub connect_timeout: Option<Duration>,

    /// Digest used to verify downloads
    pub digest_algorithm: DigestAlgorithm,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Honor HTTP(S)_PROXY environment variables
    pub use_system_proxy: bool,
}

impl FetchOptions {
    /// Create new fetch options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the gateway template list.
    pub fn with_gateways<I, S>(mut self, gateways: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.gateways = gateways.into_iter().map(Into::into).collect();
        self
    }

    /// Set the streaming chunk size in bytes (minimum 1).
    pub fn with_chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes.max(1);
        self
    }

    /// Set the total request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the digest algorithm used for verification.
    pub fn with_digest_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.digest_algorithm = algorithm;
        self
    }

    /// Set the User-Agent header.
    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Connect directly, ignoring proxy environment variables.
    pub fn without_proxy(mut self) -> Self {
        self.use_system_proxy = false;
        self
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            gateways: DEFAULT_GATEWAYS.iter().map(|g| g.to_string()).collect(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            timeout: None,
            connect_timeout: None,
            digest_algorithm: DigestAlgorithm::Md5,
            user_agent: concat!("pdfannotate/", env!("CARGO_PKG_VERSION")).to_string(),
            use_system_proxy: true,
        }
    }
}
