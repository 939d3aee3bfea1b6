//! HTTP transport settings

use crate::error::Result;
use std::time::Duration;

/// Production API origin
pub const DEFAULT_BASE_URL: &str = "https://api.sextillion.io";

/// Connection pool and timeout settings for the shared HTTP client
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Overall per-request timeout
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub max_idle_per_host: usize,
    pub idle_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            max_idle_per_host: 10,
            idle_timeout: Duration::from_secs(60),
        }
    }
}

impl TransportConfig {
    /// Build the pooled client. Compression stays off (reqwest is built
    /// without gzip) and TLS uses rustls with the bundled roots.
    pub fn build(&self) -> Result<reqwest::Client> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .pool_max_idle_per_host(self.max_idle_per_host)
            .pool_idle_timeout(self.idle_timeout)
            .use_rustls_tls()
            .user_agent(concat!("sxtln/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(client)
    }
}
