//! # Builder for DownloaderConfig
//!
//! Fluent construction of the HTTP options used by the playlist poller and
//! the segment fetcher.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use hls_mirror_engine::DownloaderConfig;
//! use hls_mirror_engine::proxy::{ProxyConfig, ProxyType};
//!
//! let config = DownloaderConfig::builder()
//!     .with_timeout(Duration::from_secs(60))
//!     .with_connect_timeout(Duration::from_secs(15))
//!     .with_user_agent("Recorder/1.0")
//!     .with_header("Referer", "https://example.com/")
//!     .with_follow_redirects(false)
//!     .build();
//! assert!(!config.follow_redirects);
//!
//! let with_proxy = DownloaderConfig::builder()
//!     .with_proxy(ProxyConfig {
//!         url: "http://proxy.example.com:8080".to_string(),
//!         proxy_type: ProxyType::Http,
//!         auth: None,
//!     })
//!     .build();
//! assert!(!with_proxy.use_system_proxy);
//! ```

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};

use crate::{DownloaderConfig, proxy::ProxyConfig};

/// Builder for [`DownloaderConfig`], starting from its defaults
#[derive(Debug, Clone)]
pub struct DownloaderConfigBuilder {
    /// Internal config being built
    config: DownloaderConfig,
}

impl DownloaderConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: DownloaderConfig::default(),
        }
    }

    /// Set the overall timeout for a single HTTP request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the time allowed to establish a connection
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set how long an idle pooled connection is kept
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Set whether HTTP 3xx responses are followed (up to 10 hops)
    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.config.follow_redirects = follow;
        self
    }

    /// Set the User-Agent sent with every request
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Add a custom HTTP header, invalid names or values are ignored
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.as_ref().parse::<reqwest::header::HeaderName>(),
            HeaderValue::from_str(value.as_ref()),
        ) {
            self.config.headers.insert(name, value);
        }
        self
    }

    /// Merge headers over the defaults
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.config.merge_headers(&headers);
        self
    }

    /// Set the proxy configuration, disables the system proxy
    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.config.proxy = Some(proxy);
        self.config.use_system_proxy = false;
        self
    }

    /// Only honoured when no explicit proxy is configured
    pub fn with_system_proxy(mut self, use_system_proxy: bool) -> Self {
        if self.config.proxy.is_none() {
            self.config.use_system_proxy = use_system_proxy;
        }
        self
    }

    /// Build the final DownloaderConfig
    pub fn build(self) -> DownloaderConfig {
        self.config
    }
}

impl Default for DownloaderConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
