use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};

use crate::proxy::ProxyConfig;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// HTTP options shared by playlist and segment requests
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Overall timeout for a single request, zero disables it
    pub timeout: Duration,

    /// Connection timeout (time to establish initial connection)
    pub connect_timeout: Duration,

    /// Idle timeout for pooled connections
    pub read_timeout: Duration,

    /// Whether to follow redirects
    pub follow_redirects: bool,

    /// User agent string
    pub user_agent: String,

    /// Headers sent with every request
    pub headers: HeaderMap,

    /// Proxy configuration (optional)
    pub proxy: Option<ProxyConfig>,

    /// Whether to use system proxy settings if available
    pub use_system_proxy: bool,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::ZERO,
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            follow_redirects: true,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: DownloaderConfig::get_default_headers(),
            proxy: None,
            use_system_proxy: true,
        }
    }
}

impl DownloaderConfig {
    pub fn builder() -> crate::builder::DownloaderConfigBuilder {
        crate::builder::DownloaderConfigBuilder::new()
    }

    /// Merge custom headers over the defaults, custom values win.
    pub fn merge_headers(&mut self, custom: &HeaderMap) {
        for (name, value) in custom.iter() {
            self.headers.insert(name.clone(), value.clone());
        }
    }

    pub fn get_default_headers() -> HeaderMap {
        let mut default_headers = HeaderMap::new();

        default_headers.insert(
            reqwest::header::CONNECTION,
            HeaderValue::from_static("keep-alive"),
        );

        default_headers.insert(reqwest::header::ACCEPT, HeaderValue::from_static("*/*"));

        default_headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_headers_override_defaults() {
        let mut config = DownloaderConfig::default();
        let mut custom = HeaderMap::new();
        custom.insert(reqwest::header::ACCEPT, HeaderValue::from_static("application/vnd.apple.mpegurl"));
        custom.insert("x-token", HeaderValue::from_static("abc"));

        config.merge_headers(&custom);

        assert_eq!(
            config.headers.get(reqwest::header::ACCEPT).unwrap(),
            "application/vnd.apple.mpegurl"
        );
        assert_eq!(config.headers.get("x-token").unwrap(), "abc");
        assert!(config.headers.contains_key(reqwest::header::CONNECTION));
    }
}
