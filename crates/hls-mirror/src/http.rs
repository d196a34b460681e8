use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use rustls::{ClientConfig, crypto::aws_lc_rs};
use rustls_platform_verifier::BuilderVerifierExt;
use std::sync::Arc;
use tracing::{debug, info, trace};
use url::Url;

use crate::hls::HlsMirrorError;
use crate::{DownloadError, DownloaderConfig, proxy::build_proxy_from_config};

/// The only network primitive the engine needs: GET a URL, return its body.
///
/// Any non-2xx status is reported as [`HlsMirrorError::FetchFailure`];
/// transport problems surface as [`HlsMirrorError::NetworkError`].
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn get(&self, url: &Url) -> Result<Bytes, HlsMirrorError>;
}

/// Create a reqwest Client with the provided configuration
pub fn create_client(config: &DownloaderConfig) -> Result<Client, DownloadError> {
    let provider = Arc::new(aws_lc_rs::default_provider());

    let tls_config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_platform_verifier()?
        .with_no_client_auth();

    let mut client_builder = Client::builder()
        .pool_max_idle_per_host(8)
        .user_agent(&config.user_agent)
        .default_headers(config.headers.clone())
        .use_preconfigured_tls(tls_config)
        .redirect(if config.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        });

    if !config.timeout.is_zero() {
        client_builder = client_builder.timeout(config.timeout);
    }

    if !config.connect_timeout.is_zero() {
        client_builder = client_builder.connect_timeout(config.connect_timeout);
    }

    if !config.read_timeout.is_zero() {
        client_builder = client_builder.pool_idle_timeout(config.read_timeout);
    }

    if let Some(proxy_config) = &config.proxy {
        let proxy = build_proxy_from_config(proxy_config).map_err(DownloadError::ProxyError)?;
        client_builder = client_builder.proxy(proxy);
        info!(proxy_url = %proxy_config.url, "Using explicitly configured proxy");
    } else if config.use_system_proxy {
        // reqwest picks up system proxy settings unless no_proxy() is called
        debug!("Using system proxy settings");
    } else {
        client_builder = client_builder.no_proxy();
        debug!("Proxy disabled");
    }

    client_builder.build().map_err(DownloadError::from)
}

/// [`HttpFetcher`] backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &DownloaderConfig) -> Result<Self, DownloadError> {
        Ok(Self::new(create_client(config)?))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &Url) -> Result<Bytes, HlsMirrorError> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HlsMirrorError::FetchFailure {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await?;
        trace!(url = %url, bytes = body.len(), "GET complete");
        Ok(body)
    }
}
