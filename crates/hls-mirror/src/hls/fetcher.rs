// HLS Segment Fetcher: downloads a single segment to disk with linear-backoff retries.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};
use url::Url;

use crate::hls::HlsMirrorError;
use crate::hls::config::HlsFetcherConfig;
use crate::http::HttpFetcher;
use crate::storage::SegmentStore;

/// One segment to fetch in one cycle.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub url: Url,
    pub destination: PathBuf,
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentOutcome {
    Saved { bytes: usize },
    /// The destination was already on disk, nothing was transferred
    AlreadyPresent,
}

pub struct SegmentFetcher {
    http: Arc<dyn HttpFetcher>,
    store: Arc<dyn SegmentStore>,
    config: HlsFetcherConfig,
}

impl SegmentFetcher {
    pub fn new(
        http: Arc<dyn HttpFetcher>,
        store: Arc<dyn SegmentStore>,
        config: HlsFetcherConfig,
    ) -> Self {
        Self {
            http,
            store,
            config,
        }
    }

    pub fn config(&self) -> &HlsFetcherConfig {
        &self.config
    }

    /// Runs `task` until it succeeds or its attempt budget is spent.
    pub async fn fetch(&self, task: &DownloadTask) -> Result<SegmentOutcome, HlsMirrorError> {
        if self.store.exists(&task.destination).await? {
            debug!(path = %task.destination.display(), "Segment already on disk");
            return Ok(SegmentOutcome::AlreadyPresent);
        }

        let mut last_error = None;
        for attempt in 0..task.max_attempts {
            match self.try_once(task).await {
                Ok(bytes) => return Ok(SegmentOutcome::Saved { bytes }),
                Err(e) => {
                    warn!(
                        url = %task.url,
                        attempt = attempt + 1,
                        max_attempts = task.max_attempts,
                        error = %e,
                        "Segment download attempt failed"
                    );
                    last_error = Some(e);
                }
            }

            if attempt + 1 < task.max_attempts {
                tokio::time::sleep(self.config.retry_delay(attempt)).await;
            }
        }

        Err(HlsMirrorError::ExhaustedRetries {
            url: task.url.to_string(),
            attempts: task.max_attempts,
            last_error: Box::new(last_error.unwrap_or_else(|| {
                HlsMirrorError::ConfigError("no download attempts allowed".to_string())
            })),
        })
    }

    async fn try_once(&self, task: &DownloadTask) -> Result<usize, HlsMirrorError> {
        let body = self.http.get(&task.url).await?;
        let len = body.len();
        self.store.write(&task.destination, body).await?;
        Ok(len)
    }
}
