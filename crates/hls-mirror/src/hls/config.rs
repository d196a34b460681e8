use std::path::PathBuf;
use std::time::Duration;

use crate::DownloaderConfig;
use crate::hls::HlsMirrorError;

// --- Top-Level Configuration ---
#[derive(Debug, Clone, Default)]
pub struct HlsConfig {
    /// HTTP client configuration
    pub base: DownloaderConfig,
    pub playlist_config: HlsPlaylistConfig,
    pub scheduler_config: HlsSchedulerConfig,
    pub fetcher_config: HlsFetcherConfig,
    pub output_config: HlsOutputConfig,
}

impl HlsConfig {
    pub fn builder() -> HlsConfigBuilder {
        HlsConfigBuilder::new()
    }

    /// Reject values the polling loop cannot run with.
    pub fn validate(&self) -> Result<(), HlsMirrorError> {
        if self.scheduler_config.download_concurrency == 0 {
            return Err(HlsMirrorError::ConfigError(
                "download concurrency must be at least 1".to_string(),
            ));
        }
        if self.fetcher_config.max_attempts == 0 {
            return Err(HlsMirrorError::ConfigError(
                "max attempts must be at least 1".to_string(),
            ));
        }
        if self.playlist_config.poll_interval.is_zero() {
            return Err(HlsMirrorError::ConfigError(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// --- Playlist Configuration ---
#[derive(Debug, Clone)]
pub struct HlsPlaylistConfig {
    /// Fixed sleep between two polling cycles
    pub poll_interval: Duration,
    /// Master playlist hops followed within one cycle
    pub max_master_redirects: u32,
}

impl Default for HlsPlaylistConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_master_redirects: 4,
        }
    }
}

// --- Scheduler Configuration ---
#[derive(Debug, Clone)]
pub struct HlsSchedulerConfig {
    pub download_concurrency: usize, // Max simultaneous segment transfers
}

impl Default for HlsSchedulerConfig {
    fn default() -> Self {
        Self {
            download_concurrency: 8,
        }
    }
}

// --- Fetcher Configuration ---
#[derive(Debug, Clone)]
pub struct HlsFetcherConfig {
    /// Total attempts per segment, including the first one
    pub max_attempts: u32,
    /// Delay after attempt `i` (0-indexed) is `(i + 1) * retry_delay_base`
    pub retry_delay_base: Duration,
}

impl Default for HlsFetcherConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_base: Duration::from_secs(1),
        }
    }
}

impl HlsFetcherConfig {
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        self.retry_delay_base.saturating_mul(attempt.saturating_add(1))
    }
}

// --- Output Configuration ---
#[derive(Debug, Clone)]
pub struct HlsOutputConfig {
    /// Parent of the per-stream `<name>_hls_segments` directory
    pub root_dir: PathBuf,
    /// Extension every segment file name ends with, appended when missing
    pub segment_extension: String,
}

impl Default for HlsOutputConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            segment_extension: "ts".to_string(),
        }
    }
}

/// Fluent builder for [`HlsConfig`]
#[derive(Debug, Clone, Default)]
pub struct HlsConfigBuilder {
    config: HlsConfig,
}

impl HlsConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_config(mut self, base: DownloaderConfig) -> Self {
        self.config.base = base;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.playlist_config.poll_interval = interval;
        self
    }

    pub fn max_master_redirects(mut self, hops: u32) -> Self {
        self.config.playlist_config.max_master_redirects = hops;
        self
    }

    pub fn download_concurrency(mut self, concurrency: usize) -> Self {
        self.config.scheduler_config.download_concurrency = concurrency;
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.fetcher_config.max_attempts = attempts;
        self
    }

    pub fn retry_delay_base(mut self, delay: Duration) -> Self {
        self.config.fetcher_config.retry_delay_base = delay;
        self
    }

    pub fn output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.output_config.root_dir = root.into();
        self
    }

    pub fn segment_extension(mut self, extension: impl Into<String>) -> Self {
        self.config.output_config.segment_extension = extension.into();
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> Result<HlsConfig, HlsMirrorError> {
        self.config.validate()?;
        Ok(self.config)
    }

    /// Return the configuration without validation
    pub fn get_config(self) -> HlsConfig {
        self.config
    }
}
