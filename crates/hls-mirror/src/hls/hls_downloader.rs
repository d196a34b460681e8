use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use crate::hls::naming::output_dir_name;
use crate::hls::{HlsConfig, HlsMirrorError};
use crate::http::{HttpFetcher, ReqwestFetcher};
use crate::storage::{FsSegmentStore, SegmentStore};
use crate::DownloadError;

use super::coordinator::PollingCoordinator;
use super::events::EventHandler;
use super::fetcher::SegmentFetcher;
use super::scheduler::SegmentScheduler;

/// Entry point: mirrors one live playlist into its own output directory.
pub struct HlsDownloader {
    config: Arc<HlsConfig>,
    http: Arc<dyn HttpFetcher>,
    store: Arc<dyn SegmentStore>,
    event_handler: Option<EventHandler>,
}

impl HlsDownloader {
    /// Build a downloader with a reqwest client and the local filesystem.
    pub fn new(config: HlsConfig) -> Result<Self, DownloadError> {
        config.validate()?;
        let http = ReqwestFetcher::from_config(&config.base)?;
        Ok(Self::with_collaborators(
            config,
            Arc::new(http),
            Arc::new(FsSegmentStore::new()),
        ))
    }

    /// Build a downloader around caller-provided HTTP and storage seams.
    pub fn with_collaborators(
        config: HlsConfig,
        http: Arc<dyn HttpFetcher>,
        store: Arc<dyn SegmentStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            http,
            store,
            event_handler: None,
        }
    }

    pub fn with_event_handler(mut self, handler: EventHandler) -> Self {
        self.event_handler = Some(handler);
        self
    }

    pub fn config(&self) -> &HlsConfig {
        &self.config
    }

    /// `<root>/<name>_hls_segments` for `playlist_url`.
    pub fn output_dir_for(&self, playlist_url: &str) -> Result<PathBuf, DownloadError> {
        let name = output_dir_name(playlist_url).map_err(|e| {
            DownloadError::OutputDirUnavailable(format!("{playlist_url} ({e})"))
        })?;
        Ok(self.config.output_config.root_dir.join(name))
    }

    /// Mirror `playlist_url` for the rest of the process lifetime.
    ///
    /// Returns only when the output directory cannot be set up.
    pub async fn start(&self, playlist_url: &str) -> Result<(), DownloadError> {
        self.run(playlist_url, None).await
    }

    /// Like [`start`](Self::start), but returns `Ok(())` once `shutdown` fires.
    pub async fn start_with_shutdown(
        &self,
        playlist_url: &str,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), DownloadError> {
        self.run(playlist_url, Some(shutdown)).await
    }

    async fn run(
        &self,
        playlist_url: &str,
        shutdown: Option<broadcast::Receiver<()>>,
    ) -> Result<(), DownloadError> {
        let output_dir = self.output_dir_for(playlist_url)?;
        self.store
            .ensure_dir(&output_dir)
            .await
            .map_err(|source: HlsMirrorError| DownloadError::OutputDirCreation {
                path: output_dir.clone(),
                source,
            })?;

        info!(url = %playlist_url, "Starting live HLS mirror");
        info!(dir = %output_dir.display(), "Saving segments");

        let mut coordinator = self.coordinator(output_dir);
        coordinator.run(playlist_url, shutdown).await;

        info!(url = %playlist_url, "HLS mirror stopped");
        Ok(())
    }

    fn coordinator(&self, output_dir: PathBuf) -> PollingCoordinator {
        let fetcher = SegmentFetcher::new(
            Arc::clone(&self.http),
            Arc::clone(&self.store),
            self.config.fetcher_config.clone(),
        );
        let scheduler = SegmentScheduler::new(
            Arc::new(fetcher),
            self.config.scheduler_config.download_concurrency,
            self.config.output_config.segment_extension.clone(),
            self.event_handler.clone(),
        );
        PollingCoordinator::new(
            Arc::clone(&self.http),
            scheduler,
            Arc::clone(&self.config),
            output_dir,
            self.event_handler.clone(),
        )
    }
}
