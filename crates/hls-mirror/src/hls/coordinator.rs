// HLS Polling Coordinator: fetch -> parse -> redirect -> filter -> dispatch -> sleep, forever.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, error, info};
use url::Url;

use crate::hls::HlsMirrorError;
use crate::hls::config::HlsConfig;
use crate::hls::events::{EventHandler, MirrorEvent};
use crate::hls::ledger::{DedupLedger, FilterStats, filter_new_segments};
use crate::hls::playlist::Playlist;
use crate::hls::scheduler::SegmentScheduler;
use crate::http::HttpFetcher;

/// Owns the cross-cycle state: the ledger and the output directory.
///
/// Only the polling loop touches the ledger, download workers never see it.
pub struct PollingCoordinator {
    http: Arc<dyn HttpFetcher>,
    scheduler: SegmentScheduler,
    ledger: DedupLedger,
    config: Arc<HlsConfig>,
    output_dir: PathBuf,
    event_handler: Option<EventHandler>,
}

impl PollingCoordinator {
    pub fn new(
        http: Arc<dyn HttpFetcher>,
        scheduler: SegmentScheduler,
        config: Arc<HlsConfig>,
        output_dir: PathBuf,
        event_handler: Option<EventHandler>,
    ) -> Self {
        Self {
            http,
            scheduler,
            ledger: DedupLedger::new(),
            config,
            output_dir,
            event_handler,
        }
    }

    pub fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Poll until `shutdown` fires. Without a shutdown source this never returns.
    ///
    /// A failed cycle is logged and counts as "nothing new"; the loop sleeps
    /// and starts over from the top-level playlist.
    pub async fn run(&mut self, playlist_url: &str, mut shutdown: Option<broadcast::Receiver<()>>) {
        let interval = self.config.playlist_config.poll_interval;

        loop {
            tokio::select! {
                biased;
                _ = wait_for_shutdown(&mut shutdown) => {
                    info!("Shutdown signal received, abandoning the current cycle");
                    return;
                }
                result = self.run_cycle(playlist_url) => match result {
                    Ok(stats) => self.emit(MirrorEvent::CycleCompleted { stats }),
                    Err(e) => {
                        error!(url = %playlist_url, error = %e, retry_in = ?interval, "Polling cycle failed");
                        self.emit(MirrorEvent::CycleFailed { error: e });
                    }
                },
            }

            tokio::select! {
                biased;
                _ = wait_for_shutdown(&mut shutdown) => {
                    info!("Shutdown signal received, stopping playlist polling");
                    return;
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    /// One full cycle starting from `playlist_url`.
    pub async fn run_cycle(&mut self, playlist_url: &str) -> Result<FilterStats, HlsMirrorError> {
        let playlist = self.resolve_media_playlist(playlist_url).await?;

        let (fresh, stats) = filter_new_segments(&mut self.ledger, &playlist);
        if fresh.is_empty() {
            info!("No new segments, waiting for the next refresh");
            return Ok(stats);
        }

        info!(count = fresh.len(), "Downloading new segments");
        let summary = self
            .scheduler
            .download_batch(&fresh, &self.output_dir)
            .await?;
        debug!(
            saved = summary.saved,
            already_present = summary.already_present,
            bytes = summary.bytes,
            "Batch complete"
        );

        Ok(stats)
    }

    /// Fetch `playlist_url`, following master playlists to their first entry.
    async fn resolve_media_playlist(&self, playlist_url: &str) -> Result<Playlist, HlsMirrorError> {
        let max_hops = self.config.playlist_config.max_master_redirects;
        let mut current = playlist_url.to_string();

        for _ in 0..=max_hops {
            let playlist = self.fetch_playlist(&current).await?;
            if !playlist.is_master {
                return Ok(playlist);
            }

            let Some(first) = playlist.entries.first() else {
                return Err(HlsMirrorError::EmptyMasterPlaylist(current));
            };
            info!(media_playlist = %first, "Master playlist found, switching to its first media playlist");
            current = first.to_string();
        }

        Err(HlsMirrorError::RedirectLimit(max_hops))
    }

    async fn fetch_playlist(&self, playlist_url: &str) -> Result<Playlist, HlsMirrorError> {
        let url = Url::parse(playlist_url)
            .map_err(|e| HlsMirrorError::invalid_url(playlist_url, e))?;
        let body = self.http.get(&url).await?;
        let content = String::from_utf8_lossy(&body);
        Playlist::parse(&content, playlist_url)
    }

    fn emit(&self, event: MirrorEvent) {
        if let Some(handler) = &self.event_handler {
            handler(event);
        }
    }
}

async fn wait_for_shutdown(shutdown: &mut Option<broadcast::Receiver<()>>) {
    match shutdown {
        // A closed or lagged channel also means the owner is gone
        Some(rx) => {
            let _ = rx.recv().await;
        }
        None => std::future::pending::<()>().await,
    }
}
