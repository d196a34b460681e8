// HLS Segment Scheduler: runs one batch of segment downloads with bounded concurrency.

use std::path::Path;
use std::sync::Arc;

use chrono::Local;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tracing::{debug, error, info};
use url::Url;

use crate::hls::HlsMirrorError;
use crate::hls::events::{EventHandler, MirrorEvent};
use crate::hls::fetcher::{DownloadTask, SegmentFetcher, SegmentOutcome};
use crate::hls::naming::{fetch_timestamp, segment_file_name};

/// Outcome counts of a batch where every task succeeded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub saved: usize,
    pub already_present: usize,
    pub bytes: usize,
}

pub struct SegmentScheduler {
    fetcher: Arc<SegmentFetcher>,
    concurrency: usize,
    segment_extension: String,
    event_handler: Option<EventHandler>,
}

impl SegmentScheduler {
    pub fn new(
        fetcher: Arc<SegmentFetcher>,
        concurrency: usize,
        segment_extension: impl Into<String>,
        event_handler: Option<EventHandler>,
    ) -> Self {
        Self {
            fetcher,
            concurrency: concurrency.max(1),
            segment_extension: segment_extension.into(),
            event_handler,
        }
    }

    /// Name every URL of the batch inside `output_dir`, in playlist order.
    pub fn plan_batch(&self, urls: &[Url], output_dir: &Path) -> Vec<DownloadTask> {
        let timestamp = fetch_timestamp(&Local::now());
        let max_attempts = self.fetcher.config().max_attempts;

        urls.iter()
            .enumerate()
            .map(|(index, url)| DownloadTask {
                url: url.clone(),
                destination: output_dir.join(segment_file_name(
                    &timestamp,
                    index,
                    url,
                    &self.segment_extension,
                )),
                max_attempts,
            })
            .collect()
    }

    /// Download `urls` into `output_dir` and wait for every task.
    ///
    /// At most `concurrency` transfers run at once. Tasks that fail do not
    /// stop their siblings; once the whole batch has finished, the first
    /// failure observed is returned and the rest are only logged.
    pub async fn download_batch(
        &self,
        urls: &[Url],
        output_dir: &Path,
    ) -> Result<BatchSummary, HlsMirrorError> {
        let tasks = self.plan_batch(urls, output_dir);
        self.run_tasks(tasks).await
    }

    pub async fn run_tasks(&self, tasks: Vec<DownloadTask>) -> Result<BatchSummary, HlsMirrorError> {
        let total = tasks.len();
        let mut pending = tasks.into_iter();
        let mut in_flight = FuturesUnordered::new();
        let mut summary = BatchSummary::default();
        let mut first_error: Option<HlsMirrorError> = None;
        let mut failed = 0usize;

        loop {
            // Top up to the concurrency limit, in dispatch order
            while in_flight.len() < self.concurrency {
                let Some(task) = pending.next() else {
                    break;
                };
                debug!(url = %task.url, "Dispatching segment download");
                in_flight.push(async move {
                    let result = self.fetcher.fetch(&task).await;
                    (task, result)
                });
            }

            let Some((task, result)) = in_flight.next().await else {
                break;
            };

            match result {
                Ok(SegmentOutcome::Saved { bytes }) => {
                    summary.saved += 1;
                    summary.bytes += bytes;
                    info!(file = %task.destination.display(), bytes, "Segment downloaded");
                    self.emit(MirrorEvent::SegmentSaved {
                        url: task.url.to_string(),
                        path: task.destination,
                        bytes,
                    });
                }
                Ok(SegmentOutcome::AlreadyPresent) => {
                    summary.already_present += 1;
                }
                Err(e) => {
                    failed += 1;
                    error!(url = %task.url, error = %e, "Segment download failed");
                    self.emit(MirrorEvent::SegmentFailed {
                        url: task.url.to_string(),
                        error: e.clone(),
                    });
                    first_error.get_or_insert(e);
                }
            }
        }

        debug!(
            total,
            saved = summary.saved,
            already_present = summary.already_present,
            failed,
            "Batch finished"
        );

        match first_error {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }

    fn emit(&self, event: MirrorEvent) {
        if let Some(handler) = &self.event_handler {
            handler(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hls::config::HlsFetcherConfig;
    use crate::hls::test_support::ScriptedHttp;
    use crate::storage::FsSegmentStore;
    use parking_lot::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    fn scheduler(http: Arc<ScriptedHttp>, concurrency: usize) -> SegmentScheduler {
        let fetcher = SegmentFetcher::new(
            http,
            Arc::new(FsSegmentStore::new()),
            HlsFetcherConfig {
                max_attempts: 3,
                retry_delay_base: Duration::from_millis(1),
            },
        );
        SegmentScheduler::new(Arc::new(fetcher), concurrency, "ts", None)
    }

    fn urls(count: usize) -> Vec<Url> {
        (0..count)
            .map(|i| Url::parse(&format!("https://h/live/seg{i}.ts")).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn never_exceeds_concurrency_limit() {
        let dir = TempDir::new().unwrap();
        let http = Arc::new(ScriptedHttp::with_latency(Duration::from_millis(5)));
        let batch = urls(50);
        for url in &batch {
            http.respond(url.as_str(), b"ts");
        }

        let summary = scheduler(http.clone(), 8)
            .download_batch(&batch, dir.path())
            .await
            .unwrap();

        assert_eq!(summary.saved, 50);
        assert!(http.peak_in_flight() <= 8, "peak was {}", http.peak_in_flight());
        assert!(http.peak_in_flight() > 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 50);
    }

    #[tokio::test]
    async fn failed_task_does_not_block_siblings() {
        let dir = TempDir::new().unwrap();
        let http = Arc::new(ScriptedHttp::new());
        let batch = urls(4);
        for url in &batch {
            http.respond(url.as_str(), b"ts");
        }
        http.fail_first(batch[1].as_str(), 3);

        let err = scheduler(http.clone(), 2)
            .download_batch(&batch, dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, HlsMirrorError::ExhaustedRetries { ref url, .. } if url == batch[1].as_str()));
        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names.len(), 3);
        assert!(names[0].ends_with("_00000_seg0.ts"));
        assert!(names[1].ends_with("_00002_seg2.ts"));
        assert!(names[2].ends_with("_00003_seg3.ts"));
    }

    #[tokio::test]
    async fn retried_task_counts_as_success() {
        let dir = TempDir::new().unwrap();
        let http = Arc::new(ScriptedHttp::new());
        let batch = urls(2);
        for url in &batch {
            http.respond(url.as_str(), b"ts");
        }
        http.fail_first(batch[0].as_str(), 2);

        let summary = scheduler(http.clone(), 4)
            .download_batch(&batch, dir.path())
            .await
            .unwrap();

        assert_eq!(summary.saved, 2);
        assert_eq!(http.request_count(batch[0].as_str()), 3);
    }

    #[tokio::test]
    async fn events_report_each_segment() {
        let dir = TempDir::new().unwrap();
        let http = Arc::new(ScriptedHttp::new());
        let batch = urls(3);
        http.respond(batch[0].as_str(), b"a");
        http.respond(batch[2].as_str(), b"c");

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let fetcher = SegmentFetcher::new(
            http,
            Arc::new(FsSegmentStore::new()),
            HlsFetcherConfig {
                max_attempts: 1,
                retry_delay_base: Duration::ZERO,
            },
        );
        let handler: EventHandler = Arc::new(move |event: MirrorEvent| sink.lock().push(event));
        let scheduler = SegmentScheduler::new(Arc::new(fetcher), 3, "ts", Some(handler));

        assert!(scheduler.download_batch(&batch, dir.path()).await.is_err());

        let events = seen.lock();
        let saved = events
            .iter()
            .filter(|e| matches!(e, MirrorEvent::SegmentSaved { .. }))
            .count();
        let failed = events
            .iter()
            .filter(|e| matches!(e, MirrorEvent::SegmentFailed { .. }))
            .count();
        assert_eq!((saved, failed), (2, 1));
    }

    #[test]
    fn plan_uses_one_timestamp_per_batch() {
        let http = Arc::new(ScriptedHttp::new());
        let tasks = scheduler(http, 2).plan_batch(&urls(3), Path::new("/out"));

        assert_eq!(tasks.len(), 3);
        let prefixes: Vec<String> = tasks
            .iter()
            .map(|t| t.destination.file_name().unwrap().to_string_lossy()[..15].to_string())
            .collect();
        assert!(prefixes.iter().all(|p| p == &prefixes[0]));
        assert!(tasks[2].destination.ends_with(format!("{}_00002_seg2.ts", prefixes[0])));
    }
}
