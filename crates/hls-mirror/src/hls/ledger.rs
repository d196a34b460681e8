use std::collections::HashSet;
use std::fmt;

use tracing::{debug, info, warn};
use url::Url;

use crate::hls::HlsMirrorError;
use crate::hls::playlist::Playlist;
use crate::hls::segment_id::derive_segment_id;

/// Identities already handed to the download engine.
///
/// Owned by the polling loop and only touched from it. Grows for the
/// lifetime of the process; nothing is evicted or persisted.
#[derive(Debug, Default)]
pub struct DedupLedger {
    dispatched: HashSet<String>,
}

impl DedupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` exactly once per identity and marks it dispatched.
    pub fn should_download(&mut self, identity: impl Into<String>) -> bool {
        self.dispatched.insert(identity.into())
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.dispatched.contains(identity)
    }

    pub fn len(&self) -> usize {
        self.dispatched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dispatched.is_empty()
    }
}

/// Per-cycle filtering counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub total: usize,
    pub new: usize,
    pub invalid_url: usize,
    pub invalid_name: usize,
    pub already_downloaded: usize,
}

impl fmt::Display for FilterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total={} new={} invalid_url={} invalid_name={} already_downloaded={}",
            self.total, self.new, self.invalid_url, self.invalid_name, self.already_downloaded
        )
    }
}

/// Select the entries of a media playlist that have not been dispatched yet,
/// marking them in the ledger as it goes.
pub fn filter_new_segments(ledger: &mut DedupLedger, playlist: &Playlist) -> (Vec<Url>, FilterStats) {
    let mut stats = FilterStats {
        total: playlist.entries.len() + playlist.rejected_lines,
        invalid_url: playlist.rejected_lines,
        ..FilterStats::default()
    };
    let mut fresh = Vec::new();

    for (index, url) in playlist.entries.iter().enumerate() {
        let identity = match derive_segment_id(url, playlist.sequence, index) {
            Ok(id) => id,
            Err(HlsMirrorError::InvalidFilename(_)) => {
                warn!(index, url = %url, "Skipping segment without a usable filename");
                stats.invalid_name += 1;
                continue;
            }
            Err(e) => {
                warn!(index, url = %url, error = %e, "Skipping invalid segment URL");
                stats.invalid_url += 1;
                continue;
            }
        };

        if ledger.should_download(identity.as_str()) {
            debug!(index, id = %identity, "New segment");
            fresh.push(url.clone());
        } else {
            stats.already_downloaded += 1;
        }
    }

    stats.new = fresh.len();
    info!(%stats, "Segment filtering finished");
    (fresh, stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playlist(urls: &[&str], sequence: u64) -> Playlist {
        Playlist {
            entries: urls.iter().map(|u| Url::parse(u).unwrap()).collect(),
            is_master: false,
            sequence,
            rejected_lines: 0,
        }
    }

    #[test]
    fn should_download_is_check_and_mark() {
        let mut ledger = DedupLedger::new();
        assert!(ledger.should_download("42"));
        assert!(!ledger.should_download("42"));
        assert!(ledger.contains("42"));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn second_identical_pass_yields_nothing() {
        let mut ledger = DedupLedger::new();
        let pl = playlist(
            &[
                "https://h/live/seg1.ts",
                "https://h/live/seg2.ts",
                "https://h/live/chunk.ts",
            ],
            10,
        );

        let (first, first_stats) = filter_new_segments(&mut ledger, &pl);
        assert_eq!(first.len(), 3);
        assert_eq!(first_stats.new, 3);

        let (second, second_stats) = filter_new_segments(&mut ledger, &pl);
        assert!(second.is_empty());
        assert_eq!(second_stats.already_downloaded, 3);
        assert_eq!(second_stats.total, 3);
    }

    #[test]
    fn sliding_window_only_yields_the_tail() {
        let mut ledger = DedupLedger::new();
        filter_new_segments(
            &mut ledger,
            &playlist(&["https://h/s/100.ts", "https://h/s/101.ts"], 100),
        );

        let (fresh, stats) = filter_new_segments(
            &mut ledger,
            &playlist(&["https://h/s/101.ts", "https://h/s/102.ts"], 101),
        );
        assert_eq!(fresh, vec![Url::parse("https://h/s/102.ts").unwrap()]);
        assert_eq!(stats.already_downloaded, 1);
    }

    #[test]
    fn duplicate_identity_within_one_playlist_dispatches_once() {
        let mut ledger = DedupLedger::new();
        let (fresh, stats) = filter_new_segments(
            &mut ledger,
            &playlist(&["https://a/seg5.ts", "https://b/other5.ts"], 0),
        );
        assert_eq!(fresh.len(), 1);
        assert_eq!(stats.already_downloaded, 1);
    }

    #[test]
    fn invalid_names_and_rejected_lines_are_counted() {
        let mut ledger = DedupLedger::new();
        let mut pl = playlist(&["https://h/live/", "https://h/live/seg3.ts"], 0);
        pl.rejected_lines = 2;

        let (fresh, stats) = filter_new_segments(&mut ledger, &pl);
        assert_eq!(fresh.len(), 1);
        assert_eq!(
            stats,
            FilterStats {
                total: 4,
                new: 1,
                invalid_url: 2,
                invalid_name: 1,
                already_downloaded: 0,
            }
        );
    }
}
