// Live HLS mirroring: parsing, deduplication, batch downloads and the polling loop.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod fetcher;
pub mod hls_downloader;
pub mod ledger;
pub mod naming;
pub mod playlist;
pub mod scheduler;
pub mod segment_id;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports for easier access
pub use config::{HlsConfig, HlsConfigBuilder};
pub use coordinator::PollingCoordinator;
pub use error::HlsMirrorError;
pub use events::{EventHandler, MirrorEvent};
pub use hls_downloader::HlsDownloader;
pub use ledger::{DedupLedger, FilterStats};
pub use playlist::Playlist;
