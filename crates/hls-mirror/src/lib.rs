//! # HLS Mirror
//!
//! A library for mirroring live HLS streams to disk.
//!
//! The engine polls a live playlist, works out which media segments have not
//! been seen yet, and downloads each one exactly once with bounded
//! concurrency and per-segment retries.
//!
//! ## Features
//!
//! - Master playlist redirection to the first listed media playlist
//! - Relative URL resolution with query (token) inheritance
//! - Segment identity derivation for process-lifetime deduplication
//! - Bounded-concurrency batch downloads with linear retry backoff
//! - Filesystem-safe output naming derived from the playlist URL

pub mod builder;
pub mod config;
pub mod error;
pub mod hls;
pub mod http;
pub mod proxy;
pub mod storage;

pub use builder::DownloaderConfigBuilder;
pub use config::DownloaderConfig;
pub use error::DownloadError;

pub use hls::{
    DedupLedger, HlsConfig, HlsConfigBuilder, HlsDownloader, HlsMirrorError, MirrorEvent,
    Playlist,
};

// Re-export collaborator seams
pub use http::{HttpFetcher, ReqwestFetcher, create_client};
pub use storage::{FsSegmentStore, SegmentStore};

// Re-export proxy utilities
pub use proxy::{ProxyAuth, ProxyConfig, ProxyType};
