use std::path::PathBuf;
use std::sync::Arc;

use crate::hls::HlsMirrorError;
use crate::hls::ledger::FilterStats;

#[derive(Debug, Clone)]
pub enum MirrorEvent {
    /// A polling cycle finished filtering and its batch (if any) completed
    CycleCompleted {
        stats: FilterStats,
    },
    /// A cycle was abandoned; the loop sleeps and retries
    CycleFailed {
        error: HlsMirrorError,
    },
    SegmentSaved {
        url: String,
        path: PathBuf,
        bytes: usize,
    },
    SegmentFailed {
        url: String,
        error: HlsMirrorError,
    },
}

pub type EventHandler = Arc<dyn Fn(MirrorEvent) + Send + Sync>;
