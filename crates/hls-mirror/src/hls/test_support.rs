// In-memory HTTP double shared by the engine's unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use reqwest::StatusCode;
use url::Url;

use crate::hls::HlsMirrorError;
use crate::http::HttpFetcher;

#[derive(Default)]
struct Script {
    bodies: HashMap<String, Bytes>,
    failures_left: HashMap<String, u32>,
    requests: HashMap<String, usize>,
}

#[derive(Default)]
pub struct ScriptedHttp {
    script: Mutex<Script>,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    pub fn respond(&self, url: &str, body: &[u8]) {
        self.script
            .lock()
            .bodies
            .insert(url.to_string(), Bytes::copy_from_slice(body));
    }

    /// Answer the next `times` requests for `url` with HTTP 503
    pub fn fail_first(&self, url: &str, times: u32) {
        self.script
            .lock()
            .failures_left
            .insert(url.to_string(), times);
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.script
            .lock()
            .requests
            .get(url)
            .copied()
            .unwrap_or_default()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpFetcher for ScriptedHttp {
    async fn get(&self, url: &Url) -> Result<Bytes, HlsMirrorError> {
        let key = url.as_str().to_string();
        *self.script.lock().requests.entry(key.clone()).or_default() += 1;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let mut script = self.script.lock();
        if let Some(left) = script.failures_left.get_mut(&key) {
            if *left > 0 {
                *left -= 1;
                return Err(HlsMirrorError::FetchFailure {
                    url: key,
                    status: StatusCode::SERVICE_UNAVAILABLE,
                });
            }
        }

        script
            .bodies
            .get(&key)
            .cloned()
            .ok_or(HlsMirrorError::FetchFailure {
                url: key,
                status: StatusCode::NOT_FOUND,
            })
    }
}
