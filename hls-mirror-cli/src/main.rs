use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use clap::Parser;
use hls_mirror_engine::{
    DownloaderConfig, HlsConfig, HlsDownloader, MirrorEvent, ProxyAuth, ProxyConfig,
};
use tokio::sync::broadcast;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::writer::MakeWriterExt;

mod cli;
mod error;
mod utils;

use cli::CliArgs;
use error::AppError;
use utils::{parse_duration, parse_headers};

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        error!(error = ?e, "Application failed");
        std::process::exit(1);
    }
}

/// Running totals reported when the mirror stops
#[derive(Default)]
struct Totals {
    cycles: AtomicU64,
    failed_cycles: AtomicU64,
    segments: AtomicU64,
    failed_segments: AtomicU64,
    bytes: AtomicU64,
}

impl Totals {
    fn record(&self, event: MirrorEvent) {
        match event {
            MirrorEvent::CycleCompleted { stats } => {
                self.cycles.fetch_add(1, Ordering::Relaxed);
                debug!(%stats, "Cycle completed");
            }
            MirrorEvent::CycleFailed { .. } => {
                self.failed_cycles.fetch_add(1, Ordering::Relaxed);
            }
            MirrorEvent::SegmentSaved { bytes, .. } => {
                self.segments.fetch_add(1, Ordering::Relaxed);
                self.bytes.fetch_add(bytes as u64, Ordering::Relaxed);
            }
            MirrorEvent::SegmentFailed { .. } => {
                self.failed_segments.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

#[tokio::main]
async fn bootstrap() -> Result<(), AppError> {
    let args = CliArgs::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&args.log_file)?;

    let multi_writer = MakeWriterExt::and(std::io::stdout, log_file);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(multi_writer)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Initialization(e.to_string()))?;

    let poll_interval = parse_duration(&args.interval)?;
    let retry_delay = parse_duration(&args.retry_delay)?;

    info!(
        "HTTP timeout configuration: overall={}s, connect={}s, read={}s",
        args.timeout, args.connect_timeout, args.read_timeout
    );

    let download_config = {
        let mut builder = DownloaderConfig::builder()
            .with_timeout(Duration::from_secs(args.timeout))
            .with_connect_timeout(Duration::from_secs(args.connect_timeout))
            .with_read_timeout(Duration::from_secs(args.read_timeout))
            .with_follow_redirects(!args.no_follow_redirects)
            .with_headers(parse_headers(&args.headers));

        if let Some(user_agent) = &args.user_agent {
            builder = builder.with_user_agent(user_agent);
        }

        if args.no_proxy {
            info!("All proxy settings disabled (--no-proxy flag)");
            builder = builder.with_system_proxy(false);
        } else if let Some(proxy_url) = &args.proxy {
            let auth = match (&args.proxy_user, &args.proxy_pass) {
                (Some(username), Some(password)) => Some(ProxyAuth {
                    username: username.clone(),
                    password: password.clone(),
                }),
                (None, None) => None,
                _ => {
                    return Err(AppError::InvalidInput(
                        "--proxy-user and --proxy-pass must be given together".to_string(),
                    ));
                }
            };

            info!(
                proxy_url = %proxy_url,
                proxy_type = ?args.proxy_type,
                has_auth = auth.is_some(),
                "Using explicit proxy configuration"
            );
            builder = builder.with_proxy(ProxyConfig {
                url: proxy_url.clone(),
                proxy_type: args.proxy_type,
                auth,
            });
        }

        builder.build()
    };

    let hls_config = HlsConfig::builder()
        .with_base_config(download_config)
        .download_concurrency(args.concurrency)
        .max_attempts(args.retries)
        .retry_delay_base(retry_delay)
        .poll_interval(poll_interval)
        .max_master_redirects(args.max_redirects)
        .output_root(args.output_dir.unwrap_or_else(|| PathBuf::from(".")))
        .build()?;

    info!(
        concurrency = hls_config.scheduler_config.download_concurrency,
        attempts = hls_config.fetcher_config.max_attempts,
        interval = ?hls_config.playlist_config.poll_interval,
        "Mirror configuration"
    );

    let totals = Arc::new(Totals::default());
    let sink = Arc::clone(&totals);
    let downloader = HlsDownloader::new(hls_config)?
        .with_event_handler(Arc::new(move |event: MirrorEvent| sink.record(event)));

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, shutting down");
                let _ = shutdown_tx.send(());
            }
            Err(e) => {
                // Keep the sender alive, a dropped sender reads as shutdown
                warn!(error = %e, "Cannot listen for Ctrl-C, running until killed");
                std::future::pending::<()>().await;
            }
        }
    });

    downloader
        .start_with_shutdown(&args.url, shutdown_rx)
        .await?;

    info!(
        cycles = totals.cycles.load(Ordering::Relaxed),
        failed_cycles = totals.failed_cycles.load(Ordering::Relaxed),
        segments = totals.segments.load(Ordering::Relaxed),
        failed_segments = totals.failed_segments.load(Ordering::Relaxed),
        bytes = totals.bytes.load(Ordering::Relaxed),
        "Mirror finished"
    );
    Ok(())
}
