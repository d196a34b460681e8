use clap::Parser;
use hls_mirror_engine::ProxyType;
use std::path::PathBuf;

/// Define CLI arguments
#[derive(Parser)]
#[command(
    version,
    about = "Mirror a live HLS stream to disk",
    long_about = "Polls a live HLS playlist, detects newly published media segments and\n\
                  downloads each of them exactly once into <name>_hls_segments.\n\
                  \n\
                  Master playlists are followed to their first listed media playlist.\n\
                  The process keeps polling until it is interrupted (Ctrl-C)."
)]
pub struct CliArgs {
    /// Playlist URL to mirror
    #[arg(required = true, help = "URL of the live M3U8 playlist (master or media)")]
    pub url: String,

    #[arg(
        short,
        long,
        help = "Directory under which <name>_hls_segments is created (default: current directory)"
    )]
    pub output_dir: Option<PathBuf>,

    #[arg(short, long, help = "Enable detailed debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'c',
        long,
        default_value = "8",
        help = "Maximum number of simultaneous segment downloads"
    )]
    pub concurrency: usize,

    #[arg(
        short = 'i',
        long,
        default_value = "5s",
        help = "Delay between playlist polls, with optional unit (ms, s, m, h)"
    )]
    pub interval: String,

    #[arg(
        short = 'r',
        long,
        default_value = "3",
        help = "Total download attempts per segment"
    )]
    pub retries: u32,

    #[arg(
        long,
        default_value = "1s",
        help = "Base retry delay; attempt N waits N times this value"
    )]
    pub retry_delay: String,

    #[arg(
        long,
        default_value = "4",
        help = "Maximum master playlist hops followed in one poll"
    )]
    pub max_redirects: u32,

    #[arg(
        long,
        default_value = "0",
        help = "Overall timeout in seconds for HTTP requests (0 disables it)"
    )]
    pub timeout: u64,

    #[arg(
        long,
        default_value = "10",
        help = "Connection timeout in seconds (time to establish initial connection)"
    )]
    pub connect_timeout: u64,

    #[arg(
        long,
        default_value = "30",
        help = "Idle timeout in seconds for pooled connections"
    )]
    pub read_timeout: u64,

    #[arg(long, help = "Do not follow HTTP 3xx redirects on playlist and segment requests")]
    pub no_follow_redirects: bool,

    #[arg(long, help = "Override the HTTP User-Agent")]
    pub user_agent: Option<String>,

    #[arg(
        short = 'H',
        long = "header",
        help = "Extra HTTP header in 'Name: Value' form, may be repeated"
    )]
    pub headers: Vec<String>,

    #[arg(
        long,
        help = "Proxy server URL for downloads (e.g., \"http://proxy.example.com:8080\")"
    )]
    pub proxy: Option<String>,

    #[arg(long, value_enum, default_value_t = ProxyType::Http, help = "Proxy type")]
    pub proxy_type: ProxyType,

    #[arg(long, help = "Username for proxy authentication")]
    pub proxy_user: Option<String>,

    #[arg(long, help = "Password for proxy authentication")]
    pub proxy_pass: Option<String>,

    #[arg(
        long,
        help = "Disable all proxy settings (including system proxy) for downloads"
    )]
    pub no_proxy: bool,

    #[arg(
        long,
        default_value = "hls-mirror.log",
        help = "Log file written alongside stdout"
    )]
    pub log_file: PathBuf,
}
