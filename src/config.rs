use clap::Parser;
use std::time::Duration;
use url::Url;

/// Calldash — operational dashboard daemon for the voice-campaign backend.
#[derive(Parser, Debug, Clone)]
#[command(name = "calldash")]
pub struct CliArgs {
    /// Base URL of the campaign backend API
    #[arg(short = 'b', long = "backend-url", default_value = DEFAULT_BACKEND_URL)]
    pub backend_url: Url,

    /// Dashboard HTTP port
    #[arg(long = "port", default_value_t = DEFAULT_DASHBOARD_PORT)]
    pub port: u16,

    /// Number of recent call logs to request per refresh
    #[arg(long = "call-log-limit", default_value_t = CALL_LOG_FETCH_LIMIT)]
    pub call_log_limit: u32,

    /// Disable the background refresh loop (data then only moves on
    /// explicit refresh requests)
    #[arg(long = "no-auto-refresh")]
    pub no_auto_refresh: bool,
}

/// Runtime configuration. Intervals live here (not only as constants) so
/// tests can shrink them to milliseconds.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub backend_url: Url,
    pub port: u16,
    pub call_log_limit: u32,
    pub auto_refresh: bool,
    pub call_poll_interval: Duration,
    pub call_poll_ceiling: Duration,
    pub refresh_interval_idle: Duration,
    pub refresh_interval_active: Duration,
    pub http_timeout: Duration,
}

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000/";
pub const DEFAULT_DASHBOARD_PORT: u16 = 9870;

// Call-status polling constants
pub const CALL_POLL_INTERVAL_SECS: u64 = 2;
pub const CALL_POLL_CEILING_SECS: u64 = 300; // 5 minutes
pub const CALL_POLL_FAILURE_THRESHOLD: u32 = 5;

// Background refresh constants
pub const REFRESH_IDLE_INTERVAL_SECS: u64 = 15;
pub const REFRESH_ACTIVE_INTERVAL_SECS: u64 = 5;
pub const REFRESH_FAILURE_THRESHOLD: u32 = 3;

// HTTP client constants
pub const HTTP_TIMEOUT_SECS: u64 = 10;
pub const CALL_LOG_FETCH_LIMIT: u32 = 50;

// Notice constants
pub const NOTICE_BUFFER_SIZE: usize = 200;

impl DashboardConfig {
    pub fn from_args(args: CliArgs) -> Self {
        DashboardConfig {
            backend_url: args.backend_url,
            port: args.port,
            call_log_limit: args.call_log_limit,
            auto_refresh: !args.no_auto_refresh,
            call_poll_interval: Duration::from_secs(CALL_POLL_INTERVAL_SECS),
            call_poll_ceiling: Duration::from_secs(CALL_POLL_CEILING_SECS),
            refresh_interval_idle: Duration::from_secs(REFRESH_IDLE_INTERVAL_SECS),
            refresh_interval_active: Duration::from_secs(REFRESH_ACTIVE_INTERVAL_SECS),
            http_timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
        }
    }

    /// Join a path onto the backend base URL.
    pub fn backend_endpoint(&self, path: &str) -> String {
        let base = self.backend_url.as_str().trim_end_matches('/');
        format!("{}{}", base, path)
    }
}
