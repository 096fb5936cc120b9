// # ispwatchd - address watch daemon
//
// Thin integration layer over ispwatch-core. All detection logic lives in
// the library crates; this binary only reads configuration, wires the
// components together and waits for a shutdown signal.
//
// The daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Building the fetcher, notifier, engine and scheduler
// 4. Serving the passive address endpoint (optional)
//
// ## Configuration
//
// ### Sources
// - `ISPWATCH_PRIMARY_URL`: Primary address source (required)
// - `ISPWATCH_BACKUP_URLS`: Comma-separated backup sources (required)
// - `ISPWATCH_HTTP_TIMEOUT_SECS`: Per-request timeout (default 30)
//
// ### Schedule
// - `ISPWATCH_CHECK_INTERVAL_MINUTES`: Minutes between checks (default 60, 0 means 60)
// - `ISPWATCH_HEARTBEAT_DAY`: Heartbeat weekday (default Mon)
// - `ISPWATCH_HEARTBEAT_TIME`: Heartbeat time of day, HH:MM (default 09:00)
// - `ISPWATCH_HEARTBEAT_INTERVAL_DAYS`: Days between heartbeats (default 7)
//
// ### Notifications
// - `ISPWATCH_WEBHOOK_URL`: Webhook receiving JSON messages (log only when unset)
// - `ISPWATCH_DNS_PROVIDER_NAME` / `ISPWATCH_DNS_PROVIDER_URL`: Shown in change messages
//
// ### Endpoint
// - `ISPWATCH_ENDPOINT_BIND`: `host:port` for `GET /HTTP/GetIp` (disabled when unset)
//
// ### Logging
// - `ISPWATCH_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export ISPWATCH_PRIMARY_URL=https://ip.example.net/HTTP/GetIp
// export ISPWATCH_BACKUP_URLS=https://api.ipify.org,https://icanhazip.com
// export ISPWATCH_HEARTBEAT_DAY=Fri
//
// ispwatchd
// ```

use anyhow::{Context, Result};
use chrono::{NaiveTime, Weekday};
use ispwatch_core::config::{
    DEFAULT_CHECK_INTERVAL_MINUTES, HttpConfig, MonitorConfig, ScheduleConfig,
};
use ispwatch_core::{CheckEngine, CounterStore, Notifier, Scheduler};
use ispwatch_http::HttpFetcher;
use ispwatch_notify::{LogTransport, MessageNotifier, RenderContext, WebhookTransport};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Upper bound on waiting for an in-flight cycle at shutdown
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(60);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum IspwatchExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<IspwatchExitCode> for ExitCode {
    fn from(code: IspwatchExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug, Clone)]
struct Config {
    primary_url: String,
    backup_urls: Vec<String>,
    check_interval_minutes: u64,
    heartbeat_day: Weekday,
    heartbeat_time: NaiveTime,
    heartbeat_interval_days: u64,
    http_timeout_secs: u64,
    webhook_url: Option<String>,
    dns_provider_name: Option<String>,
    dns_provider_url: Option<String>,
    endpoint_bind: Option<String>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let heartbeat_time = match var("ISPWATCH_HEARTBEAT_TIME") {
            Some(raw) => NaiveTime::parse_from_str(&raw, "%H:%M").with_context(|| {
                format!("ISPWATCH_HEARTBEAT_TIME must be HH:MM. Got: {}", raw)
            })?,
            None => ScheduleConfig::default().heartbeat_time_of_day,
        };

        let heartbeat_day = match var("ISPWATCH_HEARTBEAT_DAY") {
            Some(raw) => raw.parse::<Weekday>().map_err(|_| {
                anyhow::anyhow!(
                    "ISPWATCH_HEARTBEAT_DAY must be a weekday (Mon..Sun). Got: {}",
                    raw
                )
            })?,
            None => ScheduleConfig::default().heartbeat_day_of_week,
        };

        Ok(Self {
            primary_url: var("ISPWATCH_PRIMARY_URL").unwrap_or_default(),
            backup_urls: var("ISPWATCH_BACKUP_URLS")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            check_interval_minutes: parse_number(
                &var,
                "ISPWATCH_CHECK_INTERVAL_MINUTES",
                DEFAULT_CHECK_INTERVAL_MINUTES,
            )?,
            heartbeat_day,
            heartbeat_time,
            heartbeat_interval_days: parse_number(
                &var,
                "ISPWATCH_HEARTBEAT_INTERVAL_DAYS",
                ScheduleConfig::default().heartbeat_interval_days,
            )?,
            http_timeout_secs: parse_number(
                &var,
                "ISPWATCH_HTTP_TIMEOUT_SECS",
                HttpConfig::default().timeout_secs,
            )?,
            webhook_url: var("ISPWATCH_WEBHOOK_URL"),
            dns_provider_name: var("ISPWATCH_DNS_PROVIDER_NAME"),
            dns_provider_url: var("ISPWATCH_DNS_PROVIDER_URL"),
            endpoint_bind: var("ISPWATCH_ENDPOINT_BIND"),
            log_level: var("ISPWATCH_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Library configuration derived from the environment
    fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            primary_endpoint: self.primary_url.clone(),
            backup_endpoints: self.backup_urls.clone(),
            schedule: ScheduleConfig {
                check_interval_minutes: self.check_interval_minutes,
                heartbeat_day_of_week: self.heartbeat_day,
                heartbeat_time_of_day: self.heartbeat_time,
                heartbeat_interval_days: self.heartbeat_interval_days,
            },
            http: HttpConfig {
                timeout_secs: self.http_timeout_secs,
            },
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.primary_url.is_empty() {
            anyhow::bail!(
                "ISPWATCH_PRIMARY_URL is required. \
                Set it via: export ISPWATCH_PRIMARY_URL=https://ip.example.net/HTTP/GetIp"
            );
        }

        if self.backup_urls.is_empty() {
            anyhow::bail!(
                "ISPWATCH_BACKUP_URLS must contain at least one URL. \
                Set it via: export ISPWATCH_BACKUP_URLS=https://api.ipify.org,https://icanhazip.com"
            );
        }

        self.monitor_config().validate()?;

        if let Some(ref url) = self.webhook_url
            && !url.starts_with("https://")
            && !url.starts_with("http://")
        {
            anyhow::bail!(
                "ISPWATCH_WEBHOOK_URL must use HTTP or HTTPS scheme. Got: {}",
                url
            );
        }

        if self.dns_provider_url.is_some() && self.dns_provider_name.is_none() {
            anyhow::bail!("ISPWATCH_DNS_PROVIDER_URL is set but ISPWATCH_DNS_PROVIDER_NAME is not");
        }

        if let Some(ref bind) = self.endpoint_bind
            && bind.parse::<std::net::SocketAddr>().is_err()
        {
            anyhow::bail!(
                "ISPWATCH_ENDPOINT_BIND must be host:port (e.g. 0.0.0.0:8080). Got: {}",
                bind
            );
        }

        if parse_level(&self.log_level).is_none() {
            anyhow::bail!(
                "ISPWATCH_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            );
        }

        Ok(())
    }

    fn render_context(&self) -> RenderContext {
        let context = RenderContext::from_config(&self.monitor_config());
        match &self.dns_provider_name {
            Some(name) => context.with_dns_provider(
                name.clone(),
                self.dns_provider_url.clone().unwrap_or_default(),
            ),
            None => context,
        }
    }
}

fn parse_number(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<u64> {
    match var(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} must be a non-negative integer. Got: {}", key, raw)),
        None => Ok(default),
    }
}

fn parse_level(level: &str) -> Option<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Build the notifier: webhook when configured, log otherwise
fn build_notifier(config: &Config) -> Result<Arc<dyn Notifier>> {
    let context = config.render_context();
    match &config.webhook_url {
        Some(url) => {
            info!("Notifications go to webhook");
            Ok(Arc::new(MessageNotifier::new(
                context,
                WebhookTransport::new(url.clone())?,
            )))
        }
        None => {
            info!("Notifications go to the log");
            Ok(Arc::new(MessageNotifier::new(context, LogTransport)))
        }
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return IspwatchExitCode::ConfigError.into();
        }
    };

    // Initialize tracing
    let log_level = parse_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return IspwatchExitCode::ConfigError.into();
    }

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return IspwatchExitCode::RuntimeError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        let message = format!("{:#}", e);
        error!("Configuration validation error: {}", message);
        rt.block_on(report_configuration_error(&config, &message));
        return IspwatchExitCode::ConfigError.into();
    }

    info!("Starting ispwatchd daemon");
    info!(
        "Configuration loaded: primary {}, {} backup source(s)",
        config.primary_url,
        config.backup_urls.len()
    );

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {:#}", e);
            IspwatchExitCode::RuntimeError
        } else {
            IspwatchExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Deliver a configuration error through the notifier, when one can be built
async fn report_configuration_error(config: &Config, message: &str) {
    match build_notifier(config) {
        Ok(notifier) => {
            if let Err(e) = notifier.configuration_error(message).await {
                warn!("Failed to deliver configuration error: {}", e);
            }
        }
        Err(e) => warn!("No notifier available for configuration error: {}", e),
    }
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let monitor = config.monitor_config();
    let counters = Arc::new(CounterStore::new());

    let fetcher = Arc::new(HttpFetcher::new(&monitor.http)?);
    let notifier = build_notifier(&config)?;
    let engine = Arc::new(CheckEngine::new(
        fetcher,
        notifier,
        Arc::clone(&counters),
        monitor,
    )?);

    #[cfg(feature = "endpoint")]
    let endpoint = start_endpoint(&config, Arc::clone(&counters)).await?;

    #[cfg(not(feature = "endpoint"))]
    {
        if config.endpoint_bind.is_some() {
            warn!("ISPWATCH_ENDPOINT_BIND is set but the endpoint feature is disabled");
        }
    }

    let scheduler = Scheduler::start(engine);

    info!("Daemon initialized successfully");

    let signal = wait_for_shutdown().await?;
    info!("Received shutdown signal: {}", signal);
    info!("Shutting down daemon");

    let stopped = tokio::time::timeout(SHUTDOWN_TIMEOUT, scheduler.shutdown())
        .await
        .map_err(|_| anyhow::anyhow!("Shutdown timeout after {:?}", SHUTDOWN_TIMEOUT))?;
    stopped?;

    #[cfg(feature = "endpoint")]
    {
        if let Some((stop, task)) = endpoint {
            let _ = stop.send(());
            task.await
                .context("Endpoint task failed")?
                .context("Endpoint server failed")?;
        }
    }

    Ok(())
}

#[cfg(feature = "endpoint")]
type EndpointTask = (
    tokio::sync::oneshot::Sender<()>,
    tokio::task::JoinHandle<std::io::Result<()>>,
);

/// Bind and spawn the passive endpoint when configured
#[cfg(feature = "endpoint")]
async fn start_endpoint(
    config: &Config,
    counters: Arc<CounterStore>,
) -> Result<Option<EndpointTask>> {
    let Some(bind) = &config.endpoint_bind else {
        return Ok(None);
    };

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind address endpoint on {}", bind))?;

    let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
    let task = tokio::spawn(ispwatch_endpoint::serve(listener, counters, async move {
        let _ = stopped.await;
    }));

    Ok(Some((stop, task)))
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
