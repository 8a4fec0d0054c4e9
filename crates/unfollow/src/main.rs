use std::io;
use std::time::Duration;

use clap::Parser;
use snafu::{ResultExt, Snafu};
use tokio::signal;
use tokio::sync::watch;
use tracing::level_filters::LevelFilter;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use unfollow::config::{self, RunConfig};
use unfollow::fetcher::HttpPageFetcher;
use unfollow::orchestrator::{Orchestrator, RunError};
use unfollow::remover::HttpFollowerRemover;
use unfollow::transport::{self, SessionConfig, Transport, TransportError};
use unfollow::{LOG_TARGET, TARGET_USER_ID};
use unfollow_core::ProcessStatus;

#[derive(Debug, Snafu)]
pub enum CliError {
    #[snafu(display("Logging initialization failed"))]
    Logging,
    #[snafu(display("Transport error: {source}"))]
    Transport { source: TransportError },
    #[snafu(display("Run failed: {source}"))]
    Run { source: RunError },
}

pub type CliResult<T> = std::result::Result<T, CliError>;

/// Removes followers the account owner does not follow back
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Opts {
    /// `Cookie` header of a logged-in session
    #[arg(long, env = "UNFOLLOW_COOKIE", hide_env_values = true)]
    pub cookie: String,

    /// CSRF token of the session (the `csrftoken` cookie)
    #[arg(long, env = "UNFOLLOW_CSRF_TOKEN", hide_env_values = true)]
    pub csrf_token: Option<String>,

    /// Web application id sent with every request
    #[arg(long, env = "UNFOLLOW_APP_ID", default_value = transport::DEFAULT_APP_ID)]
    pub app_id: String,

    /// Minimum delay before every request in milliseconds
    #[arg(long, env = "UNFOLLOW_THROTTLE_MIN_MS", default_value_t = millis(config::DEFAULT_THROTTLE_MIN))]
    pub throttle_min_ms: u64,

    /// Maximum delay before every request in milliseconds
    #[arg(long, env = "UNFOLLOW_THROTTLE_MAX_MS", default_value_t = millis(config::DEFAULT_THROTTLE_MAX))]
    pub throttle_max_ms: u64,

    /// Pause after being rate limited in seconds
    #[arg(long, env = "UNFOLLOW_COOLDOWN_SECS", default_value_t = config::DEFAULT_COOLDOWN.as_secs())]
    pub cooldown_secs: u64,

    /// Followers per page
    #[arg(long, env = "UNFOLLOW_PAGE_SIZE", default_value_t = config::DEFAULT_PAGE_SIZE)]
    pub page_size: u32,

    /// Timeout of a single request in seconds
    #[arg(long, env = "UNFOLLOW_REQUEST_TIMEOUT_SECS", default_value_t = config::DEFAULT_REQUEST_TIMEOUT.as_secs())]
    pub request_timeout_secs: u64,

    /// Attempts to fetch a page before giving up
    #[arg(long, env = "UNFOLLOW_FETCH_ATTEMPTS", default_value_t = config::DEFAULT_FETCH_ATTEMPTS)]
    pub fetch_attempts: usize,

    /// Stop after removing this many followers
    #[arg(long, env = "UNFOLLOW_MAX_REMOVALS")]
    pub max_removals: Option<usize>,

    /// Keep followers with a pending follow request from the owner
    #[arg(long)]
    pub spare_requested: bool,
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Opts {
    fn run_config(&self) -> RunConfig {
        RunConfig {
            throttle_min: Duration::from_millis(self.throttle_min_ms),
            throttle_max: Duration::from_millis(self.throttle_max_ms),
            cooldown: Duration::from_secs(self.cooldown_secs),
            page_size: self.page_size,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            fetch_attempts: self.fetch_attempts.max(1),
            max_removals: self.max_removals,
            spare_requested: self.spare_requested,
            ..RunConfig::default()
        }
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            cookie: self.cookie.clone(),
            csrf_token: self.csrf_token.clone(),
            app_id: self.app_id.clone(),
            user_agent: transport::DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

#[snafu::report]
#[tokio::main]
async fn main() -> CliResult<()> {
    init_logging()?;

    let opts = Opts::parse();
    let config = opts.run_config();

    info!(
        target: LOG_TARGET,
        target_id = TARGET_USER_ID,
        throttle_min_ms = opts.throttle_min_ms,
        throttle_max_ms = opts.throttle_max_ms,
        cooldown_secs = opts.cooldown_secs,
        page_size = opts.page_size,
        max_removals = ?opts.max_removals,
        "Starting"
    );

    let http = Transport::new(
        transport::BASE_URL,
        &opts.session_config(),
        config.throttle(),
        config.request_timeout,
    )
    .context(TransportSnafu)?;

    let fetcher = HttpPageFetcher::new(http.clone(), TARGET_USER_ID, config.page_size);
    let remover = HttpFollowerRemover::new(http);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!(target: LOG_TARGET, "Shutdown signal received");
        if shutdown_tx.send(true).is_err() {
            debug!(target: LOG_TARGET, "Run already finished");
        }
    });

    let mut orchestrator = Orchestrator::new(fetcher, remover, config).with_shutdown(shutdown_rx);
    let res = orchestrator.run().await;

    print_summary(orchestrator.status());

    res.context(RunSnafu)
}

fn print_summary(status: &ProcessStatus) {
    println!();
    println!("Run {}", status.status());
    println!("  Followers: {}", status.total_followers());
    println!("  Removed: {}", status.count_unfollowed());
    println!("  Skipped: {}", status.skipped());
    println!("  Failed: {}", status.failed());
    println!("  Rate limited: {}", status.rate_limited());
    println!("  Pages: {}", status.pages_fetched());

    for (i, user) in status.unfollowed().iter().enumerate() {
        println!("  [{}] {user}", i + 1);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(target: LOG_TARGET, err = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(err) => {
                warn!(target: LOG_TARGET, err = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

pub fn init_logging() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|_| CliError::Logging)?;

    Ok(())
}
