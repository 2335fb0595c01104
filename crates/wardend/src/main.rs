//! wardend - The sitewarden native-messaging host
//!
//! The browser starts this process and talks to it over stdin/stdout.
//! It wires together all the components:
//! - Configuration loading
//! - Store initialization
//! - Core engine
//! - Native-messaging channel and the browser host behind it
//! - Scheduler for flushes, sweeps and the daily reset

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use warden_config::load_config_or_default;
use warden_core::{CoreEngine, CoreEvent, Scheduler};
use warden_host_api::BrowserHost;
use warden_ipc::{ChannelMessage, NativeBrowser, NativeChannel};
use warden_store::{SqliteStore, Store};
use warden_util::{default_config_path, MonotonicInstant, WARDEN_CONFIG_ENV, WARDEN_DATA_DIR_ENV};

/// wardend - Time tracking and site blocking for the browser
#[derive(Parser, Debug)]
#[command(name = "wardend")]
#[command(about = "Native-messaging host for time tracking and site blocking", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/sitewarden/config.toml)
    #[arg(short, long, env = WARDEN_CONFIG_ENV, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override
    #[arg(short, long, env = WARDEN_DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    /// Log level (RUST_LOG takes precedence)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Arguments the browser appends when launching a native host
    /// (caller origin, manifest path, window handle)
    #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
    browser_args: Vec<String>,
}

/// Main service state
struct Service {
    engine: CoreEngine,
    channel: Arc<NativeChannel>,
    inbound: tokio::sync::mpsc::UnboundedReceiver<ChannelMessage>,
    scheduler: Scheduler,
}

impl Service {
    async fn new(args: &Args) -> Result<Self> {
        let mut config = load_config_or_default(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        if let Some(data_dir) = &args.data_dir {
            config.data_dir = data_dir.clone();
        }

        info!(
            config_path = %args.config.display(),
            flush_secs = config.schedule.flush_interval.as_secs(),
            sweep_secs = config.schedule.sweep_interval.as_secs(),
            "Configuration loaded"
        );

        std::fs::create_dir_all(&config.data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", config.data_dir))?;

        let db_path = config.store_path();
        let store: Arc<dyn Store> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );

        info!(db_path = %db_path.display(), "Store initialized");

        let (channel, inbound) = NativeChannel::start(tokio::io::stdin(), tokio::io::stdout());
        let host: Arc<dyn BrowserHost> = Arc::new(NativeBrowser::new(channel.clone()));

        let engine = CoreEngine::load(store, host, &config)
            .await
            .context("Failed to initialize core engine")?;

        let scheduler = Scheduler::starting_at(config.schedule, &warden_util::now());

        Ok(Self {
            engine,
            channel,
            inbound,
            scheduler,
        })
    }

    async fn run(mut self) -> Result<()> {
        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;

        info!(enabled = self.engine.is_enabled(), "Service running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }

                task = self.scheduler.next() => {
                    debug!(task = ?task, "Scheduled task due");
                    let events = self
                        .engine
                        .run_task(task, warden_util::now(), MonotonicInstant::now())
                        .await;
                    log_events(&events);
                }

                message = self.inbound.recv() => {
                    match message {
                        Some(message) => self.handle_message(message).await,
                        None => {
                            info!("Browser disconnected, shutting down");
                            break;
                        }
                    }
                }
            }
        }

        // Credit whatever the open session accrued before exiting
        let events = self
            .engine
            .focus_lost(warden_util::now(), MonotonicInstant::now())
            .await;
        log_events(&events);

        info!("Service stopped");
        Ok(())
    }

    async fn handle_message(&mut self, message: ChannelMessage) {
        let now = warden_util::now();
        let now_mono = MonotonicInstant::now();

        match message {
            ChannelMessage::Event(event) => {
                debug!(event = ?event, "Browser event");
                let events = self.engine.handle_browser_event(event, now, now_mono).await;
                log_events(&events);
            }
            ChannelMessage::Request(request) => {
                let request_id = request.request_id;
                debug!(request_id, command = ?request.command, "Request received");

                let response = self.engine.handle_request(request, now, now_mono).await;
                if let Err(e) = self.channel.respond(response) {
                    warn!(request_id, error = %e, "Failed to send response");
                }
            }
        }
    }
}

fn log_events(events: &[CoreEvent]) {
    for event in events {
        debug!(event = ?event, "Core event");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries native-messaging frames, so logs go to stderr
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        caller = ?args.browser_args.first(),
        mock_time = warden_util::is_mock_time_active(),
        "wardend starting"
    );

    let service = Service::new(&args).await?;
    service.run().await
}
