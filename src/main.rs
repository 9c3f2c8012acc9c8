//! MachineHub Agent — role-scoped fleet monitoring client.
//!
//! Main entry point that wires the two execution contexts together: the
//! background worker (push channel) and the foreground dashboard (live
//! channel, store, refresh loop), connected only by the relay bus.

use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use machinehub_core::config::AgentConfig;
use machinehub_core::error::AppError;
use machinehub_dashboard::{Dashboard, LogUiSink};
use machinehub_realtime::{RelayBus, WebSocketPushSource};
use machinehub_store::{DeviceStorage, keys};
use machinehub_worker::{LogNotificationSink, PushNotifier, run_push_worker};

/// Command-line options.
#[derive(Debug, Parser)]
#[command(name = "machinehub-agent", about = "MachineHub fleet monitoring agent")]
struct Cli {
    /// Configuration environment overlay (config/<env>.toml).
    #[arg(long, default_value = "development")]
    env: String,
    /// Bearer token; stored in device storage for later runs.
    #[arg(long)]
    token: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match AgentConfig::load(&cli.env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config, cli).await {
        tracing::error!("Agent error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AgentConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main agent run function
async fn run(config: AgentConfig, cli: Cli) -> Result<(), AppError> {
    tracing::info!("Starting MachineHub agent v{}", env!("CARGO_PKG_VERSION"));

    // ── Device storage and session ───────────────────────────────
    let storage = Arc::new(DeviceStorage::open(&config.storage));
    if let Some(token) = cli.token {
        storage.set(keys::TOKEN, token);
        storage.set(keys::AUTH, "true");
    }

    let api = Arc::new(machinehub_api::ApiClient::new(&config.api)?);
    api.set_token(storage.get(keys::TOKEN));

    // ── Relay bus between the two contexts ───────────────────────
    let relay = RelayBus::new(config.realtime.event_buffer_size);
    let shutdown = CancellationToken::new();

    // ── Background worker context ────────────────────────────────
    let notifier = Arc::new(PushNotifier::new(
        api.clone(),
        relay.clone(),
        Arc::new(LogNotificationSink),
        &config.notifications,
        &config.push,
    ));
    let worker_task = if config.push.enabled {
        let mut source =
            WebSocketPushSource::new(&config.push, api.base_url(), shutdown.clone());
        source.start();
        Some(tokio::spawn(run_push_worker(
            source,
            notifier,
            shutdown.clone(),
        )))
    } else {
        tracing::info!("Push channel disabled, relying on the live channel only");
        None
    };

    // ── Foreground dashboard context ─────────────────────────────
    let dashboard = Arc::new(Dashboard::new(config, api, storage, Arc::new(LogUiSink)));
    let handles = dashboard.start(relay).await;
    let mut logged_out = dashboard.logged_out();

    tracing::info!("Agent running; press Ctrl-C to stop");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown requested");
        }
        _ = logged_out.changed() => {
            tracing::warn!("Session rejected; sign in again with --token");
        }
    }

    // ── Teardown: no timers or sockets survive ───────────────────
    shutdown.cancel();
    handles.stop().await;
    if let Some(task) = worker_task {
        let _ = task.await;
    }

    tracing::info!("Agent stopped");
    Ok(())
}
