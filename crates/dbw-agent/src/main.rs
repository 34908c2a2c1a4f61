//! Drive-by-wire bridge agent: decodes Hooke2/LMT chassis reports and
//! drives the control frame loops on a SocketCAN channel.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use dbw_agent::config::AgentConfig;
use dbw_agent::intent::{SharedBurstParams, SharedIntent};
use dbw_agent::session::{self, Session};
use dbw_agent::status_report;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "dbw-agent starting");

    // ── Load config ─────────────────────────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/etc/dbw-bridge/agent.toml".to_string());

    let config = AgentConfig::from_file(&config_path)?;
    tracing::info!(
        protocol = %config.protocol,
        channel = %config.bus.channel,
        bitrate = config.bus.bitrate,
        "config loaded"
    );

    // ── Bus ─────────────────────────────────────────────────────
    let bus = session::open_bus(&config.bus)?;

    // ── Operator inputs ─────────────────────────────────────────
    let intents = Arc::new(SharedIntent::new(config.initial_intent()));
    let bursts = Arc::new(SharedBurstParams::new(config.burst_params()));

    // ── Session ─────────────────────────────────────────────────
    let session = Session::start(bus, config.session_settings(), intents, bursts);
    let events = session.subscribe();

    tracing::info!(session_id = %session.id(), "dbw-agent ready");

    tokio::select! {
        // Periodic vehicle status lines
        () = status_report::run(session.status(), config.status_interval(), config.stale_after()) => {
            tracing::error!("status reporter exited unexpectedly");
        }
        // Session faults and milestones
        () = status_report::log_events(events) => {
            tracing::error!("session event stream closed unexpectedly");
        }
        // Graceful shutdown on SIGINT
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    session.shutdown().await;
    tracing::info!("dbw-agent stopped");
    Ok(())
}
