//! Bridge agent configuration, loadable from TOML.

use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;

use dbw_canbus::{BurstParams, BurstRequest};
use dbw_protocol::{CommandIntent, DEFAULT_BITRATE, Protocol};

use crate::control::SendMode;
use crate::scheduler::LoopTiming;
use crate::session::SessionSettings;

/// Top-level configuration for the bridge agent.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Vehicle protocol spoken on the bus.
    #[serde(default)]
    pub protocol: Protocol,
    /// Start decoding reports immediately.
    #[serde(default = "default_true")]
    pub receive_on_start: bool,
    /// Transmit behavior at startup.
    #[serde(default)]
    pub send_mode: SendMode,
    /// Vehicle status log interval in seconds.
    #[serde(default = "default_status_interval")]
    pub status_interval_secs: u64,
    /// Status older than this is reported as stale.
    #[serde(default = "default_stale_after")]
    pub stale_after_ms: u64,
    pub bus: BusConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    /// Intent used by continuous mode. Defaults to the disengaged intent.
    #[serde(default)]
    pub intent: Option<CommandIntent>,
    /// Parameters for burst mode.
    #[serde(default)]
    pub burst: Option<BurstConfig>,
}

/// CAN channel settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BusConfig {
    /// SocketCAN interface name (e.g., "can0"), or "mock" for a dry run.
    pub channel: String,
    #[serde(default = "default_bitrate")]
    pub bitrate: u32,
}

/// Loop timing knobs, all in milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_recv_timeout")]
    pub recv_timeout_ms: u64,
    #[serde(default = "default_idle_poll")]
    pub idle_poll_ms: u64,
    #[serde(default = "default_burst_retry")]
    pub burst_retry_ms: u64,
    #[serde(default = "default_send_timeout")]
    pub send_timeout_ms: u64,
}

/// Burst parameters as text, the same way an operator would type them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BurstConfig {
    pub id: String,
    #[serde(default)]
    pub data: Vec<String>,
    #[serde(default = "default_burst_length")]
    pub length: String,
    #[serde(default = "default_burst_count")]
    pub count: String,
    #[serde(default = "default_burst_interval")]
    pub interval_ms: String,
    #[serde(default)]
    pub increment_id: bool,
    #[serde(default)]
    pub extended: bool,
}

fn default_true() -> bool {
    true
}

fn default_status_interval() -> u64 {
    1
}

fn default_stale_after() -> u64 {
    500
}

fn default_bitrate() -> u32 {
    DEFAULT_BITRATE
}

fn default_recv_timeout() -> u64 {
    100
}

fn default_idle_poll() -> u64 {
    100
}

fn default_burst_retry() -> u64 {
    100
}

fn default_send_timeout() -> u64 {
    10
}

fn default_burst_length() -> String {
    "8".to_string()
}

fn default_burst_count() -> String {
    "1".to_string()
}

fn default_burst_interval() -> String {
    "100".to_string()
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            recv_timeout_ms: default_recv_timeout(),
            idle_poll_ms: default_idle_poll(),
            burst_retry_ms: default_burst_retry(),
            send_timeout_ms: default_send_timeout(),
        }
    }
}

impl TimingConfig {
    pub fn loop_timing(&self) -> LoopTiming {
        LoopTiming {
            recv_timeout: Duration::from_millis(self.recv_timeout_ms),
            idle_poll: Duration::from_millis(self.idle_poll_ms),
            burst_retry: Duration::from_millis(self.burst_retry_ms),
            send_timeout: Duration::from_millis(self.send_timeout_ms),
        }
    }
}

impl BurstConfig {
    pub fn to_params(&self) -> BurstParams {
        BurstParams {
            id: self.id.clone(),
            data: self.data.clone(),
            length: self.length.clone(),
            count: self.count.clone(),
            interval_ms: self.interval_ms.clone(),
            increment_id: self.increment_id,
            extended: self.extended,
        }
    }
}

impl AgentConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the loops cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.status_interval_secs == 0 {
            bail!("status_interval_secs must be at least 1");
        }
        if self.bus.channel.trim().is_empty() {
            bail!("bus.channel must not be empty");
        }
        if let Some(intent) = &self.intent {
            if intent.protocol() != self.protocol {
                bail!(
                    "intent is for {} but the session speaks {}",
                    intent.protocol(),
                    self.protocol
                );
            }
        }
        if self.send_mode == SendMode::Burst {
            let Some(burst) = &self.burst else {
                bail!("send_mode = \"burst\" needs a [burst] table");
            };
            BurstRequest::parse(&burst.to_params()).context("invalid [burst] table")?;
        }
        Ok(())
    }

    pub fn initial_intent(&self) -> CommandIntent {
        self.intent
            .clone()
            .unwrap_or_else(|| CommandIntent::idle(self.protocol))
    }

    pub fn burst_params(&self) -> BurstParams {
        self.burst
            .as_ref()
            .map(BurstConfig::to_params)
            .unwrap_or_default()
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval_secs)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_millis(self.stale_after_ms)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            protocol: self.protocol,
            receive_on_start: self.receive_on_start,
            send_mode: self.send_mode,
            timing: self.timing.loop_timing(),
        }
    }
}
