//! Shared types used across all mind crates.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::render::RenderState;

/// Boxed error type threaded through every async seam.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Reflection line used whenever no generative output is available for a cycle.
pub const FALLBACK_REFLECTION: &str = "Local reflection: calm, curious, incremental adjustment.";

/// Current wall-clock time as Unix milliseconds.
pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// What woke the cognition loop for a cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// External stimulus delivered through the gateway.
    Stimulus { data: serde_json::Value },
    /// Periodic idle tick. `drift_secs` is the age of the mind at trigger time.
    Tick { drift_secs: i64 },
}

impl Trigger {
    /// JSON rendering used when the trigger is quoted inside a prompt.
    pub fn describe(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{\"kind\":\"tick\"}".to_string())
    }
}

/// One frame pushed to every connected observer over the broadcast channel.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Signal {
    /// A single streamed token of the in-progress thought.
    Thought(String),
    /// The full render state after a committed cycle.
    RenderDelta(RenderState),
    /// A notable side event (tool results, boot notices).
    Event(serde_json::Value),
}

/// Global application configuration (gateway + loop pacing). Load from TOML or env.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MindConfig {
    /// Application identity shown in logs and `/api/state`.
    pub app_name: String,
    /// HTTP port for the gateway.
    pub port: u16,
    /// Base directory for the Sled DB.
    pub storage_path: String,
    /// Chat model name passed to the provider.
    pub model: String,
    /// Embedding model name passed to the provider.
    pub embed_model: String,
    /// Feral mode: faster ticks, two tool rounds, amplified render proposals.
    #[serde(default)]
    pub feral: bool,
    /// Override for the idle tick interval in milliseconds.
    #[serde(default)]
    pub tick_ms: Option<u64>,
    /// If true, the gateway serves the static canvas from `public/`.
    #[serde(default)]
    pub frontend_enabled: bool,
    /// Upper bound on any single provider HTTP call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl MindConfig {
    /// Idle tick interval: explicit override, else the mode default.
    pub fn effective_tick(&self) -> Duration {
        let ms = self.tick_ms.unwrap_or(if self.feral { 3_500 } else { 15_000 });
        Duration::from_millis(ms)
    }

    /// Maximum tool invocations per cycle.
    pub fn tool_rounds(&self) -> usize {
        if self.feral {
            2
        } else {
            1
        }
    }

    /// Amplitude multiplier applied to the heuristic render walk.
    pub fn proposal_amplitude(&self) -> f64 {
        if self.feral {
            1.9
        } else {
            1.0
        }
    }

    /// Load config from file and environment. Precedence: env `MIND_CONFIG` path > `config/gateway.toml` > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path = std::env::var("MIND_CONFIG").unwrap_or_else(|_| "config/gateway.toml".to_string());
        let builder = config::Config::builder()
            .set_default("app_name", "mind")?
            .set_default("port", 3000_i64)?
            .set_default("storage_path", "./data")?
            .set_default("model", "gpt-4o-mini")?
            .set_default("embed_model", "text-embedding-3-small")?
            .set_default("feral", false)?
            .set_default("frontend_enabled", false)?
            .set_default("request_timeout_secs", 120_i64)?;

        let path = Path::new(&config_path);
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("MIND").separator("__"))
            .build()?;

        built.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_config() -> MindConfig {
        MindConfig {
            app_name: "test".to_string(),
            port: 0,
            storage_path: "./data".to_string(),
            model: "gpt-4o-mini".to_string(),
            embed_model: "text-embedding-3-small".to_string(),
            feral: false,
            tick_ms: None,
            frontend_enabled: false,
            request_timeout_secs: 120,
        }
    }

    #[test]
    fn tick_defaults_follow_mode() {
        let mut config = bare_config();
        assert_eq!(config.effective_tick(), Duration::from_millis(15_000));
        assert_eq!(config.tool_rounds(), 1);
        assert_eq!(config.proposal_amplitude(), 1.0);

        config.feral = true;
        assert_eq!(config.effective_tick(), Duration::from_millis(3_500));
        assert_eq!(config.tool_rounds(), 2);
        assert_eq!(config.proposal_amplitude(), 1.9);
    }

    #[test]
    fn explicit_tick_overrides_mode() {
        let mut config = bare_config();
        config.feral = true;
        config.tick_ms = Some(60_000);
        assert_eq!(config.effective_tick(), Duration::from_millis(60_000));
    }

    #[test]
    fn signal_serializes_as_tagged_frame() {
        let frame = serde_json::to_value(Signal::Thought("hi".to_string())).unwrap();
        assert_eq!(frame["type"], "thought");
        assert_eq!(frame["data"], "hi");

        let frame = serde_json::to_value(Signal::RenderDelta(RenderState::default())).unwrap();
        assert_eq!(frame["type"], "render_delta");
        assert_eq!(frame["data"]["ringDensity"], 36.0);
    }
}
