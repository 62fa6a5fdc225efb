use std::str::FromStr;
use std::time::Duration;

use derby_execution::TableConfig;
use derby_types::{CHECKPOINT_ROUND, INITIAL_TOKENS, MAX_PLAYERS, ROUND_INTERVAL_MS, TRACK_LENGTH};
use serde::Deserialize;
use tracing::Level;

pub const DEFAULT_COMMENTARY_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_COMMENTARY_MODEL: &str = "gemini-3-flash-preview";

/// Service configuration, loaded from a YAML file or `RACE_TABLE_*` environment variables.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RaceTableConfig {
    pub host: String,
    pub port: u16,
    /// Delay between racing rounds.
    pub round_interval_ms: u64,
    pub track_length: u32,
    pub checkpoint_round: u32,
    pub initial_stake: u64,
    pub max_players: usize,
    /// Fixed RNG seed; races are seeded from entropy when absent.
    pub seed: Option<u64>,
    pub log_level: String,
    pub commentary: CommentaryConfig,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CommentaryConfig {
    pub endpoint: String,
    pub model: String,
    /// Without a key the service narrates locally.
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl Default for RaceTableConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9124,
            round_interval_ms: ROUND_INTERVAL_MS,
            track_length: TRACK_LENGTH,
            checkpoint_round: CHECKPOINT_ROUND,
            initial_stake: INITIAL_TOKENS,
            max_players: MAX_PLAYERS,
            seed: None,
            log_level: "info".to_string(),
            commentary: CommentaryConfig::default(),
        }
    }
}

impl Default for CommentaryConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_COMMENTARY_ENDPOINT.to_string(),
            model: DEFAULT_COMMENTARY_MODEL.to_string(),
            api_key: None,
            timeout_ms: 8_000,
        }
    }
}

impl RaceTableConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let commentary = CommentaryConfig {
            endpoint: read_string("RACE_TABLE_COMMENTARY_ENDPOINT", &defaults.commentary.endpoint),
            model: read_string("RACE_TABLE_COMMENTARY_MODEL", &defaults.commentary.model),
            api_key: read_optional("RACE_TABLE_COMMENTARY_API_KEY")
                .or_else(|| read_optional("API_KEY")),
            timeout_ms: read_ms("RACE_TABLE_COMMENTARY_TIMEOUT_MS", defaults.commentary.timeout_ms),
        };
        Self {
            host: read_string("RACE_TABLE_HOST", &defaults.host),
            port: read_parsed("RACE_TABLE_PORT", defaults.port),
            round_interval_ms: read_ms("RACE_TABLE_ROUND_INTERVAL_MS", defaults.round_interval_ms),
            track_length: read_parsed("RACE_TABLE_TRACK_LENGTH", defaults.track_length),
            checkpoint_round: read_parsed("RACE_TABLE_CHECKPOINT_ROUND", defaults.checkpoint_round),
            initial_stake: read_parsed("RACE_TABLE_INITIAL_STAKE", defaults.initial_stake),
            max_players: read_parsed("RACE_TABLE_MAX_PLAYERS", defaults.max_players),
            seed: read_optional("RACE_TABLE_SEED").and_then(|raw| raw.parse().ok()),
            log_level: read_string("RACE_TABLE_LOG_LEVEL", &defaults.log_level),
            commentary,
        }
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.round_interval_ms == 0 {
            return Err("round_interval_ms must be greater than zero");
        }
        if self.commentary.timeout_ms == 0 {
            return Err("commentary.timeout_ms must be greater than zero");
        }
        if Level::from_str(&self.log_level).is_err() {
            return Err("log_level must be one of trace, debug, info, warn, error");
        }
        self.table_config().validate()
    }

    pub fn table_config(&self) -> TableConfig {
        TableConfig {
            track_length: self.track_length,
            checkpoint_round: self.checkpoint_round,
            initial_stake: self.initial_stake,
            max_players: self.max_players,
            ..TableConfig::default()
        }
    }

    pub fn round_interval(&self) -> Duration {
        Duration::from_millis(self.round_interval_ms)
    }

    pub fn commentary_timeout(&self) -> Duration {
        Duration::from_millis(self.commentary.timeout_ms)
    }

    /// Log level, falling back to `INFO` for unparseable values.
    pub fn level(&self) -> Level {
        Level::from_str(&self.log_level).unwrap_or(Level::INFO)
    }
}

fn read_ms(key: &str, fallback: u64) -> u64 {
    read_parsed(key, fallback)
}

fn read_parsed<T: FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse::<T>().ok())
        .unwrap_or(fallback)
}

fn read_string(key: &str, fallback: &str) -> String {
    read_optional(key).unwrap_or_else(|| fallback.to_string())
}

fn read_optional(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim().to_string();
        (!trimmed.is_empty()).then_some(trimmed)
    })
}
