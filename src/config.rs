//! Application-level configuration loading: game defaults and request limits.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "DJ_GAMES_BACK_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Countdown length used when a session does not specify one.
    pub default_target_gap_seconds: u32,
    /// Shortest countdown a host may configure.
    pub min_target_gap_seconds: u32,
    /// Number of bingo cards printed when a session does not specify it.
    pub default_card_count: u32,
    /// Upper bound on printed bingo cards per session.
    pub max_card_count: u32,
    /// Rounds used by round-based games when unspecified.
    pub default_round_count: u32,
    /// Upper bound for a single session mutation.
    pub transition_timeout: Duration,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        default_target_gap_seconds = app_config.default_target_gap_seconds,
                        default_card_count = app_config.default_card_count,
                        "loaded game defaults from config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Clamp a requested countdown to the configured minimum, using the default when absent.
    pub fn target_gap_seconds(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_target_gap_seconds)
            .max(self.min_target_gap_seconds)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_target_gap_seconds: 45,
            min_target_gap_seconds: 10,
            default_card_count: 40,
            max_card_count: 500,
            default_round_count: 3,
            transition_timeout: Duration::from_millis(5_000),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    default_target_gap_seconds: Option<u32>,
    min_target_gap_seconds: Option<u32>,
    default_card_count: Option<u32>,
    max_card_count: Option<u32>,
    default_round_count: Option<u32>,
    transition_timeout_ms: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        let min_target_gap_seconds = value
            .min_target_gap_seconds
            .unwrap_or(defaults.min_target_gap_seconds)
            .max(1);
        Self {
            default_target_gap_seconds: value
                .default_target_gap_seconds
                .unwrap_or(defaults.default_target_gap_seconds)
                .max(min_target_gap_seconds),
            min_target_gap_seconds,
            default_card_count: value
                .default_card_count
                .unwrap_or(defaults.default_card_count),
            max_card_count: value.max_card_count.unwrap_or(defaults.max_card_count),
            default_round_count: value
                .default_round_count
                .unwrap_or(defaults.default_round_count)
                .max(1),
            transition_timeout: value
                .transition_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.transition_timeout),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
