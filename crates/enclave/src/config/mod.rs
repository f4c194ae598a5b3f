use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

mod loader;

/// Example configuration embedded at compile time.
///
/// Library users can access this to generate a starter config file.
pub const EXAMPLE_CONFIG: &str = include_str!("../../enclave.example.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Config for Enclave
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base directory that unit names are resolved against.
    #[serde(default = "default_unit_root")]
    pub unit_root: PathBuf,

    /// Candidate artifact extensions, tried in order when resolving a unit
    /// name to a file.
    #[serde(default = "default_unit_extensions")]
    pub unit_extensions: Vec<String>,

    /// Reclamation polling policy applied after a boundary is unloaded.
    #[serde(default)]
    pub reclaim: ReclaimPolicy,
}

/// How hard the runner tries to confirm that a torn-down boundary has
/// actually become unreachable.
///
/// Exhausting the budget is a best-effort outcome: the runner logs a warning
/// and returns normally. It never turns into an error.
#[derive(Debug, Clone, Deserialize)]
pub struct ReclaimPolicy {
    /// Maximum number of reachability checks before giving up.
    #[serde(default = "default_reclaim_attempts")]
    pub attempts: u32,

    /// Pause between checks, in milliseconds.
    #[serde(default = "default_reclaim_pause_ms")]
    pub pause_ms: u64,
}

impl Config {
    /// Create a config rooted at the given unit directory, with default
    /// extensions and reclaim policy
    pub fn with_unit_root(unit_root: impl Into<PathBuf>) -> Self {
        Self {
            unit_root: unit_root.into(),
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::parse_toml(EXAMPLE_CONFIG).expect("embedded default config should be valid")
    }
}

impl Default for ReclaimPolicy {
    fn default() -> Self {
        Self {
            attempts: default_reclaim_attempts(),
            pause_ms: default_reclaim_pause_ms(),
        }
    }
}

fn default_unit_root() -> PathBuf {
    PathBuf::from("units")
}

fn default_unit_extensions() -> Vec<String> {
    vec!["wasm".to_string(), "wat".to_string()]
}

fn default_reclaim_attempts() -> u32 {
    10
}

fn default_reclaim_pause_ms() -> u64 {
    10
}
