// src/config.rs
// Runtime settings: TOML file with serde defaults, env override for the path.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PATH: &str = "INFOHUB_CONFIG";
const DEFAULT_PATH: &str = "config/infohub.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory with `core.txt` / `secondary.txt` (and optional OPML).
    pub sources_dir: PathBuf,
    /// Directory with the three rule files.
    pub rules_dir: PathBuf,
    /// Durable state: rolling index, health table, archives.
    pub data_dir: PathBuf,
    /// Rendered artifacts, regenerated every run.
    pub public_dir: PathBuf,

    /// Treat absent rule files as empty sets instead of failing.
    pub allow_missing_rules: bool,

    /// Consecutive failures before a source enters cooldown.
    pub disable_threshold: u32,
    /// Cooldown length in hours.
    pub cooldown_hours: i64,

    /// Short TTL tier for urgent notices, in hours.
    pub urgent_ttl_hours: i64,
    /// Default TTL tier, in days.
    pub default_ttl_days: i64,

    /// Per-request fetch timeout, in seconds.
    pub fetch_timeout_secs: u64,
    /// Item cap for the JSON and Atom outputs.
    pub top_n: usize,

    /// Run repeatedly on an interval instead of once.
    pub loop_interval_secs: Option<u64>,
    /// Optional budget for the fetch phase; sources not yet attempted
    /// when it lapses wait for the next run, with no health penalty.
    pub run_deadline_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sources_dir: PathBuf::from("sources"),
            rules_dir: PathBuf::from("rules"),
            data_dir: PathBuf::from("data"),
            public_dir: PathBuf::from("public"),
            allow_missing_rules: false,
            disable_threshold: 3,
            cooldown_hours: 24,
            urgent_ttl_hours: 72,
            default_ttl_days: 30,
            fetch_timeout_secs: 20,
            top_n: 200,
            loop_interval_secs: None,
            run_deadline_secs: None,
        }
    }
}

impl Settings {
    /// Load from an explicit TOML path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Load using `$INFOHUB_CONFIG`, then `config/infohub.toml`, then
    /// built-in defaults. An env path that does not exist is an error;
    /// the default path missing is not.
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("INFOHUB_CONFIG points to non-existent path"));
        }
        let default = PathBuf::from(DEFAULT_PATH);
        if default.exists() {
            return Self::load_from(&default);
        }
        Ok(Self::default())
    }

    pub fn cooldown(&self) -> chrono::Duration {
        chrono::Duration::hours(self.cooldown_hours)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn expiry_policy(&self) -> crate::expiry::ExpiryPolicy {
        crate::expiry::ExpiryPolicy {
            urgent_ttl: chrono::Duration::hours(self.urgent_ttl_hours),
            default_ttl: chrono::Duration::days(self.default_ttl_days),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_fills_defaults() {
        let s: Settings = toml::from_str("default_ttl_days = 14\ntop_n = 300\n").unwrap();
        assert_eq!(s.default_ttl_days, 14);
        assert_eq!(s.top_n, 300);
        assert_eq!(s.disable_threshold, 3);
        assert_eq!(s.urgent_ttl_hours, 72);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<Settings>("ttl = 5\n").is_err());
    }

    #[serial_test::serial]
    #[test]
    fn env_path_must_exist() {
        std::env::set_var(ENV_PATH, "/definitely/not/here.toml");
        assert!(Settings::load_default().is_err());
        std::env::remove_var(ENV_PATH);
    }
}
