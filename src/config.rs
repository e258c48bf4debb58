// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const ENV_PATH: &str = "NEWS_AGGREGATOR_CONFIG";

/// Operator-tunable settings for the ingestion core. Everything has a
/// default, so a missing config file is not an error.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Articles older than this many days are eligible for the sweeper.
    pub retention_days: u32,
    /// Bounded timeout applied to every adapter fetch.
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            retention_days: 30,
            fetch_timeout_secs: 30,
            user_agent: "news-aggregator/0.1".to_string(),
        }
    }
}

impl AggregatorConfig {
    /// Load settings from an explicit TOML path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading aggregator config from {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("parsing aggregator config from {}", path.display()))
    }

    /// Load settings using env var + fallbacks:
    /// 1) $NEWS_AGGREGATOR_CONFIG
    /// 2) config/aggregator.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("NEWS_AGGREGATOR_CONFIG points to non-existent path"));
        }
        let toml_p = PathBuf::from("config/aggregator.toml");
        if toml_p.exists() {
            return Self::load_from(&toml_p);
        }
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let cfg: AggregatorConfig = toml::from_str("retention_days = 7").unwrap();
        assert_eq!(cfg.retention_days, 7);
        assert_eq!(cfg.fetch_timeout_secs, 30);
        assert_eq!(cfg.user_agent, "news-aggregator/0.1");
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        // Isolate CWD in a temp dir so a real config/ in the repo can't leak in.
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();

        env::remove_var(ENV_PATH);

        // No files in the temp CWD: defaults.
        let cfg = AggregatorConfig::load_default().unwrap();
        assert_eq!(cfg.retention_days, 30);

        // Env var takes precedence.
        let p = tmp.path().join("aggregator.toml");
        fs::write(&p, "retention_days = 3\nfetch_timeout_secs = 5").unwrap();
        env::set_var(ENV_PATH, p.display().to_string());
        let cfg2 = AggregatorConfig::load_default().unwrap();
        assert_eq!(cfg2.retention_days, 3);
        assert_eq!(cfg2.fetch_timeout_secs, 5);
        env::remove_var(ENV_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
