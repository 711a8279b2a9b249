//! Host configuration: the engine tables plus the explicit host context
//! that the session host needs (where results go, disclaimer state).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use vscreen_experiment::EngineConfig;

pub const DEFAULT_RESULTS_PATH: &str = "vscreen-results.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostContext {
    pub disclaimer_accepted: bool,
    pub results_path: Option<PathBuf>,
}

impl HostContext {
    pub fn results_path(&self) -> PathBuf {
        self.results_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_PATH))
    }
}

#[derive(Debug, Default, Deserialize)]
struct HostSection {
    #[serde(default)]
    host: HostContext,
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub host: HostContext,
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Engine sections and `[host]` live in the same TOML file.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let engine = EngineConfig::from_toml_str(s)?;
        let section: HostSection = toml::from_str(s).context("invalid [host] section")?;
        Ok(Self {
            host: section.host,
            engine,
        })
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                Self::from_toml_str(&content)
                    .with_context(|| format!("failed to load config {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_and_engine_sections_share_a_file() {
        let config = AppConfig::from_toml_str(
            r#"
            [host]
            disclaimer_accepted = true
            results_path = "out/results.json"

            [color_vision]
            feedback_ms = 0
            "#,
        )
        .unwrap();
        assert!(config.host.disclaimer_accepted);
        assert_eq!(config.host.results_path(), PathBuf::from("out/results.json"));
        assert_eq!(config.engine.color_vision.feedback_ms, 0);
    }

    #[test]
    fn defaults_without_file() {
        let config = AppConfig::load(None).unwrap();
        assert!(!config.host.disclaimer_accepted);
        assert_eq!(config.host.results_path(), PathBuf::from(DEFAULT_RESULTS_PATH));
    }

    #[test]
    fn invalid_engine_section_is_reported() {
        let err = AppConfig::from_toml_str("[visual_acuity]\nsnellen_denominators = []\n")
            .unwrap_err();
        assert!(format!("{err:#}").contains("visual_acuity"));
    }
}
