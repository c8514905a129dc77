//! File-based settings for the `flaky` binary.
//!
//! Settings come from a TOML file (explicit `--config`, else the first
//! candidate path that exists), fall back to defaults for anything missing,
//! and are finally overridden by command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use flaky_core::Configuration;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

const CANDIDATES: [&str; 2] = ["./flaky.toml", "./config/flaky.toml"];

fn parse_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    s.map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
        .transpose()
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,

    /// Transport-level timeout; none means the transport's own behavior.
    #[serde(deserialize_with = "parse_duration")]
    pub timeout: Option<Duration>,

    pub endpoint: Configuration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            endpoint: Configuration::default(),
        }
    }
}

impl Settings {
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let mut settings: Settings = toml::from_str(content)?;
        // Values from a file pass through the same clamping as flags.
        settings.endpoint = settings.endpoint.clamped();
        Ok(settings)
    }

    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Load `explicit` if given, else the first candidate file that exists,
    /// else defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::from_toml_file(path);
        }

        match CANDIDATES.iter().map(PathBuf::from).find(|p| p.is_file()) {
            Some(path) => {
                let settings = Self::from_toml_file(&path)?;
                tracing::debug!(path = %path.display(), ?settings, "settings loaded");
                Ok(settings)
            }
            None => {
                tracing::debug!("no settings file found, using defaults");
                Ok(Self::default())
            }
        }
    }
}
