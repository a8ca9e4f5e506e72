//! Typed configuration from environment variables or a TOML file.
//!
//! Loads once at startup and fails fast on malformed values.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::EqualTaskAction;
use crate::queue::QueueOptions;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub log_level: String,
    pub otel_endpoint: Option<String>,
    pub equal_task_action: EqualTaskAction,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            otel_endpoint: None,
            equal_task_action: EqualTaskAction::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let equal_task_action = match lookup("WORKQ_EQUAL_TASK_ACTION") {
            Some(raw) => raw.parse().map_err(|_| {
                Error::Config(format!("WORKQ_EQUAL_TASK_ACTION has unknown value {raw:?}"))
            })?,
            None => defaults.equal_task_action,
        };

        Ok(Self {
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            otel_endpoint: lookup("OTEL_ENDPOINT").filter(|s| !s.is_empty()),
            equal_task_action,
        })
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::Config(format!("invalid TOML config: {e}")))
    }

    /// Load a TOML config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// Queue options using the configured policy and `==` for equality.
    pub fn queue_options<A: PartialEq + 'static>(&self) -> QueueOptions<A> {
        QueueOptions::default().equal_task_action(self.equal_task_action)
    }
}
