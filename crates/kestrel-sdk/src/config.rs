// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Runner configuration.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Settings read once, when the host driver initialises the runner.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// Which registered application to run. Required only when several are registered.
    pub app_name: Option<String>,
    /// Default `env_logger` filter; `RUST_LOG` takes precedence.
    pub log_filter: String,
    /// How many queued events to route per frame. Platform events delivered in the
    /// frame share the limit and queue behind the backlog once it is spent.
    /// `0` drains the queue.
    pub max_pump_per_frame: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            app_name: None,
            log_filter: "info".to_owned(),
            max_pump_per_frame: 0,
        }
    }
}

impl RunnerConfig {
    /// Environment variable naming a JSON configuration file.
    pub const ENV_VAR: &'static str = "KESTREL_CONFIG";

    /// Parses a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse runner configuration")
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read runner configuration {}", path.display()))?;
        Self::from_json(&json)
    }

    /// Loads the file named by [`ENV_VAR`](Self::ENV_VAR), or the defaults when it is unset.
    pub fn load() -> Result<Self> {
        match std::env::var_os(Self::ENV_VAR) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// The per-frame pump limit as a count, with `0` meaning unbounded.
    pub fn pump_limit(&self) -> usize {
        match self.max_pump_per_frame {
            0 => usize::MAX,
            n => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_keep_defaults() {
        let config = RunnerConfig::from_json(r#"{ "app_name": "demo" }"#).unwrap();
        assert_eq!(config.app_name.as_deref(), Some("demo"));
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.pump_limit(), usize::MAX);
    }

    #[test]
    fn pump_limit_is_taken_as_is_when_set() {
        let config = RunnerConfig::from_json(r#"{ "max_pump_per_frame": 8 }"#).unwrap();
        assert_eq!(config.pump_limit(), 8);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(RunnerConfig::from_json(r#"{ "tick_rate": 60 }"#).is_err());
    }

    #[test]
    fn missing_file_reports_its_path() {
        let err = RunnerConfig::from_file("/nonexistent/kestrel.json").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/kestrel.json"));
    }
}
