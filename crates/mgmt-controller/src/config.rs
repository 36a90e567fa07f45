//! Controller configuration

use crate::error::ControllerError;
use crate::process::{ProcessType, RunningMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ControllerConfig {
    /// Kind of process
    pub process_type: ProcessType,

    /// Whether runtime steps run
    pub running_mode: RunningMode,

    /// Name of the local host; host controllers create `/host=<name>` at boot
    pub host_name: Option<String>,

    /// Properties available to `${...}` expressions
    pub properties: BTreeMap<String, String>,

    /// Default tracing filter, overridden by `RUST_LOG`
    pub log_filter: String,

    /// Log output format
    pub log_format: LogFormat,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            process_type: ProcessType::Server,
            running_mode: RunningMode::Normal,
            host_name: None,
            properties: BTreeMap::new(),
            log_filter: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from a TOML file
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    /// [`ControllerError::Config`] if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ControllerError> {
        match path {
            Some(p) if p.exists() => {
                let contents =
                    std::fs::read_to_string(p).map_err(|e| ControllerError::Config(e.to_string()))?;
                Self::from_toml(&contents)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// [`ControllerError::Config`] on malformed input.
    pub fn from_toml(contents: &str) -> Result<Self, ControllerError> {
        toml::from_str(contents).map_err(|e| ControllerError::Config(e.to_string()))
    }

    /// Host controller configuration for `host`
    #[must_use]
    pub fn host_controller(host: impl Into<String>) -> Self {
        Self {
            process_type: ProcessType::HostController,
            host_name: Some(host.into()),
            ..Self::default()
        }
    }

    /// Add an expression property
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ControllerConfig::default();
        assert!(config.process_type.is_server());
        assert!(config.host_name.is_none());
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_load_missing_config() {
        let config = ControllerConfig::load(Some(Path::new("/nonexistent/path/controller.toml")))
            .unwrap();
        assert_eq!(config, ControllerConfig::default());
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
process-type = "host-controller"
host-name = "master"
log-format = "json"

[properties]
"jboss.http.port" = "8080"
"#
        )
        .unwrap();

        let config = ControllerConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.process_type, ProcessType::HostController);
        assert_eq!(config.host_name.as_deref(), Some("master"));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.properties["jboss.http.port"], "8080");
        assert_eq!(config.running_mode, RunningMode::Normal);
    }

    #[test]
    fn test_malformed_config() {
        let err = ControllerConfig::from_toml("process-type = 3").unwrap_err();
        assert_eq!(err.message_key(), "config");
    }
}
