//! Effective configuration with full provenance
//!
//! The effective config captures the merged configuration plus where each
//! layer came from. It is written next to the reports of every run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;

/// Schema version for effective_config
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "conformance-lab/effective_config@1";

/// Longest quiet period a workbench may be configured to wait for
pub const MAX_QUIESCENCE_SECONDS: u64 = 600;

/// Origin of a configuration source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    File,
    Cli,
}

/// A contributing config source with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Effective configuration with full provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub schema_version: u32,

    pub schema_id: String,

    /// When this config was computed
    pub created_at: DateTime<Utc>,

    /// Test run id (set once the lab exists)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,

    /// The merged configuration object
    pub config: Value,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,

    /// Redacted key paths
    pub redactions: Vec<String>,
}

/// Keys that contain secrets and should be redacted
const SECRET_KEYS: &[&str] = &[
    "password",
    "token",
    "secret",
    "private_key",
    "api_key",
    "credential",
];

impl EffectiveConfig {
    /// Build effective config from builtin defaults, an optional lab file and
    /// CLI overrides.
    pub fn build(
        lab_config_path: Option<&Path>,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let mut layers = Vec::new();
        let mut sources = Vec::new();

        layers.push(BuiltinDefaults::default().to_value());
        sources.push(ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        });

        if let Some(path) = lab_config_path {
            let (value, digest) = Self::load_toml_file(path)?;
            layers.push(value);
            sources.push(ConfigSource {
                origin: ConfigOrigin::File,
                path: Some(path.to_string_lossy().to_string()),
                digest: Some(digest),
            });
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let mut merged = merge_layers(layers);
        let redactions = Self::redact_secrets(&mut merged);
        Self::validate_config(&merged)?;

        Ok(Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            run_id: None,
            config: merged,
            sources,
            redactions,
        })
    }

    /// Load and parse a TOML file, returning the value and digest
    fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
        let bytes = fs::read(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = String::from_utf8(bytes)
            .map_err(|e| ConfigError::ParseError(format!("Invalid UTF-8: {}", e)))?;

        let toml_value: toml::Value = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

        Ok((toml_to_json(toml_value), digest))
    }

    fn redact_secrets(value: &mut Value) -> Vec<String> {
        let mut redactions = Vec::new();
        redact_recursive(value, String::new(), &mut redactions);
        redactions
    }

    fn validate_config(config: &Value) -> Result<(), ConfigError> {
        if let Some(size) = config.get("max_page_size").and_then(|v| v.as_u64()) {
            if size == 0 || size > u64::from(u32::MAX) {
                return Err(ConfigError::ValidationError(
                    "max_page_size must be a positive 32-bit integer".to_string(),
                ));
            }
        }

        if let Some(quiet) = config.get("quiescence_seconds").and_then(|v| v.as_u64()) {
            if quiet > MAX_QUIESCENCE_SECONDS {
                return Err(ConfigError::ValidationError(format!(
                    "quiescence_seconds must be in [0, {}]",
                    MAX_QUIESCENCE_SECONDS
                )));
            }
        }

        if let Some(poll) = config.get("poll_interval_ms").and_then(|v| v.as_u64()) {
            if poll == 0 || poll > 60_000 {
                return Err(ConfigError::ValidationError(
                    "poll_interval_ms must be in (0, 60000]".to_string(),
                ));
            }
        }

        if let Some(0) = config.get("event_timeout_seconds").and_then(|v| v.as_u64()) {
            return Err(ConfigError::ValidationError(
                "event_timeout_seconds must be greater than zero".to_string(),
            ));
        }

        if let Some(timeout) = config
            .get("completion_timeout_seconds")
            .and_then(|v| v.as_u64())
        {
            let quiet = config
                .get("quiescence_seconds")
                .and_then(|v| v.as_u64())
                .unwrap_or(0);
            if timeout < quiet {
                return Err(ConfigError::ValidationError(format!(
                    "completion_timeout_seconds must be at least quiescence_seconds ({})",
                    quiet
                )));
            }
        }

        Ok(())
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Get a config value by dot-separated path
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.config;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    pub fn get_u64(&self, path: &str) -> Option<u64> {
        self.get(path).and_then(|v| v.as_u64())
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(|v| v.as_str())
    }
}

fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

fn redact_recursive(value: &mut Value, path: String, redactions: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                let current_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };

                let key_lower = key.to_lowercase();
                let is_secret = SECRET_KEYS.iter().any(|s| key_lower.contains(s));

                if is_secret && !val.is_object() && !val.is_array() {
                    *val = Value::String("[REDACTED]".to_string());
                    redactions.push(current_path);
                } else {
                    redact_recursive(val, current_path, redactions);
                }
            }
        }
        Value::Array(arr) => {
            for (i, val) in arr.iter_mut().enumerate() {
                redact_recursive(val, format!("{}[{}]", path, i), redactions);
            }
        }
        _ => {}
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
