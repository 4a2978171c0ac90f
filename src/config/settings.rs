//! Typed view of the effective configuration.

use regex_lite::Regex;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::effective::{ConfigError, EffectiveConfig};
use crate::work_pad::TutConnection;

#[derive(Debug, Default, Deserialize)]
struct RawTut {
    #[serde(default)]
    server_name: String,
    #[serde(default)]
    root_url: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawFilter {
    #[serde(default)]
    include: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLogging {
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    json: bool,
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    #[serde(default)]
    tut: RawTut,
    max_page_size: u32,
    quiescence_seconds: u64,
    poll_interval_ms: u64,
    completion_timeout_seconds: u64,
    event_timeout_seconds: u64,
    #[serde(default)]
    filter: RawFilter,
    output_dir: String,
    #[serde(default)]
    logging: RawLogging,
}

/// Include/exclude patterns over test case ids.
///
/// An empty include list admits every id; exclusion always wins.
#[derive(Debug, Clone, Default)]
pub struct TestCaseFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl TestCaseFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, ConfigError> {
        Ok(Self {
            include: compile_all(include)?,
            exclude: compile_all(exclude)?,
        })
    }

    pub fn matches(&self, test_case_id: &str) -> bool {
        let included =
            self.include.is_empty() || self.include.iter().any(|r| r.is_match(test_case_id));
        included && !self.exclude.iter().any(|r| r.is_match(test_case_id))
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| {
                ConfigError::ValidationError(format!("invalid test case pattern '{}': {}", p, e))
            })
        })
        .collect()
}

/// Settings a lab run needs, extracted from the merged configuration.
#[derive(Debug, Clone)]
pub struct LabSettings {
    pub tut: TutConnection,
    pub max_page_size: u32,
    pub quiescence: Duration,
    pub poll_interval: Duration,
    pub completion_timeout: Duration,
    pub event_timeout: Duration,
    pub filter: TestCaseFilter,
    pub output_dir: PathBuf,
    pub log_level: String,
    pub log_json: bool,
}

impl LabSettings {
    pub fn from_effective(config: &EffectiveConfig) -> Result<Self, ConfigError> {
        let raw: RawSettings = serde_json::from_value(config.config.clone())
            .map_err(|e| ConfigError::ValidationError(format!("config shape: {}", e)))?;

        if raw.max_page_size == 0 {
            return Err(ConfigError::ValidationError(
                "max_page_size must be greater than zero".to_string(),
            ));
        }
        if raw.tut.server_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "tut.server_name must not be empty".to_string(),
            ));
        }

        Ok(Self {
            tut: TutConnection {
                server_name: raw.tut.server_name,
                root_url: raw.tut.root_url,
                user_id: raw.tut.user_id,
            },
            max_page_size: raw.max_page_size,
            quiescence: Duration::from_secs(raw.quiescence_seconds),
            poll_interval: Duration::from_millis(raw.poll_interval_ms),
            completion_timeout: Duration::from_secs(raw.completion_timeout_seconds),
            event_timeout: Duration::from_secs(raw.event_timeout_seconds),
            filter: TestCaseFilter::new(&raw.filter.include, &raw.filter.exclude)?,
            output_dir: PathBuf::from(raw.output_dir),
            log_level: raw.logging.level.unwrap_or_else(|| "info".to_string()),
            log_json: raw.logging.json,
        })
    }
}
