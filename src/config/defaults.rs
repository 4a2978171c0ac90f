//! Built-in lab defaults (layer 1)

use serde::{Deserialize, Serialize};

use crate::work_pad::{DEFAULT_MAX_PAGE_SIZE, DEFAULT_QUIESCENCE_SECONDS};

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Name of the technology under test (default: "mock-repository")
    pub tut_server_name: String,

    /// Root URL of the technology under test
    pub tut_root_url: String,

    /// User id the workbenches act as
    pub tut_user_id: String,

    /// Page size for paged queries (default: 100)
    pub max_page_size: u32,

    /// Quiet period before a workbench reports complete (default: 10)
    pub quiescence_seconds: u64,

    /// How often the runner polls for completion (default: 250)
    pub poll_interval_ms: u64,

    /// Upper bound on the completion wait (default: 120)
    pub completion_timeout_seconds: u64,

    /// How long event-driven test cases wait for an event (default: 30)
    pub event_timeout_seconds: u64,

    /// Report directory (default: "conformance-results")
    pub output_dir: String,

    /// Log filter when RUST_LOG is unset (default: "info")
    pub log_level: String,

    /// Emit JSON log lines (default: false)
    pub log_json: bool,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            tut_server_name: "mock-repository".to_string(),
            tut_root_url: "memory://mock-repository".to_string(),
            tut_user_id: "conformance-lab".to_string(),
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            quiescence_seconds: DEFAULT_QUIESCENCE_SECONDS,
            poll_interval_ms: 250,
            completion_timeout_seconds: 120,
            event_timeout_seconds: 30,
            output_dir: "conformance-results".to_string(),
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "tut": {
                "server_name": self.tut_server_name,
                "root_url": self.tut_root_url,
                "user_id": self.tut_user_id
            },
            "max_page_size": self.max_page_size,
            "quiescence_seconds": self.quiescence_seconds,
            "poll_interval_ms": self.poll_interval_ms,
            "completion_timeout_seconds": self.completion_timeout_seconds,
            "event_timeout_seconds": self.event_timeout_seconds,
            "filter": {
                "include": [],
                "exclude": []
            },
            "output_dir": self.output_dir,
            "logging": {
                "level": self.log_level,
                "json": self.log_json
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = BuiltinDefaults::default();
        assert_eq!(defaults.max_page_size, 100);
        assert_eq!(defaults.quiescence_seconds, 10);
        assert_eq!(defaults.tut_server_name, "mock-repository");
        assert!(!defaults.log_json);
    }

    #[test]
    fn test_to_value() {
        let value = BuiltinDefaults::default().to_value();

        assert_eq!(value["max_page_size"], 100);
        assert_eq!(value["tut"]["user_id"], "conformance-lab");
        assert_eq!(value["logging"]["level"], "info");
        assert!(value["filter"]["include"].as_array().unwrap().is_empty());
    }
}
