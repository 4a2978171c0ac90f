//! Lab configuration
//!
//! Three layers, merged in order:
//! 1. Built-in lab defaults
//! 2. Lab config file (TOML, `--config`)
//! 3. CLI flags

mod defaults;
mod effective;
mod merge;
mod settings;

pub use defaults::BuiltinDefaults;
pub use effective::{
    ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig, MAX_QUIESCENCE_SECONDS,
};
pub use merge::{deep_merge, merge_layers};
pub use settings::{LabSettings, TestCaseFilter};
