//! agentgraph core - configuration, usage accounting, and error types

pub mod config;
pub mod error;
pub mod usage;

pub use config::{ConfigFile, ConfigSources, LlmSettings, Properties, Settings};
pub use error::{ConfigError, ConfigError as Error, Result};
pub use usage::UsageTracker;
