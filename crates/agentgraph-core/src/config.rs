//! Layered configuration: environment, then in-process properties, then a TOML file.
//!
//! Every setting has a dotted key (`llm.model`) used by properties and the
//! config file, and an environment variable name (`LLM_MODEL`). The first
//! non-empty value found wins.

use crate::error::{ConfigError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "AGENTGRAPH_CONFIG";

/// Default config file location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/agentgraph.toml";

pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_CONCURRENT: usize = 5;

/// A configurable setting: dotted key plus environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    pub name: &'static str,
    pub env: &'static str,
}

impl Key {
    pub const fn new(name: &'static str, env: &'static str) -> Self {
        Self { name, env }
    }
}

pub mod keys {
    use super::Key;

    pub const API_KEY: Key = Key::new("llm.api.key", "OPENAI_API_KEY");
    pub const API_ENDPOINT: Key = Key::new("llm.api.endpoint", "LLM_ENDPOINT");
    pub const MODEL: Key = Key::new("llm.model", "LLM_MODEL");
    pub const TIMEOUT_SECONDS: Key = Key::new("llm.timeout_seconds", "LLM_TIMEOUT_SECONDS");
    pub const MAX_TOKENS: Key = Key::new("llm.max_tokens", "LLM_MAX_TOKENS");
    pub const TEMPERATURE: Key = Key::new("llm.temperature", "LLM_TEMPERATURE");
    pub const MAX_CONCURRENT: Key = Key::new("llm.max_concurrent", "LLM_MAX_CONCURRENT");
    pub const SCRIPTS_ENABLED: Key =
        Key::new("agents.scripts.enabled", "AGENTGRAPH_ENABLE_SCRIPTS");
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

/// In-process `key=value` overlay, usually filled from `--set` flags.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    values: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Parse and apply a single `key=value` assignment.
    pub fn parse_assignment(&mut self, raw: &str) -> Result<()> {
        let (key, value) = raw
            .split_once('=')
            .ok_or_else(|| ConfigError::MalformedAssignment(raw.to_string()))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::MalformedAssignment(raw.to_string()));
        }
        self.set(key, value.trim());
        Ok(())
    }

    pub fn from_assignments<I, S>(assignments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut props = Self::new();
        for a in assignments {
            props.parse_assignment(a.as_ref())?;
        }
        Ok(props)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Config file
// ---------------------------------------------------------------------------

/// A TOML config file flattened to dotted keys.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    values: BTreeMap<String, String>,
    path: Option<PathBuf>,
}

impl ConfigFile {
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with_origin(text, "<inline>")
    }

    fn parse_with_origin(text: &str, origin: &str) -> Result<Self> {
        let table: toml::Table = text.parse().map_err(|source| ConfigError::Parse {
            origin: origin.to_string(),
            source,
        })?;
        let mut values = BTreeMap::new();
        flatten_table("", &table, &mut values);
        Ok(Self { values, path: None })
    }

    /// Load from a path. A missing file yields an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let mut file = Self::parse_with_origin(&text, &path.display().to_string())?;
        debug!(path = %path.display(), keys = file.values.len(), "loaded config file");
        file.path = Some(path.to_path_buf());
        Ok(file)
    }

    /// Load from `$AGENTGRAPH_CONFIG`, `config/agentgraph.toml`, or the user config dir.
    pub fn discover() -> Result<Self> {
        Self::load(&Self::default_path())
    }

    /// `$AGENTGRAPH_CONFIG` if set. Otherwise `config/agentgraph.toml` when it
    /// exists, then `<user config dir>/agentgraph/agentgraph.toml`.
    pub fn default_path() -> PathBuf {
        if let Some(p) = std::env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
        {
            return PathBuf::from(p);
        }
        let local = PathBuf::from(DEFAULT_CONFIG_PATH);
        if local.exists() {
            return local;
        }
        dirs::config_dir()
            .map(|d| d.join("agentgraph").join("agentgraph.toml"))
            .filter(|p| p.exists())
            .unwrap_or(local)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn flatten_table(prefix: &str, table: &toml::Table, out: &mut BTreeMap<String, String>) {
    for (k, v) in table {
        let key = if prefix.is_empty() {
            k.clone()
        } else {
            format!("{}.{}", prefix, k)
        };
        match v {
            toml::Value::Table(inner) => flatten_table(&key, inner, out),
            toml::Value::String(s) => {
                out.insert(key, s.clone());
            }
            other => {
                out.insert(key, other.to_string());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// The three layers a setting is resolved from.
#[derive(Clone)]
pub struct ConfigSources {
    env: EnvLookup,
    properties: Properties,
    file: ConfigFile,
}

impl std::fmt::Debug for ConfigSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigSources")
            .field("properties", &self.properties)
            .field("file", &self.file)
            .finish_non_exhaustive()
    }
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self::new(Properties::default(), ConfigFile::default())
    }
}

impl ConfigSources {
    /// Sources backed by the real process environment.
    pub fn new(properties: Properties, file: ConfigFile) -> Self {
        Self {
            env: Arc::new(|name| std::env::var(name).ok()),
            properties,
            file,
        }
    }

    /// Replace the environment lookup, mostly for tests.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(lookup);
        self
    }

    /// Sources with no environment at all.
    pub fn isolated(properties: Properties, file: ConfigFile) -> Self {
        Self::new(properties, file).with_env(|_| None)
    }

    pub fn lookup(&self, key: Key) -> Option<String> {
        if let Some(v) = (self.env)(key.env).filter(|v| !v.trim().is_empty()) {
            return Some(v);
        }
        if let Some(v) = self
            .properties
            .get(key.name)
            .or_else(|| self.properties.get(key.env))
            .filter(|v| !v.trim().is_empty())
        {
            return Some(v.to_string());
        }
        self.file
            .get(key.name)
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string)
    }

    fn parsed<T: std::str::FromStr>(&self, key: Key, default: T) -> Result<T> {
        match self.lookup(key) {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid(key.name, raw)),
        }
    }

    fn flag(&self, key: Key) -> Result<bool> {
        match self.lookup(key) {
            None => Ok(false),
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::invalid(key.name, raw)),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Settings for the completion backend.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub model: String,
    pub timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
    pub max_concurrent: usize,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: None,
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

impl LlmSettings {
    /// True when both a credential and an endpoint are configured.
    pub fn is_live(&self) -> bool {
        self.api_key.is_some() && self.endpoint.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub llm: LlmSettings,
    /// Embedded scripts are a trust boundary and stay off unless enabled.
    pub scripts_enabled: bool,
}

impl Settings {
    pub fn resolve(sources: &ConfigSources) -> Result<Self> {
        let max_concurrent: usize =
            sources.parsed(keys::MAX_CONCURRENT, DEFAULT_MAX_CONCURRENT)?;
        if max_concurrent == 0 {
            return Err(ConfigError::invalid(keys::MAX_CONCURRENT.name, "0"));
        }
        let llm = LlmSettings {
            api_key: sources.lookup(keys::API_KEY),
            endpoint: sources.lookup(keys::API_ENDPOINT),
            model: sources
                .lookup(keys::MODEL)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(
                sources.parsed(keys::TIMEOUT_SECONDS, DEFAULT_TIMEOUT_SECONDS)?,
            ),
            max_tokens: sources.parsed(keys::MAX_TOKENS, DEFAULT_MAX_TOKENS)?,
            temperature: sources.parsed(keys::TEMPERATURE, DEFAULT_TEMPERATURE)?,
            max_concurrent,
        };
        Ok(Self {
            llm,
            scripts_enabled: sources.flag(keys::SCRIPTS_ENABLED)?,
        })
    }

    /// Resolve from the process environment, the given properties and the discovered config file.
    pub fn from_environment(properties: Properties) -> Result<Self> {
        let file = ConfigFile::discover()?;
        Self::resolve(&ConfigSources::new(properties, file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_nested_tables() {
        let file = ConfigFile::parse(
            r#"
[llm]
model = "gpt-3.5"
max_tokens = 100

[llm.api]
endpoint = "http://localhost:9000"
"#,
        )
        .unwrap();
        assert_eq!(file.get("llm.model"), Some("gpt-3.5"));
        assert_eq!(file.get("llm.max_tokens"), Some("100"));
        assert_eq!(file.get("llm.api.endpoint"), Some("http://localhost:9000"));
    }

    #[test]
    fn empty_env_value_falls_through() {
        let mut props = Properties::new();
        props.set("llm.model", "from-props");
        let sources = ConfigSources::isolated(props, ConfigFile::default())
            .with_env(|name| (name == "LLM_MODEL").then(String::new));
        assert_eq!(sources.lookup(keys::MODEL).as_deref(), Some("from-props"));
    }

    #[test]
    fn properties_accept_env_style_names() {
        let mut props = Properties::new();
        props.set("OPENAI_API_KEY", "sk-test");
        let sources = ConfigSources::isolated(props, ConfigFile::default());
        assert_eq!(sources.lookup(keys::API_KEY).as_deref(), Some("sk-test"));
    }
}
