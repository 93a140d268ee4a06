//! Tests for agentgraph-core: layered config resolution, usage tracking, errors

use agentgraph_core::config::keys;
use agentgraph_core::*;
use std::collections::HashMap;
use std::time::Duration;

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + Send + Sync + 'static {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

// ===========================================================================
// Properties
// ===========================================================================

#[test]
fn properties_parse_assignment() {
    let props =
        Properties::from_assignments(["llm.model=gpt-3.5", " llm.max_tokens = 10 "]).unwrap();
    assert_eq!(props.get("llm.model"), Some("gpt-3.5"));
    assert_eq!(props.get("llm.max_tokens"), Some("10"));
    assert_eq!(props.len(), 2);
}

#[test]
fn properties_value_may_contain_equals() {
    let props = Properties::from_assignments(["llm.api.key=abc=def"]).unwrap();
    assert_eq!(props.get("llm.api.key"), Some("abc=def"));
}

#[test]
fn properties_reject_malformed() {
    let err = Properties::from_assignments(["no-equals-sign"]).unwrap_err();
    assert!(matches!(err, ConfigError::MalformedAssignment(_)));
    let err = Properties::from_assignments(["=value"]).unwrap_err();
    assert!(matches!(err, ConfigError::MalformedAssignment(_)));
}

// ===========================================================================
// Resolution order
// ===========================================================================

#[test]
fn defaults_when_nothing_configured() {
    let settings = Settings::resolve(&ConfigSources::isolated(
        Properties::new(),
        ConfigFile::default(),
    ))
    .unwrap();
    assert_eq!(settings.llm.model, "gpt-4");
    assert_eq!(settings.llm.timeout, Duration::from_secs(30));
    assert_eq!(settings.llm.max_tokens, 2000);
    assert!((settings.llm.temperature - 0.7).abs() < f32::EPSILON);
    assert_eq!(settings.llm.max_concurrent, 5);
    assert!(settings.llm.api_key.is_none());
    assert!(!settings.llm.is_live());
    assert!(!settings.scripts_enabled);
}

#[test]
fn environment_beats_properties_beats_file() {
    let file = ConfigFile::parse(
        r#"
[llm]
model = "file-model"
max_tokens = 111
temperature = 0.1
"#,
    )
    .unwrap();
    let props =
        Properties::from_assignments(["llm.model=prop-model", "llm.max_tokens=222"]).unwrap();
    let sources =
        ConfigSources::isolated(props, file).with_env(env_of(&[("LLM_MODEL", "env-model")]));

    let settings = Settings::resolve(&sources).unwrap();
    assert_eq!(settings.llm.model, "env-model");
    assert_eq!(settings.llm.max_tokens, 222);
    assert!((settings.llm.temperature - 0.1).abs() < f32::EPSILON);
}

#[test]
fn live_requires_key_and_endpoint() {
    let sources = ConfigSources::isolated(Properties::new(), ConfigFile::default())
        .with_env(env_of(&[("OPENAI_API_KEY", "sk-1")]));
    let settings = Settings::resolve(&sources).unwrap();
    assert!(!settings.llm.is_live());

    let sources = ConfigSources::isolated(Properties::new(), ConfigFile::default()).with_env(
        env_of(&[
            ("OPENAI_API_KEY", "sk-1"),
            ("LLM_ENDPOINT", "http://localhost/v1/chat/completions"),
        ]),
    );
    let settings = Settings::resolve(&sources).unwrap();
    assert!(settings.llm.is_live());
}

#[test]
fn scripts_flag_parses_common_spellings() {
    for (raw, expected) in [
        ("true", true),
        ("1", true),
        ("on", true),
        ("false", false),
        ("no", false),
    ] {
        let sources = ConfigSources::isolated(Properties::new(), ConfigFile::default())
            .with_env(env_of(&[("AGENTGRAPH_ENABLE_SCRIPTS", raw)]));
        assert_eq!(Settings::resolve(&sources).unwrap().scripts_enabled, expected, "{}", raw);
    }
}

#[test]
fn invalid_number_names_the_key() {
    let sources = ConfigSources::isolated(Properties::new(), ConfigFile::default())
        .with_env(env_of(&[("LLM_TIMEOUT_SECONDS", "soon")]));
    match Settings::resolve(&sources).unwrap_err() {
        ConfigError::Invalid { key, value } => {
            assert_eq!(key, keys::TIMEOUT_SECONDS.name);
            assert_eq!(value, "soon");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn zero_concurrency_is_rejected() {
    let props = Properties::from_assignments(["llm.max_concurrent=0"]).unwrap();
    let err =
        Settings::resolve(&ConfigSources::isolated(props, ConfigFile::default())).unwrap_err();
    assert!(err.to_string().contains("llm.max_concurrent"));
}

// ===========================================================================
// Config file
// ===========================================================================

#[test]
fn missing_config_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let file = ConfigFile::load(&dir.path().join("absent.toml")).unwrap();
    assert!(file.get("llm.model").is_none());
    assert!(file.path().is_none());
}

#[test]
fn config_file_loads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agentgraph.toml");
    std::fs::write(&path, "[agents.scripts]\nenabled = true\n").unwrap();
    let file = ConfigFile::load(&path).unwrap();
    assert_eq!(file.get("agents.scripts.enabled"), Some("true"));
    assert_eq!(file.path(), Some(path.as_path()));

    let settings = Settings::resolve(&ConfigSources::isolated(Properties::new(), file)).unwrap();
    assert!(settings.scripts_enabled);
}

#[test]
fn malformed_config_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[llm\nmodel = ").unwrap();
    let err = ConfigFile::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("bad.toml"));
}

// ===========================================================================
// UsageTracker
// ===========================================================================

#[test]
fn usage_counts_per_key() {
    let tracker = UsageTracker::new();
    assert_eq!(tracker.record("agent:A1"), 1);
    assert_eq!(tracker.record("agent:A1"), 2);
    tracker.record("kg:Ethics");
    assert_eq!(tracker.count("agent:A1"), 2);
    assert_eq!(tracker.count("kg:Ethics"), 1);
    assert_eq!(tracker.count("missing"), 0);
}

#[test]
fn usage_clones_share_state() {
    let tracker = UsageTracker::new();
    let other = tracker.clone();
    other.record("x");
    assert_eq!(tracker.count("x"), 1);
}

#[test]
fn usage_report_is_sorted() {
    let tracker = UsageTracker::new();
    tracker.record("b");
    tracker.record("a");
    tracker.record("b");
    assert_eq!(
        tracker.report(),
        "Usage Report:\nNode ID: a - Access Count: 1\nNode ID: b - Access Count: 2\n"
    );
    tracker.reset();
    assert_eq!(tracker.report(), "Usage Report:\n");
}

#[test]
fn usage_concurrent_increments() {
    let tracker = UsageTracker::new();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let t = tracker.clone();
            std::thread::spawn(move || {
                for _ in 0..100 {
                    t.record("hot");
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(tracker.count("hot"), 800);
}
