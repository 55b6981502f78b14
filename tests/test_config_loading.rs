//! Configuration loading and validation tests
//!
//! Tests focus on BEHAVIOR of configuration loading, validation, and error handling.
//! We test observable outcomes, not implementation details of TOML parsing.

use a2a_agents::config::{AppConfig, ConfigError};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "{content}").unwrap();
    temp_file
}

#[test]
fn test_config_loads_successfully_from_valid_toml() {
    let temp_file = write_config(
        r#"
[server]
host = "0.0.0.0"

[ports]
orchestrator = 19999
trending = 11020
analyzer = 11021
host = 11022
market = 11023

[llm]
provider = "openai"
model = "gpt-4o-mini"
api_key_env = "MY_OPENAI_KEY"
temperature = 0.2
max_tokens = 1000

[remote_agents]
trending = "http://trends.internal:11020"
analyzer = "http://analyzer.internal:11021"
market_analysis = "https://market.example.com"
"#,
    );

    let config = AppConfig::load_from_file(temp_file.path()).unwrap();

    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.ports.orchestrator, 19999);
    assert_eq!(config.ports.market, 11023);
    assert_eq!(config.llm.model, "gpt-4o-mini");
    assert_eq!(config.llm.api_key_env, "MY_OPENAI_KEY");
    assert_eq!(config.llm.temperature, 0.2);
    assert_eq!(config.llm.max_tokens, 1000);
    assert_eq!(config.remote_agents.len(), 3);
    assert_eq!(
        config.remote_agents.get("market_analysis").map(String::as_str),
        Some("https://market.example.com")
    );
}

#[test]
fn test_config_applies_defaults_for_missing_sections() {
    let temp_file = write_config("[llm]\nmodel = \"gpt-4\"\n");

    let config = AppConfig::load_from_file(temp_file.path()).unwrap();

    assert_eq!(config.ports.orchestrator, 9999);
    assert_eq!(config.ports.canvas, 9999);
    assert_eq!(config.ports.task, 9999);
    assert_eq!(config.client.timeout_secs, 240);
    assert_eq!(config.jobs.simulated_job_delay_ms, 2000);
    assert_eq!(config.jobs.canvas_toolcall_delay_ms, 500);
    assert_eq!(
        config.remote_agents.get("host").map(String::as_str),
        Some("http://localhost:10022")
    );
}

#[test]
fn test_config_file_not_found_returns_file_read_error() {
    let result = AppConfig::load_from_file(Path::new("/nonexistent/a2a-agents.toml"));
    assert!(matches!(result, Err(ConfigError::FileRead(_))));
}

#[test]
fn test_explicit_path_wins_over_defaults() {
    let temp_file = write_config("[ports]\nhost = 12022\n");

    let config = AppConfig::load(Some(temp_file.path())).unwrap();
    assert_eq!(config.ports.host, 12022);
}

#[test]
fn test_invalid_toml_syntax_returns_parse_error() {
    let temp_file = write_config("[llm\nmodel = ");

    let result = AppConfig::load_from_file(temp_file.path());
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_wrong_field_type_returns_parse_error() {
    let temp_file = write_config("[ports]\ntrending = \"ten thousand\"\n");

    let result = AppConfig::load_from_file(temp_file.path());
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_validation_runs_on_load() {
    let temp_file = write_config("[remote_agents]\nhost = \"localhost:10022\"\n");

    let result = AppConfig::load_from_file(temp_file.path());
    assert!(matches!(
        result,
        Err(ConfigError::InvalidAgentUrl { ref name, .. }) if name == "host"
    ));
}

#[test]
fn test_zero_client_timeout_rejected() {
    let temp_file = write_config("[client]\nconnect_timeout_secs = 0\n");

    let result = AppConfig::load_from_file(temp_file.path());
    assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
}

#[test]
fn test_rendered_config_reloads_identically() {
    let temp_file = write_config(
        r#"
[llm]
model = "gpt-4o"
base_url = "http://localhost:8080/v1"

[webhook]
timeout_secs = 3
"#,
    );
    let config = AppConfig::load_from_file(temp_file.path()).unwrap();

    let rendered = config.to_toml_string().unwrap();
    let reloaded = write_config(&rendered);
    let again = AppConfig::load_from_file(reloaded.path()).unwrap();

    assert_eq!(config, again);
    assert_eq!(again.llm.base_url.as_deref(), Some("http://localhost:8080/v1"));
}
