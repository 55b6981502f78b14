//! Configuration system for the A2A agent servers
//!
//! Every section is optional in the TOML file; missing sections fall back to
//! the local demo topology (orchestrator on 9999, specialist agents on
//! 10020-10023).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Top-level configuration shared by every agent binary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub ports: PortsSection,
    #[serde(default)]
    pub llm: LlmSection,
    /// Routing name -> base URL of remote A2A agents the orchestrator may call
    #[serde(default = "default_remote_agents")]
    pub remote_agents: BTreeMap<String, String>,
    #[serde(default)]
    pub client: ClientSection,
    #[serde(default)]
    pub webhook: WebhookSection,
    #[serde(default)]
    pub jobs: JobsSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerSection::default(),
            ports: PortsSection::default(),
            llm: LlmSection::default(),
            remote_agents: default_remote_agents(),
            client: ClientSection::default(),
            webhook: WebhookSection::default(),
            jobs: JobsSection::default(),
        }
    }
}

/// HTTP bind settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

/// Listening port per agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortsSection {
    #[serde(default = "default_front_port")]
    pub orchestrator: u16,
    #[serde(default = "default_front_port")]
    pub canvas: u16,
    #[serde(default = "default_front_port")]
    pub task: u16,
    #[serde(default = "default_trending_port")]
    pub trending: u16,
    #[serde(default = "default_analyzer_port")]
    pub analyzer: u16,
    #[serde(default = "default_host_port")]
    pub host: u16,
    #[serde(default = "default_market_port")]
    pub market: u16,
}

impl Default for PortsSection {
    fn default() -> Self {
        Self {
            orchestrator: default_front_port(),
            canvas: default_front_port(),
            task: default_front_port(),
            trending: default_trending_port(),
            analyzer: default_analyzer_port(),
            host: default_host_port(),
            market: default_market_port(),
        }
    }
}

fn default_front_port() -> u16 {
    9999
}

fn default_trending_port() -> u16 {
    10020
}

fn default_analyzer_port() -> u16 {
    10021
}

fn default_host_port() -> u16 {
    10022
}

fn default_market_port() -> u16 {
    10023
}

/// LLM section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmSection {
    /// Provider name (only "openai" is wired up)
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable containing the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Temperature (0.0 to 2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Override for the provider base URL (proxies, tests)
    pub base_url: Option<String>,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            base_url: None,
            timeout_secs: default_llm_timeout(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_llm_timeout() -> u64 {
    60
}

/// Remote-agent defaults. market_analysis is left out on purpose: tasks routed
/// there report the agent as unavailable.
fn default_remote_agents() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("trending".to_string(), "http://localhost:10020".to_string()),
        ("analyzer".to_string(), "http://localhost:10021".to_string()),
        ("host".to_string(), "http://localhost:10022".to_string()),
    ])
}

/// Outbound A2A client timeouts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientSection {
    #[serde(default = "default_client_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_client_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_client_timeout() -> u64 {
    240
}

fn default_connect_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookSection {
    #[serde(default = "default_webhook_timeout")]
    pub timeout_secs: u64,
}

impl Default for WebhookSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_webhook_timeout(),
        }
    }
}

fn default_webhook_timeout() -> u64 {
    10
}

/// Pacing of the simulated job runner in the task agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobsSection {
    #[serde(default = "default_job_delay")]
    pub simulated_job_delay_ms: u64,
    #[serde(default = "default_toolcall_delay")]
    pub canvas_toolcall_delay_ms: u64,
}

impl Default for JobsSection {
    fn default() -> Self {
        Self {
            simulated_job_delay_ms: default_job_delay(),
            canvas_toolcall_delay_ms: default_toolcall_delay(),
        }
    }
}

fn default_job_delay() -> u64 {
    2000
}

fn default_toolcall_delay() -> u64 {
    500
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Failed to render TOML: {0}")]
    TomlRender(#[from] toml::ser::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Invalid remote agent URL for '{name}': {url}")]
    InvalidAgentUrl { name: String, url: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Paths probed when no `--config` flag is given
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["a2a-agents.toml", "config/a2a-agents.toml"];

impl AppConfig {
    /// Resolve configuration: the explicit path if given, else the first
    /// default path that exists, else built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }

        match DEFAULT_CONFIG_PATHS
            .iter()
            .map(Path::new)
            .find(|p| p.is_file())
        {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a TOML file and validate it
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Render the effective configuration back to TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ports = [
            ("orchestrator", self.ports.orchestrator),
            ("canvas", self.ports.canvas),
            ("task", self.ports.task),
            ("trending", self.ports.trending),
            ("analyzer", self.ports.analyzer),
            ("host", self.ports.host),
            ("market", self.ports.market),
        ];
        if let Some((name, _)) = ports.iter().find(|(_, port)| *port == 0) {
            return Err(ConfigError::InvalidConfig(format!(
                "port for '{name}' must be non-zero"
            )));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::InvalidConfig(format!(
                "llm.temperature {} must be between 0.0 and 2.0",
                self.llm.temperature
            )));
        }

        if self.client.timeout_secs == 0
            || self.client.connect_timeout_secs == 0
            || self.webhook.timeout_secs == 0
            || self.llm.timeout_secs == 0
        {
            return Err(ConfigError::InvalidConfig(
                "timeouts must be greater than zero".to_string(),
            ));
        }

        for (name, url) in &self.remote_agents {
            validate_agent_url(name, url)?;
        }

        Ok(())
    }

    /// Get LLM API key from environment variable
    pub fn get_llm_api_key(&self) -> Result<String, ConfigError> {
        get_llm_api_key(&self.llm)
    }

    /// Create a test configuration for unit testing
    #[cfg(test)]
    pub fn test_config() -> Self {
        let toml_content = r#"
[server]
host = "127.0.0.1"

[llm]
provider = "openai"
model = "gpt-4"
api_key_env = "TEST_OPENAI_API_KEY"

[jobs]
simulated_job_delay_ms = 0
canvas_toolcall_delay_ms = 0
"#;
        toml::from_str(toml_content).expect("Test config should parse")
    }
}

/// Read the API key for an LLM section, treating an empty value as missing
pub fn get_llm_api_key(llm: &LlmSection) -> Result<String, ConfigError> {
    match std::env::var(&llm.api_key_env) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::EnvVarNotFound(llm.api_key_env.clone())),
    }
}

fn validate_agent_url(name: &str, raw: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidAgentUrl {
        name: name.to_string(),
        url: raw.to_string(),
    };

    let parsed = url::Url::parse(raw).map_err(|_| invalid())?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_demo_topology() {
        let config: AppConfig = toml::from_str("").unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.ports.orchestrator, 9999);
        assert_eq!(config.ports.trending, 10020);
        assert_eq!(config.ports.analyzer, 10021);
        assert_eq!(config.ports.host, 10022);
        assert_eq!(config.ports.market, 10023);
        assert_eq!(config.llm.model, "gpt-4");
        assert_eq!(config.llm.max_tokens, 2000);
        assert_eq!(config.client.timeout_secs, 240);
        assert_eq!(config.client.connect_timeout_secs, 10);
        assert_eq!(config.webhook.timeout_secs, 10);
        assert_eq!(config.remote_agents.len(), 3);
        assert!(!config.remote_agents.contains_key("market_analysis"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_keep_field_defaults() {
        let toml_content = r#"
[ports]
trending = 11020

[llm]
model = "gpt-4o-mini"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.ports.trending, 11020);
        assert_eq!(config.ports.analyzer, 10021);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.temperature, 0.7);
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_remote_agents_override_replaces_map() {
        let toml_content = r#"
[remote_agents]
market_analysis = "http://localhost:10023"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.remote_agents.len(), 1);
        assert_eq!(
            config.remote_agents.get("market_analysis").map(String::as_str),
            Some("http://localhost:10023")
        );
    }

    #[test]
    fn test_invalid_remote_agent_url() {
        let toml_content = r#"
[remote_agents]
trending = "ftp://localhost:10020"
"#;

        let result = AppConfig::from_toml_str(toml_content);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidAgentUrl { ref name, .. }) if name == "trending"
        ));

        assert!(validate_agent_url("x", "not a url").is_err());
        assert!(validate_agent_url("x", "https://agents.example.com").is_ok());
    }

    #[test]
    fn test_temperature_out_of_range() {
        let result = AppConfig::from_toml_str("[llm]\ntemperature = 3.5\n");
        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_port_rejected() {
        let result = AppConfig::from_toml_str("[ports]\nhost = 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidConfig(msg)) if msg.contains("host")));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = AppConfig::from_toml_str("[webhook]\ntimeout_secs = 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_api_key_env() {
        let llm = LlmSection {
            api_key_env: "A2A_AGENTS_TEST_KEY_THAT_DOES_NOT_EXIST".to_string(),
            ..LlmSection::default()
        };

        let result = get_llm_api_key(&llm);
        assert!(matches!(result, Err(ConfigError::EnvVarNotFound(name))
            if name == "A2A_AGENTS_TEST_KEY_THAT_DOES_NOT_EXIST"));
    }

    #[test]
    fn test_round_trip_render() {
        let config = AppConfig::test_config();
        let rendered = config.to_toml_string().unwrap();
        let reparsed = AppConfig::from_toml_str(&rendered).unwrap();
        assert_eq!(config, reparsed);
    }
}
