//! Agent card served at `/.well-known/agent.json`
//!
//! The card is how other agents (and the orchestrator's client) discover what
//! an agent is called, where it lives and which skills it advertises.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    #[serde(default)]
    pub streaming: bool,
    #[serde(default)]
    pub push_notifications: bool,
    #[serde(default)]
    pub state_transition_history: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentSkill {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

impl AgentSkill {
    pub fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            tags: Vec::new(),
            examples: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_examples(mut self, examples: &[&str]) -> Self {
        self.examples = examples.iter().map(|e| e.to_string()).collect();
        self
    }
}

/// Public description of an agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub name: String,
    pub description: String,
    pub url: String,
    pub version: String,
    #[serde(default)]
    pub capabilities: AgentCapabilities,
    #[serde(default)]
    pub default_input_modes: Vec<String>,
    #[serde(default)]
    pub default_output_modes: Vec<String>,
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
}

impl AgentCard {
    /// Card with streaming enabled and plain-text in / JSON out defaults
    pub fn new(name: &str, description: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            url: url.to_string(),
            version: "1.0".to_string(),
            capabilities: AgentCapabilities {
                streaming: true,
                ..AgentCapabilities::default()
            },
            default_input_modes: vec!["text/plain".to_string()],
            default_output_modes: vec!["application/json".to_string()],
            skills: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.capabilities.streaming = streaming;
        self
    }

    pub fn with_input_modes(mut self, modes: &[&str]) -> Self {
        self.default_input_modes = modes.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn with_output_modes(mut self, modes: &[&str]) -> Self {
        self.default_output_modes = modes.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn with_skill(mut self, skill: AgentSkill) -> Self {
        self.skills.push(skill);
        self
    }
}

/// Base URL an agent advertises for a bind host and port
pub fn local_url(host: &str, port: u16) -> String {
    let host = if host == "0.0.0.0" || host == "127.0.0.1" {
        "localhost"
    } else {
        host
    };
    format!("http://{host}:{port}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_card_serializes_camel_case() {
        let card = AgentCard::new("Trending Topics Agent", "Finds trends", "http://localhost:10020")
            .with_skill(
                AgentSkill::new("find_trends", "Find Trending Topics", "Searches trends")
                    .with_tags(&["trends"])
                    .with_examples(&["What's trending today?"]),
            );

        let value = serde_json::to_value(&card).unwrap();
        assert_eq!(value["defaultInputModes"], json!(["text/plain"]));
        assert_eq!(value["defaultOutputModes"], json!(["application/json"]));
        assert_eq!(value["capabilities"]["streaming"], json!(true));
        assert_eq!(value["capabilities"]["pushNotifications"], json!(false));
        assert_eq!(value["skills"][0]["id"], json!("find_trends"));
    }

    #[test]
    fn test_card_parses_minimal_remote_shape() {
        let raw = json!({
            "name": "Remote",
            "description": "A remote agent",
            "url": "http://localhost:10021",
            "version": "1.0"
        });

        let card: AgentCard = serde_json::from_value(raw).unwrap();
        assert_eq!(card.name, "Remote");
        assert!(card.skills.is_empty());
        assert!(!card.capabilities.streaming);
    }

    #[test]
    fn test_builder_overrides() {
        let card = AgentCard::new("Canvas Agent", "Canvases", "http://localhost:9999")
            .with_version("0.1.0")
            .with_streaming(false)
            .with_input_modes(&["text"])
            .with_output_modes(&["text"]);

        assert_eq!(card.version, "0.1.0");
        assert!(!card.capabilities.streaming);
        assert_eq!(card.default_input_modes, vec!["text"]);
        assert_eq!(card.default_output_modes, vec!["text"]);
    }

    #[test]
    fn test_local_url() {
        assert_eq!(local_url("127.0.0.1", 10020), "http://localhost:10020");
        assert_eq!(local_url("0.0.0.0", 9999), "http://localhost:9999");
        assert_eq!(local_url("agents.internal", 80), "http://agents.internal:80");
    }
}
