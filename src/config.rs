use anyhow::Error;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_HAMSA_BASE_URL: &str = "https://api.tryhamsa.com/v1";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const FOLLOWUP_SCENARIO: &str = "after-sales-followup";
const FOLLOWUP_VOICE_AGENT: &str = "ac90bc4a-7e12-43c0-8009-9d462d15896c";

#[derive(Parser, Debug)]
#[command(version = crate::version::get_short_version())]
pub struct Cli {
    #[clap(long, default_value = "callgrade.toml")]
    pub conf: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub http_addr: String,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
    pub access_log_skip_paths: Vec<String>,
    pub hamsa: HamsaConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HamsaConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Used when the project cannot be resolved from the api key.
    pub project_id: Option<String>,
    /// Caller id presented on outbound calls.
    pub phone_number: Option<String>,
    pub voice_agent_id: Option<String>,
    /// Scenario id -> voice agent id, checked before `voice_agent_id`.
    pub scenario_agents: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Gemini,
    OpenAi,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    /// Provider default when unset.
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for HamsaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_HAMSA_BASE_URL.to_string(),
            api_key: None,
            project_id: None,
            phone_number: None,
            voice_agent_id: None,
            scenario_agents: HashMap::from([(
                FOLLOWUP_SCENARIO.to_string(),
                FOLLOWUP_VOICE_AGENT.to_string(),
            )]),
        }
    }
}

impl HamsaConfig {
    pub fn voice_agent_for(&self, scenario_id: Option<&str>) -> Option<&str> {
        scenario_id
            .and_then(|id| self.scenario_agents.get(id))
            .map(String::as_str)
            .or(self.voice_agent_id.as_deref())
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Gemini,
            model: None,
            api_key: None,
            base_url: None,
            temperature: 0.7,
            max_output_tokens: 8192,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_addr: "0.0.0.0:8080".to_string(),
            log_level: Some("info".to_string()),
            log_file: None,
            access_log_skip_paths: vec!["/health".to_string()],
            hamsa: HamsaConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, Error> {
        let config = toml::from_str(
            &std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("{}: {}", e, path))?,
        )?;
        Ok(config)
    }

    /// Fills every unset secret or endpoint from the process environment
    /// (after loading `.env`). Values present in the file win.
    pub fn with_env(mut self) -> Self {
        let _ = dotenv::dotenv();
        self.apply_env(|key| std::env::var(key).ok());
        self
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let hamsa = &mut self.hamsa;
        if hamsa.api_key.is_none() {
            hamsa.api_key = lookup("HAMSA_API_KEY");
        }
        if let Some(base_url) = lookup("HAMSA_BASE_URL") {
            if hamsa.base_url == DEFAULT_HAMSA_BASE_URL {
                hamsa.base_url = base_url;
            }
        }
        if hamsa.project_id.is_none() {
            hamsa.project_id = lookup("HAMSA_PROJECT_ID");
        }
        if hamsa.phone_number.is_none() {
            hamsa.phone_number = lookup("HAMSA_PHONE_NUMBER");
        }
        if hamsa.voice_agent_id.is_none() {
            hamsa.voice_agent_id = lookup("HAMSA_VOICE_AGENT_ID");
        }

        let llm = &mut self.llm;
        let (key_var, url_var) = match llm.provider {
            LlmProvider::Gemini => ("GEMINI_API_KEY", "GEMINI_BASE_URL"),
            LlmProvider::OpenAi => ("OPENAI_API_KEY", "OPENAI_BASE_URL"),
        };
        if llm.api_key.is_none() {
            llm.api_key = lookup(key_var);
        }
        if llm.base_url.is_none() {
            llm.base_url = lookup(url_var);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            http_addr = "127.0.0.1:9000"

            [llm]
            provider = "openai"
            model = "gpt-4o-mini"
            "#,
        )
        .unwrap();
        assert_eq!(config.http_addr, "127.0.0.1:9000");
        assert_eq!(config.llm.provider, LlmProvider::OpenAi);
        assert_eq!(config.llm.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.llm.max_output_tokens, 8192);
        assert_eq!(config.hamsa.base_url, DEFAULT_HAMSA_BASE_URL);
        assert_eq!(
            config.hamsa.voice_agent_for(Some(FOLLOWUP_SCENARIO)),
            Some(FOLLOWUP_VOICE_AGENT)
        );
    }

    #[test]
    fn test_env_fills_only_missing_values() {
        let mut config = Config::default();
        config.hamsa.api_key = Some("from-file".to_string());
        config.apply_env(|key| match key {
            "HAMSA_API_KEY" => Some("from-env".to_string()),
            "HAMSA_VOICE_AGENT_ID" => Some("agent-1".to_string()),
            "GEMINI_API_KEY" => Some("gemini-key".to_string()),
            "OPENAI_API_KEY" => Some("openai-key".to_string()),
            "HAMSA_PROJECT_ID" => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.hamsa.api_key.as_deref(), Some("from-file"));
        assert_eq!(config.hamsa.voice_agent_id.as_deref(), Some("agent-1"));
        assert_eq!(config.hamsa.project_id, None);
        assert_eq!(config.llm.api_key.as_deref(), Some("gemini-key"));
        assert_eq!(config.hamsa.voice_agent_for(Some("unknown")), Some("agent-1"));
    }
}
