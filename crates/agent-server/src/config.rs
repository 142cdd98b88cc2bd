//! Server Configuration
//!
//! Read from the environment, with `.env` loaded first when present.

use std::time::Duration;

use anyhow::{Context, bail};

use agent_core::SessionLimits;
use agent_core::provider::DEFAULT_MODEL;
use agent_runtime::OllamaConfig;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub model: String,
    pub max_turns: usize,
    /// Deadline for each completion and each tool execution
    pub call_timeout: Option<Duration>,
    /// Override for the search backend endpoint
    pub search_api_url: Option<String>,
    pub system_prompt: Option<String>,
    pub sessions: SessionLimits,
    pub ollama: OllamaConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            model: DEFAULT_MODEL.into(),
            max_turns: 10,
            call_timeout: None,
            search_api_url: None,
            system_prompt: None,
            sessions: SessionLimits::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let max_turns = match lookup("MAX_TURNS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("MAX_TURNS must be a positive integer, got '{raw}'"))?,
            None => defaults.max_turns,
        };
        if max_turns == 0 {
            bail!("MAX_TURNS must be at least 1");
        }

        let call_timeout = lookup("CALL_TIMEOUT_SECS")
            .map(|raw| {
                raw.parse::<u64>()
                    .map(Duration::from_secs)
                    .with_context(|| format!("CALL_TIMEOUT_SECS must be whole seconds, got '{raw}'"))
            })
            .transpose()?;

        let max_sessions = match lookup("SESSION_CAPACITY") {
            Some(raw) => raw.parse().with_context(|| {
                format!("SESSION_CAPACITY must be a positive integer, got '{raw}'")
            })?,
            None => defaults.sessions.max_sessions,
        };
        if max_sessions == 0 {
            bail!("SESSION_CAPACITY must be at least 1");
        }

        let max_idle = match lookup("SESSION_IDLE_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map(Duration::from_secs)
                .with_context(|| format!("SESSION_IDLE_SECS must be whole seconds, got '{raw}'"))?,
            None => defaults.sessions.max_idle,
        };

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            model: lookup("MODEL_NAME").unwrap_or(defaults.model),
            max_turns,
            call_timeout,
            search_api_url: lookup("SEARCH_API_URL").filter(|url| !url.is_empty()),
            system_prompt: lookup("SYSTEM_PROMPT").filter(|p| !p.trim().is_empty()),
            sessions: SessionLimits {
                max_sessions,
                max_idle,
            },
            ollama: OllamaConfig::from_lookup(&lookup),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_turns, 10);
        assert!(config.call_timeout.is_none());
        assert_eq!(config.ollama.port, 11434);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("MODEL_NAME", "llama3.2"),
            ("MAX_TURNS", "3"),
            ("CALL_TIMEOUT_SECS", "30"),
            ("OLLAMA_PORT", "8080"),
            ("SESSION_CAPACITY", "50"),
            ("SESSION_IDLE_SECS", "600"),
        ])
        .unwrap();
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.max_turns, 3);
        assert_eq!(config.call_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.ollama.port, 8080);
        assert_eq!(config.sessions.max_sessions, 50);
        assert_eq!(config.sessions.max_idle, Duration::from_secs(600));
    }

    #[test]
    fn test_invalid_budget() {
        assert!(config(&[("MAX_TURNS", "0")]).is_err());
        assert!(config(&[("MAX_TURNS", "many")]).is_err());
        assert!(config(&[("CALL_TIMEOUT_SECS", "-1")]).is_err());
        assert!(config(&[("SESSION_CAPACITY", "0")]).is_err());
    }
}
