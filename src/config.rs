//! Runtime configuration read from the environment (and `.env` via dotenv)

use crate::error::{DashboardError, Result};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `None` degrades the advisor and assistant to their fallbacks
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// `API_KEY` (or `OPENAI_API_KEY`), `OPENAI_MODEL`, `OPENAI_BASE_URL`,
    /// `LLM_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let timeout_secs = match non_empty("LLM_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                DashboardError::Config(format!("LLM_TIMEOUT_SECS must be a whole number, got '{}'", raw))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_key: non_empty("API_KEY").or_else(|| non_empty("OPENAI_API_KEY")),
            model: non_empty("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: non_empty("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_api_key_precedence() {
        let config = Config::from_lookup(lookup(&[("API_KEY", "a"), ("OPENAI_API_KEY", "b")])).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("a"));

        let config = Config::from_lookup(lookup(&[("API_KEY", " "), ("OPENAI_API_KEY", "b")])).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("b"));
    }

    #[test]
    fn test_overrides_and_bad_timeout() {
        let config = Config::from_lookup(lookup(&[
            ("OPENAI_MODEL", "gpt-4"),
            ("OPENAI_BASE_URL", "http://localhost:1234/v1"),
            ("LLM_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.base_url, "http://localhost:1234/v1");
        assert_eq!(config.timeout_secs, 5);

        let err = Config::from_lookup(lookup(&[("LLM_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, DashboardError::Config(_)));
    }
}
