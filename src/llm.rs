use crate::config::Config;
use crate::error::{DashboardError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const JSON_SYSTEM_PROMPT: &str =
    "You are a precise JSON-only responder. Always return valid JSON, no other text.";

/// One prompt sent to a language model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub prompt: String,
    /// Ask for a bare JSON document instead of prose
    pub json_output: bool,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            json_output: false,
            temperature: 0.3,
        }
    }

    pub fn json(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            json_output: true,
            temperature: 0.1,
        }
    }
}

/// Anything that can answer a prompt. The advisor and assistant only see
/// this trait, so tests swap in scripted models.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

/// OpenAI-compatible chat-completions client
#[derive(Clone)]
pub struct LlmClient {
    api_key: Option<String>,
    base_url: String,
    model: String,
    http: reqwest::Client,
}

impl LlmClient {
    pub fn new(api_key: Option<String>, model: String, base_url: String) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            http: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let mut client = Self::new(config.api_key.clone(), config.model.clone(), config.base_url.clone());
        client.http = http;
        Ok(client)
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn call_llm(&self, request: &CompletionRequest) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            warn!("API key not found in environment");
            DashboardError::CredentialMissing
        })?;

        let mut messages = Vec::new();
        if request.json_output {
            messages.push(serde_json::json!({"role": "system", "content": JSON_SYSTEM_PROMPT}));
        }
        messages.push(serde_json::json!({"role": "user", "content": request.prompt}));

        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": request.temperature,
        });

        debug!("Calling {} with a {} byte prompt", self.model, request.prompt.len());
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| DashboardError::RemoteService(format!("LLM API call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(DashboardError::RemoteService(format!(
                "LLM API returned {}: {}",
                status, text
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DashboardError::InvalidResponse(format!("Failed to parse LLM response: {}", e)))?;

        let content = response_json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| DashboardError::InvalidResponse("No content in LLM response".to_string()))?;

        Ok(content.to_string())
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        self.call_llm(&request).await
    }
}

/// Strip markdown code fences models like to wrap JSON in.
pub fn strip_code_fences(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  [] "), "[]");
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let client = LlmClient::new(Some("  ".to_string()), "m".to_string(), "http://x/".to_string());
        assert!(!client.has_credential());
        assert_eq!(client.base_url, "http://x");
    }

    #[tokio::test]
    async fn test_missing_credential_fails_without_network() {
        let client = LlmClient::new(None, "m".to_string(), "http://127.0.0.1:9".to_string());
        let err = client.complete(CompletionRequest::text("hi")).await.unwrap_err();
        assert!(matches!(err, DashboardError::CredentialMissing));
    }
}
