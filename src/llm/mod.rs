//! Prompt-in, JSON-out access to a language model.
//!
//! Two backends sit behind [`LlmClient`]: the hosted `InvokeLLM`
//! integration endpoint and any OpenAI-compatible chat-completions API.
//! [`FallbackLlm`] chains them so a failing primary is retried once on the
//! secondary.

pub mod analysis;
mod fallback;
mod hosted;
mod openai;
pub mod product;
pub mod prompts;
#[cfg(test)]
pub mod testing;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{LlmConfig, LlmProviderKind};

pub use fallback::FallbackLlm;
pub use hosted::HostedLlm;
pub use openai::OpenAiClient;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("llm request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("llm returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("llm returned invalid JSON: {0}")]
    InvalidJson(String),
    #[error("llm returned an empty response")]
    EmptyResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

/// One earlier message passed along as conversation context.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryTurn {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct InvokeRequest {
    pub system_prompt: Option<String>,
    pub prompt: String,
    pub history: Vec<HistoryTurn>,
    /// When set the model must answer with an object matching this schema.
    pub response_json_schema: Option<Value>,
    pub image_url: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub add_context_from_internet: bool,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// A JSON object when a schema was requested, a JSON string otherwise.
    async fn invoke(&self, request: &InvokeRequest) -> Result<Value, LlmError>;

    fn name(&self) -> &'static str;
}

/// Plain-text view of a model answer.
pub fn text_of(value: &Value) -> Result<String, LlmError> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(s.clone()),
        Value::String(_) | Value::Null => Err(LlmError::EmptyResponse),
        other => Ok(other.to_string()),
    }
}

/// Parses a JSON document out of model text, tolerating a Markdown code
/// fence around it.
pub fn parse_json_text(text: &str) -> Result<Value, LlmError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();
    serde_json::from_str(body).map_err(|e| LlmError::InvalidJson(e.to_string()))
}

pub fn from_config(cfg: &LlmConfig) -> anyhow::Result<Arc<dyn LlmClient>> {
    let hosted = cfg.hosted_url.as_ref().map(|url| {
        Arc::new(HostedLlm::new(url.clone(), cfg.hosted_api_key.clone())) as Arc<dyn LlmClient>
    });
    let openai = cfg.openai_api_key.as_ref().map(|key| {
        Arc::new(OpenAiClient::new(
            key.clone(),
            cfg.openai_base_url.clone(),
            cfg.openai_model.clone(),
        )) as Arc<dyn LlmClient>
    });

    let (primary, secondary) = match cfg.provider {
        LlmProviderKind::OpenAi => (openai, hosted),
        LlmProviderKind::Hosted => (hosted, openai),
    };
    let primary = primary.ok_or_else(|| {
        anyhow::anyhow!("LLM provider {:?} selected but not configured", cfg.provider)
    })?;
    Ok(match secondary {
        Some(secondary) => Arc::new(FallbackLlm::new(primary, secondary)),
        None => primary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_fenced_json() {
        let v = parse_json_text("```json\n{\"a\": 1}\n```").unwrap();
        assert_eq!(v, json!({"a": 1}));
        let v = parse_json_text("  {\"b\": true} ").unwrap();
        assert_eq!(v, json!({"b": true}));
        assert!(matches!(parse_json_text("not json"), Err(LlmError::InvalidJson(_))));
    }

    #[test]
    fn text_of_rejects_empty_answers() {
        assert_eq!(text_of(&json!("שלום")).unwrap(), "שלום");
        assert!(matches!(text_of(&json!("  ")), Err(LlmError::EmptyResponse)));
        assert!(matches!(text_of(&Value::Null), Err(LlmError::EmptyResponse)));
    }

    fn cfg(provider: LlmProviderKind, hosted: bool, openai: bool) -> LlmConfig {
        LlmConfig {
            provider,
            hosted_url: hosted.then(|| "https://llm.example.com/invoke".to_string()),
            hosted_api_key: None,
            openai_api_key: openai.then(|| "sk-test".to_string()),
            openai_base_url: "https://api.openai.com/v1".into(),
            openai_model: "gpt-4o".into(),
        }
    }

    #[test]
    fn picks_primary_and_fallback_from_config() {
        let only_hosted = from_config(&cfg(LlmProviderKind::Hosted, true, false)).unwrap();
        assert_eq!(only_hosted.name(), "hosted");

        let both = from_config(&cfg(LlmProviderKind::OpenAi, true, true)).unwrap();
        assert_eq!(both.name(), "fallback");

        assert!(from_config(&cfg(LlmProviderKind::OpenAi, true, false)).is_err());
    }
}
