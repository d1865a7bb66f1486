use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

use super::{parse_json_text, ChatRole, InvokeRequest, LlmClient, LlmError};

const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Client for the hosting platform's `InvokeLLM` integration: one prompt
/// string in, a string or a schema-shaped object out.
#[derive(Clone)]
pub struct HostedLlm {
    http: Client,
    url: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
struct InvokeBody {
    prompt: String,
    add_context_from_internet: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_json_schema: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    file_urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

impl HostedLlm {
    pub fn new(url: String, api_key: Option<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self { http, url, api_key }
    }

    fn body(request: &InvokeRequest) -> InvokeBody {
        InvokeBody {
            prompt: fold_prompt(request),
            add_context_from_internet: request.add_context_from_internet,
            response_json_schema: request.response_json_schema.clone(),
            file_urls: request.image_url.iter().cloned().collect(),
            temperature: request.temperature,
        }
    }
}

/// The hosted endpoint takes no message list, so instructions and
/// history are folded into the single prompt.
fn fold_prompt(request: &InvokeRequest) -> String {
    let mut prompt = String::new();
    if let Some(system) = &request.system_prompt {
        prompt.push_str(system);
        prompt.push_str("\n\n");
    }
    if !request.history.is_empty() {
        prompt.push_str("Recent conversation history:\n");
        for turn in &request.history {
            let speaker = match turn.role {
                ChatRole::User => "User",
                ChatRole::Assistant => "Nutritionist",
            };
            prompt.push_str(&format!("{speaker}: {}\n", turn.content));
        }
        prompt.push('\n');
    }
    prompt.push_str(&request.prompt);
    if let Some(url) = &request.image_url {
        prompt.push_str(&format!("\n\nThe image of the meal is available at: {url}"));
    }
    prompt
}

#[async_trait]
impl LlmClient for HostedLlm {
    #[instrument(skip_all, fields(structured = request.response_json_schema.is_some()))]
    async fn invoke(&self, request: &InvokeRequest) -> Result<Value, LlmError> {
        let mut req = self.http.post(&self.url).json(&Self::body(request));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let res = req.send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let value: Value = res.json().await?;
        debug!("hosted llm answered");

        match (value, request.response_json_schema.is_some()) {
            (Value::String(text), true) => parse_json_text(&text),
            (Value::Null, _) => Err(LlmError::EmptyResponse),
            (value, _) => Ok(value),
        }
    }

    fn name(&self) -> &'static str {
        "hosted"
    }
}
