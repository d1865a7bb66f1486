use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

use super::{parse_json_text, ChatRole, HistoryTurn, InvokeRequest, LlmClient, LlmError};

const REQUEST_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_CHAT_SYSTEM_PROMPT: &str = "You are a professional nutritionist specializing in low-carb diets. Respond in Hebrew. Be helpful, accurate, and provide evidence-based advice.";
pub const DEFAULT_STRUCTURED_SYSTEM_PROMPT: &str = "You are a professional nutritionist specializing in low-carb diets. Respond in Hebrew. Return responses in the exact JSON format requested.";

/// Sampling settings for one completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChatOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatOptions {
    pub const CHAT: ChatOptions = ChatOptions {
        temperature: 0.7,
        max_tokens: 1000,
    };
    pub const STRUCTURED: ChatOptions = ChatOptions {
        temperature: 0.5,
        max_tokens: 1500,
    };
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Client for an OpenAI-compatible `chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: WireContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WireContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Everything that goes into one completion besides the model settings.
struct Conversation<'a> {
    system_prompt: &'a str,
    history: &'a [HistoryTurn],
    message: &'a str,
    image_url: Option<&'a str>,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    pub async fn send_chat_message(
        &self,
        message: &str,
        history: &[HistoryTurn],
        system_prompt: Option<&str>,
        image_url: Option<&str>,
        options: ChatOptions,
    ) -> Result<String, LlmError> {
        let conversation = Conversation {
            system_prompt: system_prompt.unwrap_or(DEFAULT_CHAT_SYSTEM_PROMPT),
            history,
            message,
            image_url,
        };
        let res = self
            .complete(&self.build_request(&conversation, options, false))
            .await?;
        first_content(&res)
    }

    /// Asks for a JSON object answer and parses it.
    pub async fn send_structured_chat_message(
        &self,
        message: &str,
        schema: &Value,
        history: &[HistoryTurn],
        system_prompt: Option<&str>,
        image_url: Option<&str>,
        options: ChatOptions,
    ) -> Result<Value, LlmError> {
        let system = format!(
            "{}\n\nAnswer with a single JSON object matching this JSON schema:\n{}",
            system_prompt.unwrap_or(DEFAULT_STRUCTURED_SYSTEM_PROMPT),
            schema
        );
        let conversation = Conversation {
            system_prompt: &system,
            history,
            message,
            image_url,
        };
        let res = self
            .complete(&self.build_request(&conversation, options, true))
            .await?;
        parse_json_text(&first_content(&res)?)
    }

    fn build_request<'a>(
        &'a self,
        conversation: &Conversation<'_>,
        options: ChatOptions,
        json: bool,
    ) -> CompletionRequest<'a> {
        let mut messages = Vec::with_capacity(conversation.history.len() + 2);
        messages.push(WireMessage {
            role: "system",
            content: WireContent::Text(conversation.system_prompt.to_string()),
        });
        messages.extend(conversation.history.iter().map(|turn| WireMessage {
            role: match turn.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
            },
            content: WireContent::Text(turn.content.clone()),
        }));
        let content = match conversation.image_url {
            Some(url) => WireContent::Parts(vec![
                ContentPart::Text {
                    text: conversation.message.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: url.to_string(),
                    },
                },
            ]),
            None => WireContent::Text(conversation.message.to_string()),
        };
        messages.push(WireMessage {
            role: "user",
            content,
        });

        CompletionRequest {
            model: &self.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            response_format: json.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }

    #[instrument(skip_all, fields(model = %self.model))]
    async fn complete(&self, body: &CompletionRequest<'_>) -> Result<CompletionResponse, LlmError> {
        let res = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: CompletionResponse = res.json().await?;
        if let Some(usage) = &parsed.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "completion usage"
            );
        }
        Ok(parsed)
    }
}

fn first_content(res: &CompletionResponse) -> Result<String, LlmError> {
    res.choices
        .first()
        .and_then(|c| c.message.content.clone())
        .filter(|c| !c.trim().is_empty())
        .ok_or(LlmError::EmptyResponse)
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn invoke(&self, request: &InvokeRequest) -> Result<Value, LlmError> {
        let mut options = if request.response_json_schema.is_some() {
            ChatOptions::STRUCTURED
        } else {
            ChatOptions::CHAT
        };
        if let Some(t) = request.temperature {
            options.temperature = t;
        }
        if let Some(m) = request.max_tokens {
            options.max_tokens = m;
        }

        match &request.response_json_schema {
            Some(schema) => {
                self.send_structured_chat_message(
                    &request.prompt,
                    schema,
                    &request.history,
                    request.system_prompt.as_deref(),
                    request.image_url.as_deref(),
                    options,
                )
                .await
            }
            None => {
                let content = self
                    .send_chat_message(
                        &request.prompt,
                        &request.history,
                        request.system_prompt.as_deref(),
                        request.image_url.as_deref(),
                        options,
                    )
                    .await?;
                Ok(Value::String(content))
            }
        }
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> OpenAiClient {
        OpenAiClient::new("sk-test".into(), "https://api.openai.com/v1/".into(), "gpt-4o".into())
    }

    #[test]
    fn request_orders_system_history_then_user() {
        let c = client();
        let history = vec![
            HistoryTurn {
                role: ChatRole::User,
                content: "שלום".into(),
            },
            HistoryTurn {
                role: ChatRole::Assistant,
                content: "היי".into(),
            },
        ];
        let conversation = Conversation {
            system_prompt: DEFAULT_CHAT_SYSTEM_PROMPT,
            history: &history,
            message: "כמה פחמימות באבוקדו?",
            image_url: None,
        };
        let body = serde_json::to_value(c.build_request(&conversation, ChatOptions::CHAT, false)).unwrap();
        let roles: Vec<_> = body["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["role"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(roles, ["system", "user", "assistant", "user"]);
        assert_eq!(body["model"], json!("gpt-4o"));
        assert_eq!(body["max_tokens"], json!(1000));
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn image_becomes_content_parts_and_json_mode_is_requested() {
        let c = client();
        let conversation = Conversation {
            system_prompt: DEFAULT_STRUCTURED_SYSTEM_PROMPT,
            history: &[],
            message: "analyse",
            image_url: Some("https://files.example.com/p.jpg"),
        };
        let body = serde_json::to_value(c.build_request(&conversation, ChatOptions::STRUCTURED, true)).unwrap();
        let user = &body["messages"][1];
        assert_eq!(user["content"][0], json!({"type": "text", "text": "analyse"}));
        assert_eq!(
            user["content"][1],
            json!({"type": "image_url", "image_url": {"url": "https://files.example.com/p.jpg"}})
        );
        assert_eq!(body["response_format"], json!({"type": "json_object"}));
        assert_eq!(body["max_tokens"], json!(1500));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        assert_eq!(client().base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn empty_choice_is_an_error() {
        let res: CompletionResponse =
            serde_json::from_value(json!({"choices": [{"message": {"content": ""}}]})).unwrap();
        assert!(matches!(first_content(&res), Err(LlmError::EmptyResponse)));
        let res: CompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"content": "ok"}}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 1, "total_tokens": 4}
        }))
        .unwrap();
        assert_eq!(first_content(&res).unwrap(), "ok");
        assert_eq!(res.usage.unwrap().total_tokens, 4);
    }
}
