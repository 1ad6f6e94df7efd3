use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Generated text plus the raw provider response
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub raw: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum CompletionError {
    /// The provider rejected the request itself, usually because the input is too large
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Failed(String),
}

/// A chat-style text completion backend.
///
/// The credential is supplied per call so one service instance can serve many callers.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, credential: &str, messages: &[ChatMessage]) -> Result<Completion, CompletionError>;
}

/// Pick a provider from the model name
pub fn provider_for(client: reqwest::Client, model: &str, api_base: Option<&str>) -> Box<dyn CompletionService> {
    if is_anthropic_model(model) {
        let base = api_base.unwrap_or(ANTHROPIC_API_BASE);
        Box::new(AnthropicCompletion::new(client, model, base))
    } else {
        let base = api_base.unwrap_or(OPENAI_API_BASE);
        Box::new(OpenAiCompletion::new(client, model, base))
    }
}

pub fn is_anthropic_model(model: &str) -> bool {
    model.starts_with("claude")
}

/// Environment variable conventionally holding the key for `model`'s provider
pub fn api_key_env(model: &str) -> &'static str {
    if is_anthropic_model(model) {
        "ANTHROPIC_API_KEY"
    } else {
        "OPENAI_API_KEY"
    }
}

pub struct OpenAiCompletion {
    client: reqwest::Client,
    model: String,
    api_base: String,
}

impl OpenAiCompletion {
    pub fn new(client: reqwest::Client, model: &str, api_base: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    async fn complete(&self, credential: &str, messages: &[ChatMessage]) -> Result<Completion, CompletionError> {
        debug!("Requesting completion via OpenAI API with model {}", self.model);

        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(credential)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Failed(e.to_string()))?;

        let json = read_response(resp, "OpenAI").await?;
        let content = extract_openai_text(&json)?;
        Ok(Completion { content, raw: json })
    }
}

pub struct AnthropicCompletion {
    client: reqwest::Client,
    model: String,
    api_base: String,
}

impl AnthropicCompletion {
    pub fn new(client: reqwest::Client, model: &str, api_base: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CompletionService for AnthropicCompletion {
    async fn complete(&self, credential: &str, messages: &[ChatMessage]) -> Result<Completion, CompletionError> {
        debug!("Requesting completion via Anthropic API with model {}", self.model);

        // The messages API takes the system prompt as a top-level field
        let system = messages
            .iter()
            .filter(|m| m.role == "system")
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let turns: Vec<_> = messages.iter().filter(|m| m.role != "system").collect();

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": 4096,
            "system": system,
            "messages": turns,
        });

        let resp = self
            .client
            .post(format!("{}/messages", self.api_base))
            .header("x-api-key", credential)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Failed(e.to_string()))?;

        let json = read_response(resp, "Anthropic").await?;
        let content = extract_anthropic_text(&json)?;
        Ok(Completion { content, raw: json })
    }
}

async fn read_response(resp: reqwest::Response, provider: &str) -> Result<serde_json::Value, CompletionError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let message = format!("{provider} API returned {status}: {body}");
        return Err(classify_failure(status.as_u16(), &body, message));
    }

    resp.json()
        .await
        .map_err(|e| CompletionError::Failed(format!("invalid {provider} API response: {e}")))
}

fn classify_failure(status: u16, body: &str, message: String) -> CompletionError {
    if status == 400 || body.contains("invalid_request_error") {
        CompletionError::InvalidRequest(message)
    } else {
        CompletionError::Failed(message)
    }
}

fn extract_openai_text(json: &serde_json::Value) -> Result<String, CompletionError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .map(|t| t.to_string())
        .ok_or_else(|| CompletionError::Failed("unexpected OpenAI API response format".to_string()))
}

fn extract_anthropic_text(json: &serde_json::Value) -> Result<String, CompletionError> {
    let text = json
        .get("content")
        .and_then(|c| c.as_array())
        .map(|blocks| {
            blocks
                .iter()
                .filter_map(|block| {
                    if block.get("type")?.as_str()? == "text" {
                        block.get("text")?.as_str()
                    } else {
                        None
                    }
                })
                .collect::<String>()
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(CompletionError::Failed("unexpected Anthropic API response format".to_string()));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_anthropic_model() {
        assert!(is_anthropic_model("claude-sonnet-4-6"));
        assert!(!is_anthropic_model("gpt-4o"));
        assert_eq!(api_key_env("claude-3-opus-20240229"), "ANTHROPIC_API_KEY");
        assert_eq!(api_key_env("gpt-4o-mini"), "OPENAI_API_KEY");
    }

    #[test]
    fn test_chat_message_serializes_role_and_content() {
        let json = serde_json::to_value(ChatMessage::system("rules")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "system", "content": "rules"}));
    }

    #[test]
    fn test_classify_failure() {
        assert!(matches!(
            classify_failure(400, "{}", "bad".to_string()),
            CompletionError::InvalidRequest(_)
        ));
        assert!(matches!(
            classify_failure(413, r#"{"error":{"type":"invalid_request_error"}}"#, "big".to_string()),
            CompletionError::InvalidRequest(_)
        ));
        assert!(matches!(
            classify_failure(500, "oops", "server".to_string()),
            CompletionError::Failed(_)
        ));
        assert!(matches!(classify_failure(401, "", "auth".to_string()), CompletionError::Failed(_)));
    }

    #[test]
    fn test_extract_openai_text() {
        let json = serde_json::json!({
            "choices": [
                {
                    "message": {
                        "role": "assistant",
                        "content": "00:00:00 Intro"
                    }
                }
            ]
        });
        assert_eq!(extract_openai_text(&json).unwrap(), "00:00:00 Intro");
    }

    #[test]
    fn test_extract_openai_text_empty() {
        let json = serde_json::json!({"choices": []});
        assert!(extract_openai_text(&json).is_err());
    }

    #[test]
    fn test_extract_anthropic_text() {
        let json = serde_json::json!({
            "content": [
                {"type": "text", "text": "00:00:00 Intro\n"},
                {"type": "text", "text": "00:05:00 Setup"}
            ]
        });
        assert_eq!(extract_anthropic_text(&json).unwrap(), "00:00:00 Intro\n00:05:00 Setup");
    }

    #[test]
    fn test_extract_anthropic_text_empty() {
        let json = serde_json::json!({"content": []});
        assert!(extract_anthropic_text(&json).is_err());
    }
}
