use crate::error::SearchError;
use crate::openai::{post_json, OpenAiConfig};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// One non-streaming completion; returns the reply text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, SearchError>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiChatModel {
    client: Client,
    config: OpenAiConfig,
    model: String,
    temperature: f32,
}

impl OpenAiChatModel {
    pub fn new(config: OpenAiConfig, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            client: Client::new(),
            config,
            model: model.into(),
            temperature,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, SearchError> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            stream: false,
        };
        let response: CompletionResponse =
            post_json(&self.client, &self.config, "chat/completions", &request).await?;

        first_choice_text(response)
    }
}

fn first_choice_text(response: CompletionResponse) -> Result<String, SearchError> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or_else(|| SearchError::backend("openai", "completion returned no choices"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn messages_serialize_with_lowercase_roles() {
        let value = serde_json::to_value(ChatMessage::system("be brief")).unwrap();
        assert_eq!(value, json!({"role": "system", "content": "be brief"}));
    }

    #[test]
    fn request_body_disables_streaming() {
        let messages = vec![ChatMessage::user("hi")];
        let request = CompletionRequest {
            model: "gpt-4o",
            messages: &messages,
            temperature: 0.0,
            stream: false,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["stream"], json!(false));
        assert_eq!(value["temperature"], json!(0.0));
        assert_eq!(value["messages"][0]["role"], json!("user"));
    }

    #[test]
    fn reply_text_comes_from_first_choice() {
        let response: CompletionResponse = serde_json::from_value(json!({
            "choices": [
                {"message": {"role": "assistant", "content": "Revenue was 86.2bn."}},
                {"message": {"role": "assistant", "content": "ignored"}}
            ]
        }))
        .unwrap();
        assert_eq!(first_choice_text(response).unwrap(), "Revenue was 86.2bn.");
    }

    #[test]
    fn empty_choices_is_an_error() {
        let response: CompletionResponse =
            serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(first_choice_text(response).is_err());
    }
}
