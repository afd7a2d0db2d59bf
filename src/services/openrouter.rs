//! Chat completions through the OpenRouter API.
//!
//! OpenRouter speaks the `OpenAI` chat completions protocol, so requests are
//! built with `async_openai` types and sent with plain `reqwest` to get at
//! the HTTP status for error classification.

use std::future::Future;

use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs,
};
use reqwest::StatusCode;
use serde::Deserialize;
use tap::Tap;

use crate::config;
use crate::conversation::{ConversationTurn, Role};

/// Something that can continue a conversation.
pub trait Completion {
    fn complete(
        &self,
        conversation: &[ConversationTurn],
    ) -> impl Future<Output = Result<String, CompletionError>> + Send;
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    #[error("invalid API key")]
    Unauthorized,
    #[error("rate limited")]
    RateLimited,
    #[error("bad request: {}", .0.as_deref().unwrap_or("no details"))]
    BadRequest(Option<String>),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("connection error")]
    Connection,
    #[error("request timed out")]
    Timeout,
    #[error("no choices in response")]
    EmptyResponse,
    #[error("{0}")]
    Unknown(String),
}

impl CompletionError {
    /// Message shown to the user when a completion fails.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized => "❌ API error: HTTP 401: invalid API key".to_string(),
            Self::RateLimited => {
                "❌ API error: HTTP 429: request limit exceeded".to_string()
            }
            Self::BadRequest(Some(detail)) => {
                format!("❌ API error: HTTP 400: {detail}")
            }
            Self::BadRequest(None) => {
                "❌ API error: HTTP 400: invalid request, check your query."
                    .to_string()
            }
            Self::Status(status) => {
                format!("❌ API error: HTTP {status}: unknown error")
            }
            Self::Connection => {
                "❌ Connection error. Please check your internet access."
                    .to_string()
            }
            Self::Timeout => {
                "⏰ Connection timed out. Please try again.".to_string()
            }
            Self::EmptyResponse => {
                "❌ No response was given. Please try again.".to_string()
            }
            Self::Unknown(_) => {
                "❌ An unexpected error occurred. Please try again.".to_string()
            }
        }
    }

    /// Short label for metrics.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::RateLimited => "rate_limited",
            Self::BadRequest(_) => "bad_request",
            Self::Status(_) => "status",
            Self::Connection => "connection",
            Self::Timeout => "timeout",
            Self::EmptyResponse => "empty_response",
            Self::Unknown(_) => "unknown",
        }
    }

    fn from_status(status: StatusCode, body: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            StatusCode::BAD_REQUEST => Self::BadRequest(error_detail(body)),
            _ => Self::Status(status.as_u16()),
        }
    }

    fn from_transport(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() || e.is_request() {
            Self::Connection
        } else {
            Self::Unknown(e.to_string())
        }
    }
}

impl From<OpenAIError> for CompletionError {
    fn from(e: OpenAIError) -> Self {
        Self::Unknown(e.to_string())
    }
}

/// Extract `error.message` from an error response body.
fn error_detail(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorObject,
    }
    #[derive(Deserialize)]
    struct ErrorObject {
        message: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.message)
        .filter(|m| !m.trim().is_empty())
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

pub struct OpenRouterClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u16,
    temperature: f32,
    top_p: f32,
    referer: String,
    title: String,
}

impl OpenRouterClient {
    #[allow(clippy::cast_possible_truncation)] // Sampling parameters are small.
    pub fn new(http: reqwest::Client, config: &config::OpenRouter) -> Self {
        Self {
            http,
            endpoint: format!(
                "{}/chat/completions",
                config.api_base.trim_end_matches('/')
            ),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature as f32,
            top_p: config.top_p as f32,
            referer: config.referer.clone(),
            title: config.title.clone(),
        }
    }

    fn build_request(
        &self,
        conversation: &[ConversationTurn],
    ) -> Result<CreateChatCompletionRequest, OpenAIError> {
        let messages = conversation
            .iter()
            .map(request_message)
            .collect::<Result<Vec<_>, _>>()?;
        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .top_p(self.top_p)
            .build()
    }

    async fn send(
        &self,
        request: &CreateChatCompletionRequest,
    ) -> Result<String, CompletionError> {
        log::debug!(
            "Sending request to OpenRouter: {}",
            serde_json::to_string(request).unwrap_or_default()
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(request)
            .send()
            .await
            .map_err(|e| CompletionError::from_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("OpenRouter returned {status}: {body}");
            return Err(CompletionError::from_status(status, &body));
        }

        let response = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| CompletionError::from_transport(&e))?;

        if let Some(usage) = &response.usage {
            crate::metrics::record_tokens(
                usage.prompt_tokens,
                usage.completion_tokens,
            );
        }

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(CompletionError::EmptyResponse)?;
        log::debug!("OpenRouter response: {content}");
        Ok(content)
    }
}

impl Completion for OpenRouterClient {
    async fn complete(
        &self,
        conversation: &[ConversationTurn],
    ) -> Result<String, CompletionError> {
        let request = self.build_request(conversation)?;
        self.send(&request).await.tap(|r| {
            crate::metrics::update_service("openrouter", r.is_ok());
        })
    }
}

fn request_message(
    turn: &ConversationTurn,
) -> Result<ChatCompletionRequestMessage, OpenAIError> {
    let content = turn.content().to_string();
    Ok(match turn.role() {
        Role::System => ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(content)
                .build()?,
        ),
        Role::User => ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(content)
                .build()?,
        ),
        Role::Assistant => ChatCompletionRequestMessage::Assistant(
            ChatCompletionRequestAssistantMessageArgs::default()
                .content(content)
                .build()?,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OpenRouterClient {
        OpenRouterClient::new(
            reqwest::Client::new(),
            &config::OpenRouter {
                api_key: "key".to_string(),
                api_base: "https://openrouter.ai/api/v1/".to_string(),
                model: "deepseek/deepseek-chat".to_string(),
                model_name: "DeepSeek AI".to_string(),
                max_tokens: 4000,
                temperature: 0.7,
                top_p: 0.9,
                timeout_secs: 60,
                referer: "https://t.me/".to_string(),
                title: "bot".to_string(),
            },
        )
    }

    #[test]
    fn request_carries_conversation_in_order() -> anyhow::Result<()> {
        let client = client();
        assert_eq!(
            client.endpoint,
            "https://openrouter.ai/api/v1/chat/completions"
        );

        let request = client.build_request(&[
            ConversationTurn::system("be nice"),
            ConversationTurn::user("hi"),
            ConversationTurn::assistant("hello"),
        ])?;
        let json = serde_json::to_value(&request)?;
        assert_eq!(json["model"], "deepseek/deepseek-chat");
        assert_eq!(json["max_tokens"], 4000);
        let roles = json["messages"]
            .as_array()
            .map(|m| m.iter().map(|m| m["role"].clone()).collect::<Vec<_>>());
        assert_eq!(
            roles,
            Some(vec![
                serde_json::json!("system"),
                serde_json::json!("user"),
                serde_json::json!("assistant"),
            ])
        );
        assert_eq!(json["messages"][1]["content"], "hi");
        Ok(())
    }

    #[test]
    fn statuses_are_classified() {
        assert_eq!(
            CompletionError::from_status(StatusCode::UNAUTHORIZED, ""),
            CompletionError::Unauthorized
        );
        assert_eq!(
            CompletionError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            CompletionError::RateLimited
        );
        assert_eq!(
            CompletionError::from_status(
                StatusCode::BAD_REQUEST,
                r#"{"error": {"message": "context too long", "code": 400}}"#
            ),
            CompletionError::BadRequest(Some("context too long".to_string()))
        );
        assert_eq!(
            CompletionError::from_status(StatusCode::BAD_REQUEST, "<html>"),
            CompletionError::BadRequest(None)
        );
        assert_eq!(
            CompletionError::from_status(StatusCode::BAD_GATEWAY, ""),
            CompletionError::Status(502)
        );
    }

    #[test]
    fn every_error_has_its_own_message() {
        let errors = [
            CompletionError::Unauthorized,
            CompletionError::RateLimited,
            CompletionError::BadRequest(Some("detail".to_string())),
            CompletionError::BadRequest(None),
            CompletionError::Status(503),
            CompletionError::Connection,
            CompletionError::Timeout,
            CompletionError::EmptyResponse,
            CompletionError::Unknown("boom".to_string()),
        ];
        let mut messages =
            errors.iter().map(CompletionError::user_message).collect::<Vec<_>>();
        assert!(messages[2].ends_with("detail"));
        messages.sort();
        messages.dedup();
        assert_eq!(messages.len(), errors.len());
    }
}
