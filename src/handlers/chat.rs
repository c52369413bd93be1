//! Chat proxy handler
//!
//! Forwards a conversation to the chat-completion provider with the
//! server-held key as a bearer token, and relays the provider's JSON verbatim.

use crate::config::ChatProviderConfig;
use crate::error::{AppError, AppResult};
use crate::handlers::{AppState, finish, preflight};
use crate::middleware::RequestId;
use crate::shared::{Proxy, upstream};
use axum::{
    Extension,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::Method,
    response::Response,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Conversation role of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Developer,
    User,
    Assistant,
    Tool,
}

/// One message of the conversation
///
/// `content` is forwarded as-is: a string, an array of content parts, or
/// `null` alongside `tool_calls`. Keys other than `role` and `content` are
/// kept in their original order and forwarded unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatMessage {
    /// Plain text message
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Value::String(content.into()),
            extra: Map::new(),
        }
    }
}

/// Body accepted from the frontend
///
/// Only `messages` is read; any other top-level keys are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

/// Body sent to the provider
#[derive(Debug, Clone, Serialize)]
pub struct ProviderChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl<'a> ProviderChatRequest<'a> {
    /// Attach the configured model and sampling constants to the messages
    pub fn new(config: &'a ChatProviderConfig, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: config.model(),
            messages,
            temperature: config.temperature(),
            max_tokens: config.max_tokens(),
        }
    }
}

/// Chat proxy handler
///
/// `OPTIONS` is a preflight. Any other method is treated as the proxy call.
/// A body the server refuses to buffer (e.g. over the size limit) takes the
/// same generic failure path as one that does not parse.
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    method: Method,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    if method == Method::OPTIONS {
        return preflight(&state, Proxy::Chat, &request_id);
    }

    let result = forward(&state, &request_id, body).await;
    finish(&state, Proxy::Chat, &request_id, result)
}

async fn forward(
    state: &AppState,
    request_id: &RequestId,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<Value> {
    let chat_config = &state.config().chat;

    let secret = state
        .secrets()
        .chat()
        .ok_or_else(|| AppError::MissingSecret {
            provider: Proxy::Chat.as_str(),
            env_var: chat_config.api_key_env().to_string(),
        })?;

    let body = body.map_err(AppError::BodyRead)?;
    let request: ChatRequest = serde_json::from_slice(&body).map_err(AppError::InvalidBody)?;

    tracing::debug!(
        request_id = %request_id,
        message_count = request.messages.len(),
        model = %chat_config.model(),
        "Forwarding chat request"
    );

    let payload = ProviderChatRequest::new(chat_config, request.messages);
    let outbound = state
        .client()
        .post(chat_config.endpoint())
        .bearer_auth(secret.expose())
        .json(&payload);

    upstream::send_json(Proxy::Chat, outbound, state.metrics()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::json;

    #[test]
    fn test_chat_request_parses_messages() {
        let request: ChatRequest = serde_json::from_value(json!({
            "messages": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "hi"}
            ]
        }))
        .expect("should parse");

        assert_eq!(
            request.messages,
            vec![
                ChatMessage::new(Role::System, "be brief"),
                ChatMessage::new(Role::User, "hi"),
            ]
        );
    }

    #[test]
    fn test_chat_request_ignores_other_top_level_keys() {
        let request: ChatRequest = serde_json::from_value(json!({
            "messages": [],
            "model": "caller-chosen-model"
        }))
        .expect("should parse");
        assert!(request.messages.is_empty());
    }

    #[test]
    fn test_chat_request_rejects_missing_messages() {
        assert!(serde_json::from_value::<ChatRequest>(json!({})).is_err());
    }

    #[test]
    fn test_chat_request_rejects_unknown_role() {
        let result = serde_json::from_value::<ChatRequest>(json!({
            "messages": [{"role": "narrator", "content": "once upon a time"}]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_message_extra_keys_round_trip() {
        let raw = json!({"role": "assistant", "content": "hello", "name": "bot"});
        let message: ChatMessage = serde_json::from_value(raw.clone()).expect("should parse");
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.extra.get("name"), Some(&json!("bot")));
        assert_eq!(serde_json::to_value(&message).expect("should serialize"), raw);
    }

    #[test]
    fn test_structured_content_and_developer_role_accepted() {
        let request: ChatRequest = serde_json::from_value(json!({
            "messages": [
                {"role": "developer", "content": "answer in French"},
                {"role": "user", "content": [{"type": "text", "text": "hi"}]},
                {"role": "assistant", "content": null, "tool_calls": [{"id": "call_1"}]}
            ]
        }))
        .expect("should parse");

        assert_eq!(request.messages[0].role, Role::Developer);
        assert_eq!(
            request.messages[1].content,
            json!([{"type": "text", "text": "hi"}])
        );
        assert_eq!(request.messages[2].content, Value::Null);
        assert_eq!(
            request.messages[2].extra.get("tool_calls"),
            Some(&json!([{"id": "call_1"}]))
        );
    }

    #[test]
    fn test_message_extra_keys_keep_their_order() {
        let raw = r#"{"role":"user","content":"hi","zeta":1,"alpha":2,"name":"visitor"}"#;
        let message: ChatMessage = serde_json::from_str(raw).expect("should parse");
        assert_eq!(
            serde_json::to_string(&message).expect("should serialize"),
            raw
        );
    }

    #[test]
    fn test_provider_request_uses_configured_constants() {
        let config = Config::default();
        let payload =
            ProviderChatRequest::new(&config.chat, vec![ChatMessage::new(Role::User, "hi")]);

        assert_eq!(
            serde_json::to_value(&payload).expect("should serialize"),
            json!({
                "model": "llama-3.3-70b-versatile",
                "messages": [{"role": "user", "content": "hi"}],
                "temperature": 0.7,
                "max_tokens": 500
            })
        );
    }
}
