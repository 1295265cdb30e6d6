//! Anthropic Messages API gateway
//!
//! A session is a conversation history held in memory: every send appends the
//! user prompt and the assistant reply, so a reused session carries agent-side
//! memory while a fresh session starts empty. Responses are streamed over SSE;
//! text deltas and tool blocks are forwarded as `AgentEvent`s.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde_json::{Value, json};

use super::AgentGateway;
use super::error::GatewayError;
use super::sse::{SseDecoder, StreamParser};
use super::types::{AgentResponse, EventSender, SessionHandle, SessionOptions};
use crate::id::generate_session_id;

/// Anthropic API base URL
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic API version
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default max tokens
const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Configuration for the Anthropic gateway
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub base_url: String,
    pub api_key_env: String,
    pub api_version: String,
    pub max_tokens: u32,
    /// Per-call timeout; owned here, never by the loop
    pub timeout: Duration,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            api_version: ANTHROPIC_VERSION.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone)]
struct Turn {
    role: &'static str,
    content: String,
}

#[derive(Debug)]
struct Conversation {
    options: SessionOptions,
    turns: Vec<Turn>,
}

/// Gateway backed by the Anthropic Messages API
pub struct AnthropicGateway {
    client: Client,
    api_key: String,
    config: AnthropicConfig,
    sessions: Mutex<HashMap<String, Conversation>>,
}

impl AnthropicGateway {
    /// Create a gateway, reading the API key from `config.api_key_env`
    pub fn new(config: AnthropicConfig) -> Result<Self, GatewayError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| GatewayError::MissingApiKey {
            env_var: config.api_key_env.clone(),
        })?;

        Self::with_api_key(api_key, config)
    }

    /// Create a gateway with an explicit API key
    pub fn with_api_key(api_key: String, config: AnthropicConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(GatewayError::Network)?;

        Ok(Self {
            client,
            api_key,
            config,
            sessions: Mutex::new(HashMap::new()),
        })
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, Conversation>> {
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }

    /// Build the streaming request body for a session plus the new prompt
    fn build_request(&self, options: &SessionOptions, turns: &[Turn], prompt: &str) -> Value {
        let mut messages: Vec<Value> = turns
            .iter()
            .map(|t| json!({ "role": t.role, "content": t.content }))
            .collect();
        messages.push(json!({ "role": "user", "content": prompt }));

        let mut body = json!({
            "model": options.model,
            "max_tokens": self.config.max_tokens,
            "stream": true,
            "messages": messages
        });

        if let Some(dir) = &options.working_directory {
            body["system"] = json!(format!("Working directory: {}", dir.display()));
        }

        body
    }

    async fn post(&self, body: &Value) -> Result<reqwest::Response, GatewayError> {
        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.config.api_version)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(GatewayError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl AgentGateway for AnthropicGateway {
    async fn create_session(&self, options: &SessionOptions) -> Result<SessionHandle, GatewayError> {
        if options.model.is_empty() {
            return Err(GatewayError::SessionCreate("model must not be empty".to_string()));
        }

        let handle = SessionHandle::new(generate_session_id());
        self.sessions().insert(
            handle.id().to_string(),
            Conversation {
                options: options.clone(),
                turns: Vec::new(),
            },
        );
        log::debug!("Created session {} for model {}", handle, options.model);
        Ok(handle)
    }

    async fn send(
        &self,
        session: &SessionHandle,
        prompt: &str,
        events: EventSender,
    ) -> Result<AgentResponse, GatewayError> {
        let body = {
            let sessions = self.sessions();
            let conversation = sessions
                .get(session.id())
                .ok_or_else(|| GatewayError::UnknownSession(session.id().to_string()))?;
            self.build_request(&conversation.options, &conversation.turns, prompt)
        };

        let response = self.post(&body).await?;
        let mut stream = response.bytes_stream();
        let mut decoder = SseDecoder::new();
        let mut parser = StreamParser::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for payload in decoder.push(&chunk) {
                for event in parser.process_payload(&payload).map_err(GatewayError::Stream)? {
                    // Receiver gone means nobody is observing; keep going
                    let _ = events.send(event);
                }
            }
        }

        if !parser.is_finished() {
            return Err(GatewayError::Stream("stream ended before message_stop".to_string()));
        }
        log::debug!("Session {} stop reason: {:?}", session, parser.stop_reason());

        let content = parser.into_text();
        if let Some(conversation) = self.sessions().get_mut(session.id()) {
            conversation.turns.push(Turn {
                role: "user",
                content: prompt.to_string(),
            });
            conversation.turns.push(Turn {
                role: "assistant",
                content: content.clone(),
            });
        }

        Ok(AgentResponse::new(content))
    }

    async fn destroy_session(&self, session: &SessionHandle) -> Result<(), GatewayError> {
        if self.sessions().remove(session.id()).is_some() {
            log::debug!("Destroyed session {}", session);
        }
        Ok(())
    }
}

impl std::fmt::Debug for AnthropicGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicGateway")
            .field("base_url", &self.config.base_url)
            .field("max_tokens", &self.config.max_tokens)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> AnthropicGateway {
        AnthropicGateway::with_api_key("test-key".to_string(), AnthropicConfig::default()).unwrap()
    }

    #[test]
    fn test_config_default() {
        let config = AnthropicConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(config.timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_missing_api_key() {
        let config = AnthropicConfig {
            api_key_env: "RALPH_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };
        let err = AnthropicGateway::new(config).unwrap_err();
        assert!(matches!(err, GatewayError::MissingApiKey { .. }));
    }

    #[test]
    fn test_messages_url_trims_slash() {
        let config = AnthropicConfig {
            base_url: "http://localhost:8080/".to_string(),
            ..Default::default()
        };
        let gateway = AnthropicGateway::with_api_key("k".to_string(), config).unwrap();
        assert_eq!(gateway.messages_url(), "http://localhost:8080/v1/messages");
    }

    #[test]
    fn test_build_request_first_turn() {
        let gateway = gateway();
        let options = SessionOptions::new("claude-sonnet-4-20250514").with_working_directory("/work");

        let body = gateway.build_request(&options, &[], "Hello");

        assert_eq!(body["model"], "claude-sonnet-4-20250514");
        assert_eq!(body["stream"], true);
        assert_eq!(body["max_tokens"], DEFAULT_MAX_TOKENS);
        assert_eq!(body["system"], "Working directory: /work");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Hello");
    }

    #[test]
    fn test_build_request_replays_history() {
        let gateway = gateway();
        let options = SessionOptions::new("m");
        let turns = vec![
            Turn {
                role: "user",
                content: "first".into(),
            },
            Turn {
                role: "assistant",
                content: "reply".into(),
            },
        ];

        let body = gateway.build_request(&options, &turns, "second");
        let messages = body["messages"].as_array().unwrap();

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[2]["content"], "second");
        assert!(body.get("system").is_none());
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let gateway = gateway();
        let session = gateway.create_session(&SessionOptions::new("m")).await.unwrap();
        assert_eq!(gateway.sessions().len(), 1);

        gateway.destroy_session(&session).await.unwrap();
        gateway.destroy_session(&session).await.unwrap();
        assert!(gateway.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_create_session_rejects_empty_model() {
        let gateway = gateway();
        let err = gateway.create_session(&SessionOptions::new("")).await.unwrap_err();
        assert!(matches!(err, GatewayError::SessionCreate(_)));
    }

    #[tokio::test]
    async fn test_send_unknown_session() {
        let gateway = gateway();
        let (tx, _rx) = crate::gateway::event_channel();
        let err = gateway
            .send(&SessionHandle::new("missing"), "hi", tx)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::UnknownSession(_)));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let debug_str = format!("{:?}", gateway());
        assert!(debug_str.contains("AnthropicGateway"));
        assert!(!debug_str.contains("test-key"));
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AnthropicGateway>();
    }
}
