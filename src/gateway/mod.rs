//! Agent gateway - the boundary to an external agent session service
//!
//! This module provides:
//! - The AgentGateway trait (create / send / destroy)
//! - Session, response and event types
//! - AnthropicGateway, backed by the Messages API with streaming
//! - ScriptedGateway, a deterministic in-process gateway

pub mod anthropic;
pub mod error;
pub mod scripted;
pub mod sse;
pub mod types;

use async_trait::async_trait;

pub use anthropic::{AnthropicConfig, AnthropicGateway};
pub use error::GatewayError;
pub use scripted::{ScriptedGateway, ScriptedReply};
pub use types::{
    AgentEvent, AgentResponse, EventReceiver, EventSender, PermissionPolicy, SessionHandle, SessionOptions,
    event_channel,
};

/// A conversational agent service.
///
/// `send` resolves only once the final response (or an error) is available,
/// however the transport delivers content underneath. Partial content and tool
/// notifications go to `events` and are for observability only. Implementations
/// must not keep clones of `events` alive after `send` returns.
#[async_trait]
pub trait AgentGateway: Send + Sync {
    /// Open a new session
    async fn create_session(&self, options: &SessionOptions) -> Result<SessionHandle, GatewayError>;

    /// Send a prompt and wait for the final response
    async fn send(
        &self,
        session: &SessionHandle,
        prompt: &str,
        events: EventSender,
    ) -> Result<AgentResponse, GatewayError>;

    /// Close a session. Destroying an unknown or already destroyed session is not an error.
    async fn destroy_session(&self, session: &SessionHandle) -> Result<(), GatewayError>;
}
