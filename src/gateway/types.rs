//! Types exchanged with an agent gateway

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Opaque handle to a live agent session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionHandle {
    id: String,
}

impl SessionHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// How the agent should treat tool permission requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionPolicy {
    /// Approve every request (unattended runs)
    #[default]
    ApproveAll,
    /// Deny every request
    DenyAll,
}

/// Settings applied when a session is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub model: String,
    pub working_directory: Option<PathBuf>,
    pub permission_policy: Option<PermissionPolicy>,
}

impl SessionOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            working_directory: None,
            permission_policy: None,
        }
    }

    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn with_permission_policy(mut self, policy: PermissionPolicy) -> Self {
        self.permission_policy = Some(policy);
        self
    }
}

/// Final result of a send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentResponse {
    pub content: String,
}

impl AgentResponse {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Auxiliary progress emitted while a send is in flight.
///
/// Observability only: the controller never decides anything from these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    /// Partial assistant text
    MessageDelta { text: String },
    /// Final assistant message
    Message { content: String },
    /// The agent started running a tool
    ToolExecutionStart { tool_name: String },
    /// The agent finished running a tool
    ToolExecutionComplete { tool_name: String, success: bool },
}

impl AgentEvent {
    /// Name of the tool this event refers to, if any
    pub fn tool_name(&self) -> Option<&str> {
        match self {
            AgentEvent::ToolExecutionStart { tool_name } => Some(tool_name),
            AgentEvent::ToolExecutionComplete { tool_name, .. } => Some(tool_name),
            _ => None,
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<AgentEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<AgentEvent>;

/// Create the channel that carries `AgentEvent`s from a gateway to a sink.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_handle_display() {
        let handle = SessionHandle::new("session-42");
        assert_eq!(handle.id(), "session-42");
        assert_eq!(handle.to_string(), "session-42");
    }

    #[test]
    fn test_session_options_builder() {
        let options = SessionOptions::new("claude-sonnet-4-20250514")
            .with_working_directory("/tmp/project")
            .with_permission_policy(PermissionPolicy::ApproveAll);

        assert_eq!(options.model, "claude-sonnet-4-20250514");
        assert_eq!(options.working_directory, Some(PathBuf::from("/tmp/project")));
        assert_eq!(options.permission_policy, Some(PermissionPolicy::ApproveAll));
    }

    #[test]
    fn test_permission_policy_serialization() {
        let json = serde_json::to_string(&PermissionPolicy::ApproveAll).unwrap();
        assert_eq!(json, "\"approve-all\"");
        let policy: PermissionPolicy = serde_json::from_str("\"deny-all\"").unwrap();
        assert_eq!(policy, PermissionPolicy::DenyAll);
    }

    #[test]
    fn test_agent_event_tool_name() {
        let start = AgentEvent::ToolExecutionStart {
            tool_name: "bash".to_string(),
        };
        assert_eq!(start.tool_name(), Some("bash"));

        let delta = AgentEvent::MessageDelta {
            text: "hi".to_string(),
        };
        assert_eq!(delta.tool_name(), None);
    }

    #[tokio::test]
    async fn test_event_channel_delivers_in_order() {
        let (tx, mut rx) = event_channel();
        tx.send(AgentEvent::MessageDelta { text: "a".into() }).unwrap();
        tx.send(AgentEvent::MessageDelta { text: "b".into() }).unwrap();
        drop(tx);

        assert_eq!(rx.recv().await, Some(AgentEvent::MessageDelta { text: "a".into() }));
        assert_eq!(rx.recv().await, Some(AgentEvent::MessageDelta { text: "b".into() }));
        assert_eq!(rx.recv().await, None);
    }
}
