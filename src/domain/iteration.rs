//! Iteration records - what happened on each pass through the loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gateway::AgentEvent;

/// Tool activity observed during an iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ToolEvent {
    Started { tool_name: String },
    Completed { tool_name: String, success: bool },
}

impl ToolEvent {
    /// Tool event carried by an agent event, if it is one
    pub fn from_agent_event(event: &AgentEvent) -> Option<Self> {
        match event {
            AgentEvent::ToolExecutionStart { tool_name } => Some(ToolEvent::Started {
                tool_name: tool_name.clone(),
            }),
            AgentEvent::ToolExecutionComplete { tool_name, success } => Some(ToolEvent::Completed {
                tool_name: tool_name.clone(),
                success: *success,
            }),
            _ => None,
        }
    }

    pub fn tool_name(&self) -> &str {
        match self {
            ToolEvent::Started { tool_name } | ToolEvent::Completed { tool_name, .. } => tool_name,
        }
    }
}

/// An iteration that has started but not finished.
#[derive(Debug)]
pub struct PendingIteration {
    index: u32,
    prompt_sent: String,
    tool_events: Vec<ToolEvent>,
    partial_text: String,
    started_at: DateTime<Utc>,
}

impl PendingIteration {
    pub fn start(index: u32, prompt_sent: impl Into<String>) -> Self {
        Self {
            index,
            prompt_sent: prompt_sent.into(),
            tool_events: Vec::new(),
            partial_text: String::new(),
            started_at: Utc::now(),
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn prompt(&self) -> &str {
        &self.prompt_sent
    }

    pub fn record_tool_event(&mut self, event: ToolEvent) {
        self.tool_events.push(event);
    }

    /// Keep streamed text so a failed send still shows what arrived
    pub fn record_text_delta(&mut self, text: &str) {
        self.partial_text.push_str(text);
    }

    /// Finalize with the agent's response
    pub fn succeed(self, response_text: impl Into<String>) -> IterationRecord {
        self.finish(Some(response_text.into()), None)
    }

    /// Finalize with an error
    pub fn fail(self, error: impl Into<String>) -> IterationRecord {
        self.finish(None, Some(error.into()))
    }

    fn finish(self, response_text: Option<String>, error: Option<String>) -> IterationRecord {
        let partial_response = if error.is_some() && !self.partial_text.is_empty() {
            Some(self.partial_text)
        } else {
            None
        };
        IterationRecord {
            index: self.index,
            prompt_sent: self.prompt_sent,
            response_text,
            tool_events: self.tool_events,
            error,
            partial_response,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

/// A finished iteration. Only produced by `PendingIteration`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationRecord {
    /// 1-based iteration index
    pub index: u32,
    pub prompt_sent: String,
    /// Absent when the iteration errored
    pub response_text: Option<String>,
    /// Observability only
    pub tool_events: Vec<ToolEvent>,
    pub error: Option<String>,
    /// Text streamed before the iteration errored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_response: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl IterationRecord {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Full response, or whatever arrived before a failure
    pub fn produced_text(&self) -> Option<&str> {
        self.response_text.as_deref().or(self.partial_response.as_deref())
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
