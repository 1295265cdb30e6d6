//! Scripted gateway - replays a fixed sequence of replies
//!
//! Used by tests and dry runs. Every call is recorded so callers can assert on
//! prompts sent and on session create/destroy parity.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::error::GatewayError;
use super::types::{AgentEvent, AgentResponse, EventSender, SessionHandle, SessionOptions};
use super::AgentGateway;
use crate::id::generate_session_id;

/// One scripted answer to a `send`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedReply {
    /// Respond with this text
    Respond(String),
    /// Report tool executions, then respond with this text
    WithTools { content: String, tools: Vec<String> },
    /// Fail the send
    Fail(String),
    /// Stream these text deltas, then fail the send
    FailAfterDeltas { deltas: Vec<String>, message: String },
    /// Never resolve (exercises cancellation and deadlines)
    Hang,
}

impl From<&str> for ScriptedReply {
    fn from(content: &str) -> Self {
        ScriptedReply::Respond(content.to_string())
    }
}

impl From<String> for ScriptedReply {
    fn from(content: String) -> Self {
        ScriptedReply::Respond(content)
    }
}

/// In-process gateway that answers from a script.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<ScriptedReply>>,
    prompts: Mutex<Vec<String>>,
    options: Mutex<Vec<SessionOptions>>,
    live: Mutex<HashSet<String>>,
    created: AtomicUsize,
    destroyed: AtomicUsize,
    fail_create_on: Option<usize>,
    fail_destroy: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedGateway {
    /// Gateway that responds with each text in turn
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_replies(responses.into_iter().map(|s| ScriptedReply::Respond(s.into())))
    }

    pub fn from_replies(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Default::default()
        }
    }

    /// Fail the nth (1-based) `create_session` call
    pub fn with_failing_create_on(mut self, call: usize) -> Self {
        self.fail_create_on = Some(call);
        self
    }

    /// Make every `destroy_session` call report an error (after releasing the session)
    pub fn with_failing_destroy(mut self) -> Self {
        self.fail_destroy = true;
        self
    }

    /// Prompts received, in order
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    /// Options passed to each successful `create_session`
    pub fn session_options(&self) -> Vec<SessionOptions> {
        lock(&self.options).clone()
    }

    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn destroyed_count(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Sessions created and not yet destroyed
    pub fn live_sessions(&self) -> usize {
        lock(&self.live).len()
    }

    /// Replies not yet consumed
    pub fn remaining_replies(&self) -> usize {
        lock(&self.replies).len()
    }
}

#[async_trait]
impl AgentGateway for ScriptedGateway {
    async fn create_session(&self, options: &SessionOptions) -> Result<SessionHandle, GatewayError> {
        let attempt = lock(&self.options).len() + 1;
        if self.fail_create_on == Some(attempt) {
            // Count the attempt so a later create is not rejected as well
            lock(&self.options).push(options.clone());
            return Err(GatewayError::SessionCreate(format!("scripted failure on create #{}", attempt)));
        }

        let handle = SessionHandle::new(generate_session_id());
        lock(&self.options).push(options.clone());
        lock(&self.live).insert(handle.id().to_string());
        self.created.fetch_add(1, Ordering::SeqCst);
        log::debug!("Scripted session {} created", handle);
        Ok(handle)
    }

    async fn send(
        &self,
        session: &SessionHandle,
        prompt: &str,
        events: EventSender,
    ) -> Result<AgentResponse, GatewayError> {
        if !lock(&self.live).contains(session.id()) {
            return Err(GatewayError::UnknownSession(session.id().to_string()));
        }

        lock(&self.prompts).push(prompt.to_string());
        let reply = lock(&self.replies).pop_front();

        match reply {
            Some(ScriptedReply::Respond(content)) => {
                let _ = events.send(AgentEvent::Message {
                    content: content.clone(),
                });
                Ok(AgentResponse::new(content))
            }
            Some(ScriptedReply::WithTools { content, tools }) => {
                for tool_name in tools {
                    let _ = events.send(AgentEvent::ToolExecutionStart {
                        tool_name: tool_name.clone(),
                    });
                    let _ = events.send(AgentEvent::ToolExecutionComplete {
                        tool_name,
                        success: true,
                    });
                }
                let _ = events.send(AgentEvent::Message {
                    content: content.clone(),
                });
                Ok(AgentResponse::new(content))
            }
            Some(ScriptedReply::Fail(message)) => Err(GatewayError::Send(message)),
            Some(ScriptedReply::FailAfterDeltas { deltas, message }) => {
                for text in deltas {
                    let _ = events.send(AgentEvent::MessageDelta { text });
                }
                Err(GatewayError::Stream(message))
            }
            Some(ScriptedReply::Hang) => std::future::pending().await,
            None => Err(GatewayError::Send("script exhausted".to_string())),
        }
    }

    async fn destroy_session(&self, session: &SessionHandle) -> Result<(), GatewayError> {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        lock(&self.live).remove(session.id());

        if self.fail_destroy {
            return Err(GatewayError::SessionDestroy {
                session: session.id().to_string(),
                message: "scripted destroy failure".to_string(),
            });
        }
        Ok(())
    }
}
