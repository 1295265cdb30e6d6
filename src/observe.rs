//! Progress observation.
//!
//! The controller reports what it is doing through a `ProgressSink`. Sinks see
//! everything but decide nothing: a run behaves the same with any sink attached.

use std::sync::Arc;

use crate::domain::IterationRecord;
use crate::gateway::AgentEvent;

/// Receives progress notifications from a running loop.
pub trait ProgressSink: Send + Sync {
    /// Iteration `index` of `total` is about to compose and send its prompt.
    fn iteration_started(&self, _index: u32, _total: u32) {}

    /// The composed prompt is about to go out.
    fn prompt_sent(&self, _index: u32, _prompt: &str) {}

    /// The agent emitted an auxiliary event during the send.
    fn agent_event(&self, _index: u32, _event: &AgentEvent) {}

    /// Iteration finished, successfully or not.
    fn iteration_finished(&self, _record: &IterationRecord) {}
}

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ProgressSink for NoopSink {}

/// Mirrors progress into the log file.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn iteration_started(&self, index: u32, total: u32) {
        log::info!("Iteration {}/{} started", index, total);
    }

    fn prompt_sent(&self, index: u32, prompt: &str) {
        log::debug!("Iteration {}: sending prompt ({} chars)", index, prompt.len());
    }

    fn agent_event(&self, index: u32, event: &AgentEvent) {
        match event {
            AgentEvent::ToolExecutionStart { tool_name } => {
                log::debug!("Iteration {}: tool {} started", index, tool_name);
            }
            AgentEvent::ToolExecutionComplete { tool_name, success } => {
                log::debug!("Iteration {}: tool {} finished (success={})", index, tool_name, success);
            }
            AgentEvent::MessageDelta { .. } | AgentEvent::Message { .. } => {}
        }
    }

    fn iteration_finished(&self, record: &IterationRecord) {
        match &record.error {
            Some(error) => log::warn!("Iteration {} failed: {}", record.index, error),
            None => log::info!(
                "Iteration {} finished in {}ms",
                record.index,
                record.duration().num_milliseconds()
            ),
        }
    }
}

/// Fans notifications out to several sinks in order.
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn ProgressSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ProgressSink for FanoutSink {
    fn iteration_started(&self, index: u32, total: u32) {
        for sink in &self.sinks {
            sink.iteration_started(index, total);
        }
    }

    fn prompt_sent(&self, index: u32, prompt: &str) {
        for sink in &self.sinks {
            sink.prompt_sent(index, prompt);
        }
    }

    fn agent_event(&self, index: u32, event: &AgentEvent) {
        for sink in &self.sinks {
            sink.agent_event(index, event);
        }
    }

    fn iteration_finished(&self, record: &IterationRecord) {
        for sink in &self.sinks {
            sink.iteration_finished(record);
        }
    }
}

/// Sink that remembers every notification, for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    notes: std::sync::Mutex<Vec<Notification>>,
}

/// One notification captured by `RecordingSink`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Started { index: u32, total: u32 },
    PromptSent { index: u32, prompt: String },
    Event { index: u32, event: AgentEvent },
    Finished { index: u32, error: Option<String> },
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    /// Indices passed to `iteration_started`, in order
    pub fn started(&self) -> Vec<u32> {
        self.lock()
            .iter()
            .filter_map(|n| match n {
                Notification::Started { index, .. } => Some(*index),
                _ => None,
            })
            .collect()
    }

    fn push(&self, note: Notification) {
        self.lock().push(note);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        self.notes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ProgressSink for RecordingSink {
    fn iteration_started(&self, index: u32, total: u32) {
        self.push(Notification::Started { index, total });
    }

    fn prompt_sent(&self, index: u32, prompt: &str) {
        self.push(Notification::PromptSent {
            index,
            prompt: prompt.to_string(),
        });
    }

    fn agent_event(&self, index: u32, event: &AgentEvent) {
        self.push(Notification::Event {
            index,
            event: event.clone(),
        });
    }

    fn iteration_finished(&self, record: &IterationRecord) {
        self.push(Notification::Finished {
            index: record.index,
            error: record.error.clone(),
        });
    }
}
