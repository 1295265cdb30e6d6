//! Server-Sent Events decoding for the Anthropic streaming API.
//!
//! Bytes arrive in arbitrary chunks; `SseDecoder` reassembles lines and yields
//! `data:` payloads. `StreamParser` turns each payload into `AgentEvent`s and
//! accumulates the final text.

use serde::Deserialize;
use serde_json::Value;

use super::types::AgentEvent;

/// Events received during streaming from the Anthropic API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    MessageStart {
        #[serde(default)]
        message: Value,
    },
    ContentBlockStart {
        index: u32,
        content_block: Value,
    },
    ContentBlockDelta {
        index: u32,
        delta: Value,
    },
    ContentBlockStop {
        index: u32,
    },
    MessageDelta {
        #[serde(default)]
        delta: Value,
    },
    MessageStop,
    Ping,
    Error {
        error: Value,
    },
}

/// Incremental line decoder for an SSE byte stream.
///
/// Bytes are buffered until a full line is available, so a UTF-8 sequence
/// split across chunks is decoded only once complete.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns the `data:` payloads completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(line_end) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let line = match String::from_utf8(raw) {
                Ok(line) => line,
                Err(e) => {
                    log::warn!("Stream line is not valid UTF-8: {}", e);
                    String::from_utf8_lossy(e.as_bytes()).into_owned()
                }
            };
            let line = line.trim_end_matches(['\r', '\n']);

            if let Some(data) = line.strip_prefix("data:") {
                let data = data.trim_start();
                if !data.is_empty() && data != "[DONE]" {
                    payloads.push(data.to_string());
                }
            }
        }
        payloads
    }
}

/// State tracker for parsing streaming responses.
#[derive(Debug, Default)]
pub struct StreamParser {
    /// Accumulated text content
    text: String,
    /// Tool name per open tool_use block
    open_tools: Vec<(u32, String)>,
    /// Whether message_stop was seen
    finished: bool,
    stop_reason: Option<String>,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one `data:` payload. Malformed payloads are skipped.
    pub fn process_payload(&mut self, payload: &str) -> Result<Vec<AgentEvent>, String> {
        match serde_json::from_str::<StreamEvent>(payload) {
            Ok(event) => self.process_event(event),
            Err(e) => {
                log::debug!("Skipping unrecognised stream payload: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Process a stream event and emit agent events.
    pub fn process_event(&mut self, event: StreamEvent) -> Result<Vec<AgentEvent>, String> {
        let mut events = Vec::new();

        match event {
            StreamEvent::ContentBlockStart { index, content_block } => {
                if content_block["type"] == "tool_use" {
                    let name = content_block["name"].as_str().unwrap_or("unknown").to_string();
                    self.open_tools.push((index, name.clone()));
                    events.push(AgentEvent::ToolExecutionStart { tool_name: name });
                }
            }
            StreamEvent::ContentBlockDelta { delta, .. } => {
                if let Some(text) = delta["text"].as_str() {
                    self.text.push_str(text);
                    events.push(AgentEvent::MessageDelta { text: text.to_string() });
                }
            }
            StreamEvent::ContentBlockStop { index } => {
                if let Some(pos) = self.open_tools.iter().position(|(i, _)| *i == index) {
                    let (_, tool_name) = self.open_tools.remove(pos);
                    events.push(AgentEvent::ToolExecutionComplete {
                        tool_name,
                        success: true,
                    });
                }
            }
            StreamEvent::MessageDelta { delta } => {
                if let Some(reason) = delta["stop_reason"].as_str() {
                    self.stop_reason = Some(reason.to_string());
                }
            }
            StreamEvent::MessageStop => {
                self.finished = true;
                events.push(AgentEvent::Message {
                    content: self.text.clone(),
                });
            }
            StreamEvent::Error { error } => {
                let message = error["message"].as_str().unwrap_or("unknown stream error");
                return Err(message.to_string());
            }
            StreamEvent::MessageStart { .. } | StreamEvent::Ping => {}
        }

        Ok(events)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn stop_reason(&self) -> Option<&str> {
        self.stop_reason.as_deref()
    }

    /// Consume the parser, yielding the accumulated text.
    pub fn into_text(self) -> String {
        self.text
    }
}
