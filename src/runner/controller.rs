//! Iteration controller - drives the Ralph loop.
//!
//! Each iteration:
//! 1. Composes the prompt (carry-over or re-read from the shared prompt file)
//! 2. Acquires a session (fresh or persistent)
//! 3. Sends the prompt and waits for the final response, forwarding
//!    agent events to the progress sink while it waits
//! 4. Releases the session
//! 5. Checks the response for the completion sentinel
//!
//! The loop ends on the first sentinel hit, when the budget runs out, or on
//! the first failure. Failures are never retried.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::completion;
use crate::config::LoopConfig;
use crate::domain::{FailureCause, IterationRecord, LoopOutcome, LoopResult, PendingIteration, ToolEvent};
use crate::gateway::{AgentEvent, AgentGateway, AgentResponse, SessionHandle, SessionOptions, event_channel};
use crate::observe::{LogSink, ProgressSink};
use crate::prompt::PromptComposer;
use crate::session::SessionManager;

/// Point in time after which the run gives up.
#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Instant,
    limit: Duration,
}

impl Deadline {
    fn passed(&self) -> bool {
        Instant::now() >= self.at
    }
}

/// Runs one Ralph loop against an agent gateway.
pub struct IterationController<G: AgentGateway + ?Sized> {
    gateway: Arc<G>,
    config: LoopConfig,
    session_options: SessionOptions,
    sink: Arc<dyn ProgressSink>,
}

impl<G: AgentGateway + ?Sized> IterationController<G> {
    /// Create a controller that reports progress to the log.
    ///
    /// The configuration is validated here, before any session exists.
    pub fn new(gateway: Arc<G>, config: LoopConfig, session_options: SessionOptions) -> crate::error::Result<Self> {
        config.validate()?;
        Ok(Self {
            gateway,
            config,
            session_options,
            sink: Arc::new(LogSink),
        })
    }

    /// Report progress to `sink` instead of the log.
    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Run the loop to a terminal state.
    pub async fn run(&self, initial_prompt: &str) -> LoopResult {
        self.run_until_cancelled(initial_prompt, CancellationToken::new()).await
    }

    /// Run the loop, stopping early with `FailureCause::Cancelled` once
    /// `cancel` fires. An in-flight send is abandoned; its session is still
    /// torn down.
    pub async fn run_until_cancelled(&self, initial_prompt: &str, cancel: CancellationToken) -> LoopResult {
        log::info!(
            "Starting loop: max {} iterations, {:?}, {:?}, sentinel {:?}",
            self.config.max_iterations,
            self.config.context_mode,
            self.config.session_strategy,
            self.config.sentinel()
        );

        let composer = PromptComposer::new(
            initial_prompt,
            self.config.prompt_source.clone(),
            self.config.context_mode,
        );
        let mut sessions = SessionManager::new(
            Arc::clone(&self.gateway),
            self.session_options.clone(),
            self.config.session_strategy,
        );
        let deadline = self.config.deadline.map(|limit| Deadline {
            at: Instant::now() + limit,
            limit,
        });

        let mut history = Vec::new();
        let outcome = self
            .drive(&composer, &mut sessions, deadline, &cancel, &mut history)
            .await;
        sessions.shutdown().await;

        log::info!("Loop {} after {} iteration(s)", outcome.label(), history.len());
        LoopResult::new(outcome, history)
    }

    async fn drive(
        &self,
        composer: &PromptComposer,
        sessions: &mut SessionManager<G>,
        deadline: Option<Deadline>,
        cancel: &CancellationToken,
        history: &mut Vec<IterationRecord>,
    ) -> LoopOutcome {
        let total = self.config.max_iterations;
        let sentinel = self.config.sentinel();
        let mut prior: Option<String> = None;

        for index in 1..=total {
            if cancel.is_cancelled() {
                return LoopOutcome::Failed {
                    iteration: index,
                    cause: FailureCause::Cancelled,
                };
            }
            if let Some(deadline) = deadline
                && deadline.passed()
            {
                return LoopOutcome::Failed {
                    iteration: index,
                    cause: FailureCause::DeadlineExceeded(deadline.limit),
                };
            }

            self.sink.iteration_started(index, total);

            let prompt = match composer.compose(index, prior.as_deref()) {
                Ok(prompt) => prompt,
                Err(e) => {
                    let cause = FailureCause::from(e);
                    self.finish(PendingIteration::start(index, "").fail(cause.to_string()), history);
                    return LoopOutcome::Failed { iteration: index, cause };
                }
            };

            let mut pending = PendingIteration::start(index, prompt.as_str());
            self.sink.prompt_sent(index, &prompt);

            let session = match sessions.acquire().await {
                Ok(session) => session,
                Err(e) => {
                    let cause = FailureCause::from(e);
                    self.finish(pending.fail(cause.to_string()), history);
                    return LoopOutcome::Failed { iteration: index, cause };
                }
            };

            let result = self.exchange(&session, &prompt, &mut pending, deadline, cancel).await;
            sessions.release(session).await;

            match result {
                Ok(response) => {
                    let completed = completion::detect(&response.content, sentinel);
                    self.finish(pending.succeed(response.content.as_str()), history);
                    if completed {
                        log::info!("Completion sentinel found in iteration {}", index);
                        return LoopOutcome::Completed {
                            response: response.content,
                            iteration: index,
                        };
                    }
                    prior = Some(response.content);
                }
                Err(cause) => {
                    log::warn!("Iteration {} failed: {}", index, cause);
                    self.finish(pending.fail(cause.to_string()), history);
                    return LoopOutcome::Failed { iteration: index, cause };
                }
            }
        }

        LoopOutcome::Exhausted {
            last_response: prior,
            sentinel_required: sentinel.is_some(),
        }
    }

    /// Send one prompt and wait for its final response.
    async fn exchange(
        &self,
        session: &SessionHandle,
        prompt: &str,
        pending: &mut PendingIteration,
        deadline: Option<Deadline>,
        cancel: &CancellationToken,
    ) -> Result<AgentResponse, FailureCause> {
        let index = pending.index();
        let (events, mut rx) = event_channel();

        let send = self.gateway.send(session, prompt, events);
        tokio::pin!(send);

        let expiry = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline.at).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(expiry);

        let result = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    log::info!("Iteration {} cancelled during send", index);
                    break Err(FailureCause::Cancelled);
                }
                _ = &mut expiry => {
                    let limit = deadline.map(|d| d.limit).unwrap_or_default();
                    break Err(FailureCause::DeadlineExceeded(limit));
                }
                Some(event) = rx.recv() => self.observe(index, &event, pending),
                result = &mut send => break result.map_err(FailureCause::from),
            }
        };

        while let Ok(event) = rx.try_recv() {
            self.observe(index, &event, pending);
        }

        result
    }

    fn observe(&self, index: u32, event: &AgentEvent, pending: &mut PendingIteration) {
        if let AgentEvent::MessageDelta { text } = event {
            pending.record_text_delta(text);
        }
        if let Some(tool_event) = ToolEvent::from_agent_event(event) {
            pending.record_tool_event(tool_event);
        }
        self.sink.agent_event(index, event);
    }

    fn finish(&self, record: IterationRecord, history: &mut Vec<IterationRecord>) {
        self.sink.iteration_finished(&record);
        history.push(record);
    }
}
