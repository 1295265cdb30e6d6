//! Session lifecycle - one session per iteration, or one for the whole run.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::gateway::{AgentGateway, GatewayError, SessionHandle, SessionOptions};

/// When sessions are created and destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStrategy {
    /// New session right before each send, destroyed right after it.
    /// Keeps the agent's context window to a single iteration.
    FreshPerIteration,
    /// One session for the whole run; the agent's own memory carries context.
    Persistent,
}

impl SessionStrategy {
    pub fn is_fresh(&self) -> bool {
        matches!(self, SessionStrategy::FreshPerIteration)
    }
}

/// Hands out sessions according to a `SessionStrategy`.
///
/// Teardown failures are logged and swallowed: they never change the outcome
/// of the iteration or the run.
pub struct SessionManager<G: AgentGateway + ?Sized> {
    gateway: Arc<G>,
    options: SessionOptions,
    strategy: SessionStrategy,
    persistent: Option<SessionHandle>,
}

impl<G: AgentGateway + ?Sized> SessionManager<G> {
    pub fn new(gateway: Arc<G>, options: SessionOptions, strategy: SessionStrategy) -> Self {
        Self {
            gateway,
            options,
            strategy,
            persistent: None,
        }
    }

    pub fn strategy(&self) -> SessionStrategy {
        self.strategy
    }

    /// Session to use for the next send
    pub async fn acquire(&mut self) -> Result<SessionHandle, GatewayError> {
        match self.strategy {
            SessionStrategy::FreshPerIteration => self.gateway.create_session(&self.options).await,
            SessionStrategy::Persistent => {
                if let Some(session) = &self.persistent {
                    return Ok(session.clone());
                }
                let session = self.gateway.create_session(&self.options).await?;
                log::info!("Opened persistent session {}", session);
                self.persistent = Some(session.clone());
                Ok(session)
            }
        }
    }

    /// Give back a session after its send resolved, failed, or was abandoned
    pub async fn release(&mut self, session: SessionHandle) {
        if self.strategy.is_fresh() {
            self.destroy(&session).await;
        }
    }

    /// Tear down whatever is still open. Call once the run reached a terminal state.
    pub async fn shutdown(&mut self) {
        if let Some(session) = self.persistent.take() {
            self.destroy(&session).await;
            log::info!("Closed persistent session {}", session);
        }
    }

    async fn destroy(&self, session: &SessionHandle) {
        if let Err(e) = self.gateway.destroy_session(session).await {
            log::warn!("Failed to destroy session {}: {}", session, e);
        }
    }
}
