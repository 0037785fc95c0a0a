//! Handle for communicating with the compositor actor.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use super::messages::{CompositorMessage, CompositorQuery, QueryResult};
use crate::compositor::LayoutSnapshot;

/// Error types for actor communication.
#[derive(Debug, thiserror::Error)]
pub enum ActorError {
    /// Failed to send message to actor.
    #[error("Failed to send message to compositor: channel closed")]
    SendFailed,

    /// Failed to receive response from actor.
    #[error("Failed to receive response from compositor: channel closed")]
    ReceiveFailed,

    /// Query timed out.
    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    /// The actor answered with a result of another query.
    #[error("Unexpected query result")]
    UnexpectedResult,
}

/// Cloneable sender side of the compositor actor.
#[derive(Clone, Debug)]
pub struct CompositorHandle {
    sender: mpsc::Sender<CompositorMessage>,
}

impl CompositorHandle {
    pub(crate) const fn new(sender: mpsc::Sender<CompositorMessage>) -> Self { Self { sender } }

    // ========================================================================
    // Sending
    // ========================================================================

    /// Queue a message without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed or full.
    pub fn send(&self, msg: CompositorMessage) -> Result<(), ActorError> {
        self.sender.try_send(msg).map_err(|_| ActorError::SendFailed)
    }

    /// Send a message, waiting for buffer space.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed.
    pub async fn send_async(&self, msg: CompositorMessage) -> Result<(), ActorError> {
        self.sender.send(msg).await.map_err(|_| ActorError::SendFailed)
    }

    /// Ask the actor to stop.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the actor is already gone.
    pub async fn shutdown(&self) -> Result<(), ActorError> {
        self.send_async(CompositorMessage::Shutdown).await
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Execute a query and wait for the result.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed, or
    /// [`ActorError::ReceiveFailed`] if the response channel is closed.
    pub async fn query(&self, query: CompositorQuery) -> Result<QueryResult, ActorError> {
        let (tx, rx) = oneshot::channel();
        self.send_async(CompositorMessage::Query { query, respond_to: tx }).await?;
        rx.await.map_err(|_| ActorError::ReceiveFailed)
    }

    /// Execute a query with a timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::Timeout`] if the query doesn't complete in time,
    /// or any error from [`Self::query`].
    pub async fn query_timeout(
        &self,
        query: CompositorQuery,
        timeout: Duration,
    ) -> Result<QueryResult, ActorError> {
        tokio::time::timeout(timeout, self.query(query))
            .await
            .map_err(|_| ActorError::Timeout(timeout))?
    }

    /// The applied layout.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn layout(&self) -> Result<LayoutSnapshot, ActorError> {
        match self.query(CompositorQuery::Layout).await? {
            QueryResult::Layout(snapshot) => Ok(snapshot),
            QueryResult::Idle(_) => Err(ActorError::UnexpectedResult),
        }
    }

    /// Whether every transaction has been applied.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn is_idle(&self) -> Result<bool, ActorError> {
        match self.query(CompositorQuery::Idle).await? {
            QueryResult::Idle(idle) => Ok(idle),
            QueryResult::Layout(_) => Err(ActorError::UnexpectedResult),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_fails_when_actor_is_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let handle = CompositorHandle::new(tx);

        let result = handle.send(CompositorMessage::Shutdown);
        assert!(matches!(result, Err(ActorError::SendFailed)));
    }

    #[test]
    fn test_error_messages() {
        assert!(ActorError::SendFailed.to_string().contains("channel closed"));
        assert!(ActorError::Timeout(Duration::from_millis(5)).to_string().contains("5ms"));
    }
}
