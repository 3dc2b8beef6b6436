//! Downstream delivery port interface

use async_trait::async_trait;
use thiserror::Error;

/// Transport-level delivery errors.
/// Downstream HTTP error statuses are not errors here; the relay does
/// not interpret downstream semantics.
#[derive(Debug, Clone, Error)]
pub enum ForwardError {
    #[error("Delivery timed out")]
    Timeout,

    #[error("Delivery transport failed: {0}")]
    Transport(String),
}

/// Port for forwarding canonical event bodies downstream
#[async_trait]
pub trait Forwarder: Send + Sync {
    /// Deliver one canonical event body.
    ///
    /// # Arguments
    /// * `payload` - The canonical encoded body
    /// * `request_id` - Correlation id for tracing
    /// * `attempt` - 1-based attempt number, for logging
    ///
    /// # Returns
    /// The downstream HTTP status on transport success, whatever its
    /// class; Err only for connect/timeout failures.
    async fn deliver(
        &self,
        payload: &str,
        request_id: &str,
        attempt: u32,
    ) -> Result<u16, ForwardError>;
}
