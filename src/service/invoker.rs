//! Retry/backoff wrapper around one service call.
//!
//! Transport failures and 429 responses are retried with a doubling delay;
//! any other non-success status fails immediately. Each concurrent pipeline
//! unit backs off independently; there is no global rate coordination.

use std::sync::Arc;
use std::time::Duration;

use super::{CallError, ServiceRequest, ServiceTransport};

/// Retry bounds shared by every call. Immutable once the run starts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_retries: u32,
    /// Delay before the second attempt; doubles on each further retry.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1500),
        }
    }
}

pub struct ResilientInvoker {
    transport: Arc<dyn ServiceTransport>,
    policy: RetryPolicy,
}

impl ResilientInvoker {
    pub fn new(transport: Arc<dyn ServiceTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Perform one call with retry. Returns the response body on success.
    /// Never panics; every failure mode is a typed `CallError`.
    pub async fn invoke(&self, request: &ServiceRequest) -> Result<String, CallError> {
        let mut delay = self.policy.initial_delay;

        for attempt in 1..=self.policy.max_retries {
            let retryable = match self.transport.send(request).await {
                Ok(resp) if (200..300).contains(&resp.status) => return Ok(resp.body),
                Ok(resp) if resp.status == 429 => CallError::RateLimited,
                Ok(resp) => return Err(CallError::Status(resp.status)),
                Err(CallError::Transport(msg)) => CallError::Transport(msg),
                Err(e) => return Err(e),
            };

            if attempt < self.policy.max_retries {
                tracing::warn!(
                    operation = %request.operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %retryable,
                    "service call failed, backing off"
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }

        Err(CallError::RetriesExhausted {
            attempts: self.policy.max_retries,
        })
    }
}
