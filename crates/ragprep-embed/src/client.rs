use std::sync::Arc;

use ragprep_core::error::{Error, Result};
use ragprep_core::traits::Sleeper;
use tracing::{error, warn};

use crate::backoff::{Backoff, BackoffPolicy};
use crate::provider::{CallError, EmbedTransport};

/// Single-text embedding call with bounded retry on throttling.
///
/// Throttled and unavailable responses are retried on the backoff schedule.
/// Any other provider failure is returned at once as [`Error::Provider`];
/// running out of attempts is [`Error::ExhaustedRetries`].
pub struct EmbeddingClient {
    transport: Box<dyn EmbedTransport>,
    policy: BackoffPolicy,
    sleeper: Arc<dyn Sleeper>,
    expected_dimension: Option<usize>,
}

impl EmbeddingClient {
    pub fn new(transport: Box<dyn EmbedTransport>, policy: BackoffPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { transport, policy, sleeper, expected_dimension: None }
    }

    /// Reject vectors whose length differs from `dim`.
    pub fn with_expected_dimension(mut self, dim: Option<usize>) -> Self {
        self.expected_dimension = dim;
        self
    }

    pub fn embedder_id(&self) -> &str {
        self.transport.embedder_id()
    }

    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let max = self.policy.max_attempts();
        for attempt in 1..=max {
            match self.transport.embed(text) {
                Ok(vector) => return self.check_dimension(vector),
                Err(CallError::Fatal(msg)) => {
                    error!(embedder = self.embedder_id(), "embedding call failed: {msg}");
                    return Err(Error::Provider(msg));
                }
                Err(retriable) => match self.policy.next(attempt) {
                    Backoff::Wait(wait) => {
                        warn!(
                            "{retriable} (attempt {attempt}/{max}), retrying in {}s",
                            wait.as_secs_f32()
                        );
                        self.sleeper.sleep(wait);
                    }
                    Backoff::Stop => warn!("{retriable} (attempt {attempt}/{max}), giving up"),
                },
            }
        }
        Err(Error::ExhaustedRetries { attempts: max })
    }

    fn check_dimension(&self, vector: Vec<f32>) -> Result<Vec<f32>> {
        match self.expected_dimension {
            Some(expected) if vector.len() != expected => {
                Err(Error::DimensionMismatch { expected, actual: vector.len() })
            }
            _ => Ok(vector),
        }
    }
}
