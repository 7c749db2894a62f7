//! Embedding transport abstraction used by [`crate::EmbeddingClient`].
//!
//! A transport performs exactly one remote call and classifies any failure
//! into [`CallError`]; retrying is the client's job, never the transport's.

use std::sync::Arc;
use std::time::Duration;

use ragprep_core::config::EmbedSettings;
use ragprep_core::error::{Error, Result};
use thiserror::Error as ThisError;

pub mod bedrock;
pub mod fake;

pub use bedrock::BedrockTransport;
pub use fake::HashingTransport;

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum CallError {
    #[error("throttled: {0}")]
    Throttled(String),
    #[error("temporarily unavailable: {0}")]
    Unavailable(String),
    #[error("{0}")]
    Fatal(String),
}

impl CallError {
    pub fn is_retriable(&self) -> bool {
        matches!(self, CallError::Throttled(_) | CallError::Unavailable(_))
    }
}

pub trait EmbedTransport: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `bedrock:<model_id>`).
    fn embedder_id(&self) -> &str;
    /// Embed one text with a single remote call.
    fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, CallError>;
}

impl<T: EmbedTransport + ?Sized> EmbedTransport for Arc<T> {
    fn embedder_id(&self) -> &str {
        (**self).embedder_id()
    }

    fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, CallError> {
        (**self).embed(text)
    }
}

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Select the transport named by the settings: the hashing transport when
/// `use_fake_embeddings` is on, the remote provider otherwise.
pub fn transport_from_settings(settings: &EmbedSettings) -> Result<Box<dyn EmbedTransport>> {
    if settings.use_fake_embeddings {
        tracing::info!(dim = settings.fake_dimension, "using hashing embeddings");
        return Ok(Box::new(HashingTransport::new(settings.fake_dimension)));
    }
    let transport = BedrockTransport::new(
        &settings.endpoint(),
        &settings.model_id,
        settings.embed_api_key.as_deref(),
        REQUEST_TIMEOUT,
    )
    .map_err(|e| Error::InvalidConfig(format!("{e:#}")))?;
    Ok(Box::new(transport))
}
