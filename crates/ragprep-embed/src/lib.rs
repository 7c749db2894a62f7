//! Batch embedding pipeline: one invocation embeds one positional window of
//! the corpus and writes it to a deterministic output key.

pub mod backoff;
pub mod client;
pub mod handler;
pub mod provider;
pub mod store;

pub use backoff::{Backoff, BackoffPolicy};
pub use client::EmbeddingClient;
pub use handler::BatchEmbedder;
pub use provider::{transport_from_settings, CallError, EmbedTransport};
pub use store::CorpusStore;
