//! Entry point for one batch invocation.
//!
//! The orchestrator calls [`BatchEmbedder::handle`] once per batch index,
//! possibly more than once for the same index. Every call recomputes its
//! window from the stored corpus and overwrites the same output key, so a
//! replay converges on the same object.

use std::sync::Arc;

use ragprep_core::config::EmbedSettings;
use ragprep_core::error::Result;
use ragprep_core::traits::{BlobStore, Sleeper};
use ragprep_core::types::{BatchRequest, BatchResult, Document, EmbeddingRecord};
use ragprep_core::window;
use tracing::{info, warn};

use crate::backoff::BackoffPolicy;
use crate::client::EmbeddingClient;
use crate::provider::transport_from_settings;
use crate::store::CorpusStore;

pub struct BatchEmbedder {
    store: CorpusStore,
    client: EmbeddingClient,
    default_batch_size: usize,
}

impl BatchEmbedder {
    pub fn new(store: CorpusStore, client: EmbeddingClient, default_batch_size: usize) -> Self {
        Self { store, client, default_batch_size }
    }

    /// Wire the production components described by `settings`.
    pub fn from_settings(
        settings: &EmbedSettings,
        blobs: Arc<dyn BlobStore>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self> {
        let transport = transport_from_settings(settings)?;
        let client = EmbeddingClient::new(transport, BackoffPolicy::new(settings.max_retries), sleeper)
            .with_expected_dimension(settings.expected_dimension);
        let store = CorpusStore::from_settings(blobs, settings);
        Ok(Self::new(store, client, settings.batch_size))
    }

    pub fn handle(&self, request: BatchRequest) -> Result<BatchResult> {
        let batch_index = request.batch_index;
        let batch_size = request.batch_size.unwrap_or(self.default_batch_size);

        let corpus = self.store.load()?;
        let desc = window::describe(corpus.len(), batch_index, batch_size)?;
        if desc.is_past_end() {
            warn!(
                "batch_index {} >= total_batches {}, nothing to do",
                batch_index, desc.total_batches
            );
            return Ok(BatchResult {
                batch_index,
                output_key: None,
                docs_embedded: 0,
                total_batches: desc.total_batches,
            });
        }

        info!(
            "Batch {}: docs {}-{} ({} of {} batches)",
            batch_index,
            desc.start,
            desc.end - 1,
            desc.len(),
            desc.total_batches
        );
        let records = self.embed_documents(&corpus[desc.start..desc.end])?;
        let output_key = if records.is_empty() {
            warn!("Batch {batch_index} has no documents with text, nothing written");
            None
        } else {
            Some(self.store.save(batch_index, &records)?)
        };

        Ok(BatchResult {
            batch_index,
            output_key,
            docs_embedded: records.len(),
            total_batches: desc.total_batches,
        })
    }

    /// Embed every non-blank document, in order. Blank documents are logged
    /// and skipped; the first embedding failure aborts the batch.
    pub fn embed_documents(&self, docs: &[Document]) -> Result<Vec<EmbeddingRecord>> {
        let mut records = Vec::with_capacity(docs.len());
        for doc in docs {
            if doc.is_blank() {
                warn!("Skipping empty doc: {}", doc.id);
                continue;
            }
            let embedding = self.client.embed(&doc.text)?;
            records.push(EmbeddingRecord::from_document(doc, embedding));
        }
        Ok(records)
    }
}
