use std::sync::Arc;

use ragprep_core::config::EmbedSettings;
use ragprep_core::error::{Error, Result};
use ragprep_core::traits::BlobStore;
use ragprep_core::types::{Document, EmbeddingRecord};
use tracing::info;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Reads the corpus object and writes per-batch embedding objects.
pub struct CorpusStore {
    blobs: Arc<dyn BlobStore>,
    corpus_location: String,
    corpus_key: String,
    output_location: String,
    output_prefix: String,
}

impl CorpusStore {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        corpus_location: impl Into<String>,
        corpus_key: impl Into<String>,
        output_location: impl Into<String>,
        output_prefix: impl Into<String>,
    ) -> Self {
        Self {
            blobs,
            corpus_location: corpus_location.into(),
            corpus_key: corpus_key.into(),
            output_location: output_location.into(),
            output_prefix: output_prefix.into(),
        }
    }

    pub fn from_settings(blobs: Arc<dyn BlobStore>, settings: &EmbedSettings) -> Self {
        Self::new(
            blobs,
            &settings.corpus_location,
            &settings.corpus_key,
            &settings.output_location,
            &settings.output_prefix,
        )
    }

    pub fn load(&self) -> Result<Vec<Document>> {
        info!("Loading corpus from {}/{}", self.corpus_location, self.corpus_key);
        let bytes = self
            .blobs
            .get(&self.corpus_location, &self.corpus_key)
            .map_err(|e| self.load_error(e.to_string()))?;
        let corpus: Vec<Document> = serde_json::from_slice(&bytes)
            .map_err(|e| self.load_error(format!("expected a JSON array of documents: {e}")))?;
        info!("Corpus loaded: {} documents", corpus.len());
        Ok(corpus)
    }

    /// `<prefix>/batch_NNNN.json`; the prefix's trailing slashes are dropped.
    pub fn output_key(&self, batch_index: usize) -> String {
        let prefix = self.output_prefix.trim_end_matches('/');
        if prefix.is_empty() {
            format!("batch_{batch_index:04}.json")
        } else {
            format!("{prefix}/batch_{batch_index:04}.json")
        }
    }

    /// Replace the batch's output object. Saving identical records again
    /// produces identical bytes under the same key.
    pub fn save(&self, batch_index: usize, records: &[EmbeddingRecord]) -> Result<String> {
        let key = self.output_key(batch_index);
        let body = serde_json::to_vec(records).map_err(|e| Error::Store {
            location: self.output_location.clone(),
            key: key.clone(),
            reason: e.to_string(),
        })?;
        self.blobs
            .put(&self.output_location, &key, &body, JSON_CONTENT_TYPE)
            .map_err(|e| Error::Store {
                location: self.output_location.clone(),
                key: key.clone(),
                reason: e.to_string(),
            })?;
        info!("Saved {} embeddings to {}/{}", records.len(), self.output_location, key);
        Ok(key)
    }

    fn load_error(&self, reason: String) -> Error {
        Error::Load {
            location: self.corpus_location.clone(),
            key: self.corpus_key.clone(),
            reason,
        }
    }
}
