//! Domain types shared by the embedding pipeline and the index provisioner.

use serde::{Deserialize, Deserializer, Serialize};

use crate::scalar::opt_string;

/// One pre-chunked corpus entry as it appears in the corpus JSON array.
///
/// - `id`: document identity; numbers are kept as their string form, and an
///   absent or null id reads as `"unknown"`
/// - `chunk_id`: chunk identity; falls back to `id` (see [`Document::chunk_id`])
/// - `title`/`url`: optional display metadata
/// - `text`: payload to embed; may be empty, in which case it is skipped
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    #[serde(default = "unknown_id", deserialize_with = "id_or_unknown")]
    pub id: String,
    #[serde(default, deserialize_with = "opt_string", skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "opt_string", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub text: String,
}

fn unknown_id() -> String {
    "unknown".to_string()
}

fn id_or_unknown<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_string(deserializer)?.unwrap_or_else(unknown_id))
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), chunk_id: None, title: None, url: None, text: text.into() }
    }

    pub fn chunk_id(&self) -> &str {
        self.chunk_id.as_deref().unwrap_or(&self.id)
    }

    /// True when there is nothing to embed after trimming whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A document paired with its embedding, as written to a batch output object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingRecord {
    pub doc_id: String,
    pub chunk_id: String,
    pub title: String,
    pub url: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

impl EmbeddingRecord {
    pub fn from_document(doc: &Document, embedding: Vec<f32>) -> Self {
        Self {
            doc_id: doc.id.clone(),
            chunk_id: doc.chunk_id().to_string(),
            title: doc.title.clone().unwrap_or_default(),
            url: doc.url.clone().unwrap_or_default(),
            text: doc.text.clone(),
            embedding,
        }
    }
}

/// Positional window of the corpus owned by one batch invocation.
///
/// `start..end` is half-open with `start = batch_index * batch_size`; `end` is
/// clamped to the corpus length, so `start >= end` means the batch has no work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchDescriptor {
    pub batch_index: usize,
    pub batch_size: usize,
    pub start: usize,
    pub end: usize,
    pub total_batches: usize,
}

impl BatchDescriptor {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when `batch_index` lies past the last batch of the corpus.
    pub fn is_past_end(&self) -> bool {
        self.batch_index >= self.total_batches
    }
}

/// Event payload of one batch invocation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchRequest {
    #[serde(default)]
    pub batch_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
}

/// Outcome of one batch invocation.
///
/// `output_key` is `None` both for an out-of-range `batch_index` and for a
/// valid batch whose documents were all blank; compare `batch_index` with
/// `total_batches` to tell them apart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchResult {
    pub batch_index: usize,
    pub output_key: Option<String>,
    pub docs_embedded: usize,
    pub total_batches: usize,
}
