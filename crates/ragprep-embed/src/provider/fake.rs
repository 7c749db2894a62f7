//! Deterministic offline embeddings for development and tests.
//!
//! Each whitespace token is hashed into one bucket of a fixed-size vector,
//! which is then L2-normalized. Same text, same vector; no network.

use std::hash::{Hash, Hasher};

use twox_hash::XxHash64;

use super::{CallError, EmbedTransport};

pub struct HashingTransport {
    dim: usize,
    id: String,
}

impl HashingTransport {
    pub fn new(dim: usize) -> Self {
        let dim = dim.max(1);
        Self { dim, id: format!("hashing:d{dim}") }
    }
}

impl EmbedTransport for HashingTransport {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, CallError> {
        let mut v = vec![0f32; self.dim];
        for (position, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let bucket = (h % self.dim as u64) as usize;
            let weight = ((h >> 32) as u32) as f32 / u32::MAX as f32;
            v[bucket] += weight + (position % 3) as f32 * 0.01;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        Ok(v)
    }
}
