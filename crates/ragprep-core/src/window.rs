//! Deterministic positional batching of the corpus.

use crate::error::{Error, Result};
use crate::types::BatchDescriptor;

/// Number of batches needed to cover `len` items, i.e. `ceil(len / batch_size)`.
pub fn total_batches(len: usize, batch_size: usize) -> Result<usize> {
    if batch_size == 0 {
        return Err(Error::InvalidConfig("batch_size must be greater than zero".to_string()));
    }
    Ok(len.div_ceil(batch_size))
}

/// Describe the window of `batch_index` over a corpus of `len` items.
pub fn describe(len: usize, batch_index: usize, batch_size: usize) -> Result<BatchDescriptor> {
    let total = total_batches(len, batch_size)?;
    let start = batch_index.saturating_mul(batch_size);
    let end = start.saturating_add(batch_size).min(len);
    Ok(BatchDescriptor {
        batch_index,
        batch_size,
        start,
        end,
        total_batches: total,
    })
}

/// Slice of `items` belonging to `batch_index`, plus the total batch count.
///
/// A `batch_index` past the end yields an empty slice rather than an error.
pub fn window<T>(items: &[T], batch_index: usize, batch_size: usize) -> Result<(&[T], usize)> {
    let desc = describe(items.len(), batch_index, batch_size)?;
    Ok((&items[desc.start.min(desc.end)..desc.end], desc.total_batches))
}
