use std::time::Duration;

use crate::blob::BlobError;

/// Whole-object key/value storage addressed by `(location, key)`.
///
/// `location` plays the role of a bucket. `put` replaces any existing object
/// at the same key in one step; readers never observe a partial write.
pub trait BlobStore: Send + Sync {
    fn get(&self, location: &str, key: &str) -> Result<Vec<u8>, BlobError>;
    fn put(&self, location: &str, key: &str, body: &[u8], content_type: &str) -> Result<(), BlobError>;
}

/// Blocking wait used by retry and polling loops, injectable for tests.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
