use std::sync::Arc;
use std::time::Duration;

use ragprep_core::error::{Error, Result};
use ragprep_core::traits::Sleeper;
use tracing::{info, warn};

use crate::api::{ApiError, IndicesApi};

pub const DEFAULT_MAX_RETRIES: u32 = 30;
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Waits for a freshly provisioned collection to start answering.
///
/// The probe is an index existence check: serverless collections have no
/// cluster-health call, and an existence check is safe before the collection
/// is warm. Any answer, including "no such index", means ready.
pub struct ReadinessPoller<'a> {
    api: &'a dyn IndicesApi,
    sleeper: Arc<dyn Sleeper>,
}

impl<'a> ReadinessPoller<'a> {
    pub fn new(api: &'a dyn IndicesApi, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { api, sleeper }
    }

    /// Returns the 1-based attempt on which the collection answered.
    ///
    /// Forbidden fails at once with [`Error::Permission`]; other failures
    /// wait `interval` and probe again, with no wait after the last probe.
    pub fn wait_ready(&self, index_name: &str, max_retries: u32, interval: Duration) -> Result<u32> {
        for attempt in 1..=max_retries {
            match self.api.exists(index_name) {
                Ok(_) => {
                    info!("Collection is responsive (attempt {attempt})");
                    return Ok(attempt);
                }
                Err(ApiError::Forbidden { status, message }) => {
                    return Err(Error::Permission { status, message });
                }
                Err(e) => {
                    warn!("Waiting for collection (attempt {attempt}/{max_retries}): {e}");
                    if attempt < max_retries {
                        self.sleeper.sleep(interval);
                    }
                }
            }
        }
        Err(Error::Timeout { attempts: max_retries })
    }
}
