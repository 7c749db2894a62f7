use std::time::Duration;

/// Decision for a retriable failure on a given attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Wait(Duration),
    Stop,
}

/// Exponential backoff without jitter: attempt `k` waits `2^k` units, and the
/// final attempt never waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    max_attempts: u32,
    unit: Duration,
}

impl BackoffPolicy {
    /// One-second units. `max_attempts` below 1 is raised to 1.
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts: max_attempts.max(1), unit: Duration::from_secs(1) }
    }

    pub fn with_unit(mut self, unit: Duration) -> Self {
        self.unit = unit;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// `attempt` is 1-based.
    pub fn next(&self, attempt: u32) -> Backoff {
        if attempt >= self.max_attempts {
            return Backoff::Stop;
        }
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        Backoff::Wait(self.unit.saturating_mul(factor))
    }

    /// Sum of every wait a single call can incur before giving up.
    pub fn worst_case(&self) -> Duration {
        (1..self.max_attempts)
            .filter_map(|k| match self.next(k) {
                Backoff::Wait(d) => Some(d),
                Backoff::Stop => None,
            })
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}
