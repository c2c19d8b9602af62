//! Injectable time sources
//!
//! Policy expiry is checked against a caller-supplied [`TimeSource`], never
//! against ambient global state, so policy construction stays deterministic
//! under test.

use crate::errors::TimeError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Abstract time source reporting Unix seconds
pub trait TimeSource: Send + Sync {
    /// Get current Unix timestamp in seconds
    fn current_timestamp(&self) -> Result<u64, TimeError>;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_timestamp(&self) -> Result<u64, TimeError> {
        (**self).current_timestamp()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn current_timestamp(&self) -> Result<u64, TimeError> {
        (**self).current_timestamp()
    }
}

/// Real system time source (production use)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl SystemTimeSource {
    /// Create a new system time source
    pub fn new() -> Self {
        SystemTimeSource
    }
}

impl TimeSource for SystemTimeSource {
    fn current_timestamp(&self) -> Result<u64, TimeError> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .map_err(|e| TimeError::Unavailable {
                reason: format!("System time is before UNIX epoch: {e}"),
            })
    }
}

/// A clock frozen at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTimeSource(pub u64);

impl TimeSource for FixedTimeSource {
    fn current_timestamp(&self) -> Result<u64, TimeError> {
        Ok(self.0)
    }
}

/// Simulated time source for tests and simulations.
///
/// Clones share one underlying instant, so advancing any clone advances all.
#[derive(Debug, Clone)]
pub struct SimulatedTimeSource {
    current_time: Arc<AtomicU64>,
}

impl SimulatedTimeSource {
    /// Create a new simulated time source starting at the given timestamp
    pub fn new(initial_timestamp: u64) -> Self {
        SimulatedTimeSource {
            current_time: Arc::new(AtomicU64::new(initial_timestamp)),
        }
    }

    /// Create starting at a recent time (for more realistic tests)
    pub fn from_recent() -> Self {
        // 2025-01-01 00:00:00 UTC
        Self::new(1_735_689_600)
    }

    /// Advance time by `seconds`, saturating at `u64::MAX`
    pub fn advance(&self, seconds: u64) {
        let _ = self
            .current_time
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_add(seconds))
            });
    }

    /// Set absolute time
    pub fn set_time(&self, timestamp: u64) {
        self.current_time.store(timestamp, Ordering::SeqCst);
    }
}

impl TimeSource for SimulatedTimeSource {
    fn current_timestamp(&self) -> Result<u64, TimeError> {
        Ok(self.current_time.load(Ordering::SeqCst))
    }
}
