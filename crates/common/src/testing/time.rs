//! Time mocking for deterministic expiry tests
//!
//! # Examples
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use ledgerbridge_common::testing::MockClock;
//! use ledgerbridge_common::time::Clock;
//!
//! let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let clock = MockClock::at(start);
//! clock.advance(Duration::seconds(5));
//! assert_eq!(clock.now(), start + Duration::seconds(5));
//! ```

// Test utility: panic on poisoned mutex to fail tests early
#![allow(clippy::missing_panics_doc)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use crate::time::Clock;

/// Mock clock for deterministic testing
///
/// Starts at a fixed instant and only moves when told to. Clones share the
/// same underlying time.
#[derive(Debug, Clone)]
pub struct MockClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    /// Create a mock clock pinned to `start`
    #[must_use]
    pub fn at(start: DateTime<Utc>) -> Self {
        Self { now: Arc::new(Mutex::new(start)) }
    }

    /// Create a mock clock pinned to the current real time
    #[must_use]
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Advance the mock clock by a duration
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().expect("mutex poisoned");
        *now += duration;
    }

    /// Set the mock clock to an absolute instant
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().expect("mutex poisoned") = instant;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("mutex poisoned")
    }
}
