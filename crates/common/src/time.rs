//! Wall-clock abstraction
//!
//! Token expiry and audit timestamps read time through [`Clock`] so tests
//! can pin and advance it.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};

/// Source of the current UTC time.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date of [`Clock::now`] in UTC.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Real system clock. Use this in production code.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
