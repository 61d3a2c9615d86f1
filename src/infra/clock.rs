use chrono::{Local, NaiveDate};

use crate::services::Clock;

/// Reads today's date from the local system clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}
