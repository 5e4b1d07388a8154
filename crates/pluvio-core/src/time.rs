use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Clock that supplies "today" when a caller does not name a date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateClock {
    /// The device's local calendar day.
    #[default]
    Local,
    Utc,
}

/// Returns the current calendar day on `clock`.
pub fn today(clock: DateClock) -> NaiveDate {
    match clock {
        DateClock::Local => Local::now().date_naive(),
        DateClock::Utc => Utc::now().date_naive(),
    }
}
