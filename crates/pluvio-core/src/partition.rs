use std::{fmt, path::PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{DatePolicy, PluvioError};

/// Directory under a storage base that holds all date partitions.
pub const DATA_DIR_NAME: &str = "DTA";

/// Year/month/day segments of a caller-supplied `YYYY-MM-DD` string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatePartition {
    pub year: String,
    pub month: String,
    pub day: String,
}

impl DatePartition {
    /// Splits `input` on `-` into exactly three segments and checks them against `policy`.
    pub fn parse(input: &str, policy: DatePolicy) -> Result<Self, PluvioError> {
        let segments: Vec<&str> = input.split('-').collect();
        let [year, month, day] = segments.as_slice() else {
            return Err(PluvioError::invalid_date(
                input,
                format!("expected 3 '-' separated parts, found {}", segments.len()),
            ));
        };

        for segment in [year, month, day] {
            check_segment(input, segment)?;
        }

        if policy == DatePolicy::Calendar {
            check_calendar(input, year, month, day)?;
        }

        Ok(Self {
            year: (*year).to_string(),
            month: (*month).to_string(),
            day: (*day).to_string(),
        })
    }

    /// Returns `DTA/<year>/<month>/<day>`.
    pub fn relative_path(&self) -> PathBuf {
        [
            DATA_DIR_NAME,
            self.year.as_str(),
            self.month.as_str(),
            self.day.as_str(),
        ]
        .iter()
        .collect()
    }
}

impl From<NaiveDate> for DatePartition {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.format("%Y").to_string(),
            month: date.format("%m").to_string(),
            day: date.format("%d").to_string(),
        }
    }
}

impl fmt::Display for DatePartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.year, self.month, self.day)
    }
}

/// Segments become directory names, so each must be one plain path component.
fn check_segment(input: &str, segment: &str) -> Result<(), PluvioError> {
    if segment.is_empty() {
        return Err(PluvioError::invalid_date(input, "empty date segment"));
    }
    if segment == "." || segment == ".." {
        return Err(PluvioError::invalid_date(
            input,
            format!("segment '{segment}' is not a directory name"),
        ));
    }
    if segment.contains(['/', '\\', '\0']) {
        return Err(PluvioError::invalid_date(
            input,
            format!("segment '{segment}' contains a path separator"),
        ));
    }
    Ok(())
}

fn check_calendar(input: &str, year: &str, month: &str, day: &str) -> Result<(), PluvioError> {
    let year_num = parse_digits(input, year, 4, "year")?;
    let month_num = parse_digits(input, month, 2, "month")?;
    let day_num = parse_digits(input, day, 2, "day")?;

    // Four digits always fit an i32 year.
    if NaiveDate::from_ymd_opt(year_num as i32, month_num, day_num).is_none() {
        return Err(PluvioError::invalid_date(
            input,
            format!("{year}-{month}-{day} is not a calendar day"),
        ));
    }
    Ok(())
}

fn parse_digits(input: &str, segment: &str, width: usize, what: &str) -> Result<u32, PluvioError> {
    if segment.len() != width || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PluvioError::invalid_date(
            input,
            format!("{what} '{segment}' must be {width} digits"),
        ));
    }
    segment
        .parse()
        .map_err(|err| PluvioError::invalid_date(input, format!("{what}: {err}")))
}
