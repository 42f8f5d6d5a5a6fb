//! Batch entity - one differentiation run started on a given date

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::stage::FINAL_DAY;

/// Date format used when writing batch dates to storage
pub const STORAGE_DATE_FORMAT: &str = "%Y.%m.%d";

/// Date formats accepted when reading batch dates
const ACCEPTED_DATE_FORMATS: &[&str] = &["%Y.%m.%d", "%Y-%m-%d", "%Y/%m/%d"];

/// Days from start to the default end date
pub const DEFAULT_DURATION_DAYS: i64 = 21;

/// Validation errors for batch records
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("Batch ID must be a positive integer")]
    InvalidId,

    #[error("Initial plate count must be at least 1")]
    InvalidPlateCount,

    #[error("End date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("Batch {0} already exists")]
    AlreadyExists(u32),

    #[error("Batch {0} not found")]
    NotFound(u32),
}

/// Where a batch sits relative to a given date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchPhase {
    Upcoming,
    Ongoing,
    Finished,
}

impl std::fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchPhase::Upcoming => write!(f, "upcoming"),
            BatchPhase::Ongoing => write!(f, "ongoing"),
            BatchPhase::Finished => write!(f, "finished"),
        }
    }
}

/// A differentiation batch owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    /// Positive identifier, unique per user
    pub batch_id: u32,

    /// Owning account
    pub username: String,

    /// Cell line
    #[serde(default)]
    pub cell: String,

    /// Day 0 of the protocol
    pub start_date: NaiveDate,

    /// Last tracked day; defaults to start + 21 when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    #[serde(default)]
    pub note: String,

    /// Plates seeded at day 0
    #[serde(default = "default_initial_plates")]
    pub initial_plate_count: u32,

    /// Plates after replating at day 15
    #[serde(default)]
    pub replaced_plate_count: u32,
}

fn default_initial_plates() -> u32 {
    1
}

impl Batch {
    /// Create a new batch with default plate counts and no end date
    pub fn new(
        batch_id: u32,
        username: impl Into<String>,
        cell: impl Into<String>,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            batch_id,
            username: username.into(),
            cell: cell.into(),
            start_date,
            end_date: None,
            note: String::new(),
            initial_plate_count: 1,
            replaced_plate_count: 0,
        }
    }

    /// End date, falling back to start + 21 days
    pub fn effective_end_date(&self) -> NaiveDate {
        self.end_date
            .unwrap_or(self.start_date + Duration::days(DEFAULT_DURATION_DAYS))
    }

    /// Raw day offset of `date` from the start date (may be negative)
    pub fn day_offset(&self, date: NaiveDate) -> i64 {
        (date - self.start_date).num_days()
    }

    /// Day offset when `date` lies within [start, end], else `None`
    pub fn offset_on(&self, date: NaiveDate) -> Option<i64> {
        if date < self.start_date || date > self.effective_end_date() {
            None
        } else {
            Some(self.day_offset(date))
        }
    }

    /// A batch is ongoing when it is tracked on `date` and not past the final day
    pub fn is_ongoing(&self, date: NaiveDate) -> bool {
        self.offset_on(date).is_some_and(|d| d <= FINAL_DAY)
    }

    pub fn phase(&self, date: NaiveDate) -> BatchPhase {
        if date < self.start_date {
            BatchPhase::Upcoming
        } else if self.is_ongoing(date) {
            BatchPhase::Ongoing
        } else {
            BatchPhase::Finished
        }
    }

    /// Check field invariants before the batch is written
    pub fn validate(&self) -> Result<(), BatchError> {
        if self.batch_id == 0 {
            return Err(BatchError::InvalidId);
        }
        if self.initial_plate_count < 1 {
            return Err(BatchError::InvalidPlateCount);
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(BatchError::EndBeforeStart {
                    start: self.start_date,
                    end,
                });
            }
        }
        Ok(())
    }
}

/// Next free batch ID: one past the current maximum, or 1
pub fn next_batch_id(batches: &[Batch]) -> u32 {
    batches
        .iter()
        .map(|b| b.batch_id)
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

/// Parse a stored batch date in any accepted format
pub fn parse_batch_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    ACCEPTED_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Format a date the way storage adapters write it
pub fn format_batch_date(date: NaiveDate) -> String {
    date.format(STORAGE_DATE_FORMAT).to_string()
}
