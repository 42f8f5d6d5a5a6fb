//! Calendar builder - day offsets of every batch across a date window
//!
//! The calendar is a grid of batches (rows, sorted by ID) by dates (columns).
//! A cell holds the batch's day offset on that date when the date falls inside
//! the batch's tracked range, and is empty otherwise.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::core::stage::{DayShade, Stage};
use crate::entities::batch::Batch;

/// Default window length: today plus the full 21-day protocol
pub const DEFAULT_WINDOW_DAYS: u32 = 22;

/// One batch's row in the calendar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarRow {
    pub batch_id: u32,
    pub cell: String,
    /// One entry per window date
    pub offsets: Vec<Option<i64>>,
}

/// Offset grid over a date window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Calendar {
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<CalendarRow>,
}

/// Column header split the way the heatmap prints it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnHeader {
    pub year: String,
    pub month: String,
    pub day: String,
}

impl ColumnHeader {
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            year: date.format("%Y").to_string(),
            month: date.format("%b").to_string(),
            day: date.format("%a %d").to_string(),
        }
    }
}

impl Calendar {
    /// Build the grid for `[window_start, window_start + length)`
    pub fn build(batches: &[Batch], window_start: NaiveDate, length: u32) -> Self {
        let dates: Vec<NaiveDate> = (0..length)
            .map(|i| window_start + Duration::days(i64::from(i)))
            .collect();

        let mut sorted: Vec<&Batch> = batches.iter().collect();
        sorted.sort_by_key(|b| b.batch_id);

        let rows = sorted
            .into_iter()
            .map(|batch| CalendarRow {
                batch_id: batch.batch_id,
                cell: batch.cell.clone(),
                offsets: dates.iter().map(|d| batch.offset_on(*d)).collect(),
            })
            .collect();

        Self { dates, rows }
    }

    /// Offset of a batch on a window date, if both are present
    pub fn offset(&self, batch_id: u32, date: NaiveDate) -> Option<i64> {
        let col = self.dates.iter().position(|d| *d == date)?;
        self.rows
            .iter()
            .find(|r| r.batch_id == batch_id)
            .and_then(|r| r.offsets[col])
    }

    pub fn headers(&self) -> Vec<ColumnHeader> {
        self.dates.iter().map(|d| ColumnHeader::for_date(*d)).collect()
    }

    /// Shading for every cell, parallel to `rows[i].offsets`
    pub fn shading(&self) -> Vec<Vec<Option<DayShade>>> {
        self.rows
            .iter()
            .map(|r| r.offsets.iter().map(|o| o.map(DayShade::classify)).collect())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A batch resolved to its day offset on a particular date
#[derive(Debug, Clone, Copy)]
pub struct ScheduledBatch<'a> {
    pub batch: &'a Batch,
    pub day: i64,
}

impl ScheduledBatch<'_> {
    pub fn stage(&self) -> Stage {
        Stage::for_day(self.day)
    }

    pub fn shade(&self) -> DayShade {
        DayShade::classify(self.day)
    }
}

/// Batches tracked on `date`, with their offsets, sorted by batch ID
pub fn scheduled_on(batches: &[Batch], date: NaiveDate) -> Vec<ScheduledBatch<'_>> {
    let mut scheduled: Vec<ScheduledBatch<'_>> = batches
        .iter()
        .filter_map(|batch| batch.offset_on(date).map(|day| ScheduledBatch { batch, day }))
        .collect();
    scheduled.sort_by_key(|s| s.batch.batch_id);
    scheduled
}

/// Batches still inside the protocol on `date` (offset present and <= 21)
pub fn ongoing_on(batches: &[Batch], date: NaiveDate) -> Vec<Batch> {
    batches
        .iter()
        .filter(|b| b.is_ongoing(date))
        .cloned()
        .collect()
}
