//! Batch and account storage
//!
//! Every backend implements [`Storage`]. Rows are exchanged as plain text
//! records so that a hand-edited or malformed row can be carried through a
//! rewrite untouched; conversion into typed entities happens on read.

mod csv;
mod sqlite;

pub use self::csv::CsvStore;
pub use self::sqlite::SqliteStore;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::core::config::{Config, StoreKind};
use crate::core::project::Project;
use crate::entities::account::Account;
use crate::entities::batch::{format_batch_date, parse_batch_date, Batch, BatchError};
use crate::entities::cell_counts::{columns, CellCountSheet, PHASES};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Account '{0}' already exists")]
    DuplicateAccount(String),

    #[error(transparent)]
    InvalidBatch(#[from] BatchError),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persistence capabilities shared by every backend
pub trait Storage {
    /// Batches owned by `username`; rows with an unusable start date are skipped
    fn read_batches(&self, username: &str) -> Result<Vec<Batch>, StoreError>;

    /// Insert or replace the batch keyed by (username, batch_id)
    fn write_batch(&mut self, batch: &Batch) -> Result<(), StoreError>;

    fn read_accounts(&self) -> Result<Vec<Account>, StoreError>;

    /// Add an account; an existing username is rejected
    fn write_account(&mut self, account: &Account) -> Result<(), StoreError>;

    fn read_cell_counts(&self, username: &str, batch_id: u32)
        -> Result<CellCountSheet, StoreError>;

    /// Replace every count row of one batch
    fn write_cell_counts(
        &mut self,
        username: &str,
        batch_id: u32,
        sheet: &CellCountSheet,
    ) -> Result<(), StoreError>;

    fn find_account(&self, username: &str) -> Result<Option<Account>, StoreError> {
        Ok(self
            .read_accounts()?
            .into_iter()
            .find(|a| a.username == username))
    }

    fn find_batch(&self, username: &str, batch_id: u32) -> Result<Option<Batch>, StoreError> {
        Ok(self
            .read_batches(username)?
            .into_iter()
            .find(|b| b.batch_id == batch_id))
    }
}

/// Open the backend selected by the configuration
pub fn open_store(config: &Config, project: &Project) -> Result<Box<dyn Storage>, StoreError> {
    let dir = config.data_path(project);
    Ok(match config.store {
        StoreKind::Csv => Box::new(CsvStore::open(&dir)?),
        StoreKind::Sqlite => Box::new(SqliteStore::open(&dir.join(sqlite::WORKBOOK_FILE))?),
    })
}

/// One batch row as stored: every cell is text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct BatchRecord {
    pub username: String,
    pub batch_id: String,
    #[serde(default)]
    pub cell: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub initial_plate_count: String,
    #[serde(default)]
    pub replaced_plate_count: String,
}

impl BatchRecord {
    pub fn from_batch(batch: &Batch) -> Self {
        Self {
            username: batch.username.clone(),
            batch_id: batch.batch_id.to_string(),
            cell: batch.cell.clone(),
            start_date: format_batch_date(batch.start_date),
            end_date: batch.end_date.map(format_batch_date).unwrap_or_default(),
            note: batch.note.clone(),
            initial_plate_count: batch.initial_plate_count.to_string(),
            replaced_plate_count: batch.replaced_plate_count.to_string(),
        }
    }

    /// Whether this row is the stored copy of (username, batch_id)
    pub fn is_key(&self, username: &str, batch_id: u32) -> bool {
        self.username == username && self.batch_id.trim().parse::<u32>().ok() == Some(batch_id)
    }

    /// Convert to a batch, or `None` (with a warning) when the row is unusable
    pub fn to_batch(&self) -> Option<Batch> {
        let Some(batch_id) = self.batch_id.trim().parse::<u32>().ok().filter(|id| *id > 0) else {
            warn!(user = %self.username, id = %self.batch_id, "skipping batch row with invalid ID");
            return None;
        };
        let Some(start_date) = parse_batch_date(&self.start_date) else {
            warn!(
                user = %self.username,
                batch = batch_id,
                start = %self.start_date,
                "skipping batch with malformed start date"
            );
            return None;
        };

        Some(Batch {
            batch_id,
            username: self.username.clone(),
            cell: self.cell.trim().to_string(),
            start_date,
            end_date: parse_batch_date(&self.end_date),
            note: self.note.clone(),
            initial_plate_count: parse_count(&self.initial_plate_count).unwrap_or(1),
            replaced_plate_count: parse_count(&self.replaced_plate_count).unwrap_or(0),
        })
    }
}

/// Plate counts may come back from a spreadsheet as "3.0"
fn parse_count(s: &str) -> Option<u32> {
    let s = s.trim();
    s.parse::<u32>().ok().or_else(|| {
        s.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0)
            .map(|v| v as u32)
    })
}

/// Replace-or-append `batch` in a full table of records
pub(crate) fn upsert_record(records: &mut Vec<BatchRecord>, batch: &Batch) {
    let record = BatchRecord::from_batch(batch);
    match records
        .iter_mut()
        .find(|r| r.is_key(&batch.username, batch.batch_id))
    {
        Some(existing) => *existing = record,
        None => records.push(record),
    }
}

/// Count-sheet rows for one batch: (phase, one value per column)
pub(crate) fn sheet_rows(sheet: &CellCountSheet) -> Vec<(&'static str, Vec<String>)> {
    PHASES
        .iter()
        .map(|phase| (*phase, sheet.row(phase)))
        .filter(|(_, row)| row.iter().any(|v| !v.is_empty()))
        .collect()
}

/// Rebuild a sheet from stored (phase, values) rows, ignoring unknown phases
pub(crate) fn sheet_from_rows<I>(rows: I) -> CellCountSheet
where
    I: IntoIterator<Item = (String, Vec<String>)>,
{
    let cols = columns();
    let mut sheet = CellCountSheet::new();
    for (phase, values) in rows {
        for (col, value) in cols.iter().zip(values) {
            if value.trim().is_empty() {
                continue;
            }
            if let Err(e) = sheet.set(&phase, col, &value) {
                warn!("skipping cell count: {}", e);
                break;
            }
        }
    }
    sheet
}
