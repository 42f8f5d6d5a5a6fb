//! CSV backend - one file per table in the data directory

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{sheet_from_rows, sheet_rows, upsert_record, BatchRecord, Storage, StoreError};
use crate::entities::account::Account;
use crate::entities::batch::Batch;
use crate::entities::cell_counts::{columns, CellCountSheet};

const BATCHES_FILE: &str = "batches.csv";
const CELL_COUNTS_FILE: &str = "cell_counts.csv";
const ACCOUNTS_FILE: &str = "accounts.csv";

/// Store backed by `batches.csv`, `cell_counts.csv` and `accounts.csv`
#[derive(Debug, Clone)]
pub struct CsvStore {
    dir: PathBuf,
}

impl CsvStore {
    /// Open (and create if needed) a CSV store directory
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn read_records<T: serde::de::DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, StoreError> {
        let path = self.path(file);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = ::csv::ReaderBuilder::new()
            .trim(::csv::Trim::All)
            .flexible(true)
            .from_path(&path)?;
        let records = reader.deserialize().collect::<Result<Vec<T>, _>>()?;
        debug!(path = %path.display(), rows = records.len(), "read table");
        Ok(records)
    }

    fn write_records<T: serde::Serialize>(&self, file: &str, records: &[T]) -> Result<(), StoreError> {
        let path = self.path(file);
        let mut writer = ::csv::Writer::from_path(&path)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        debug!(path = %path.display(), rows = records.len(), "wrote table");
        Ok(())
    }

    /// Raw count rows: username, batch_id, phase, then one cell per column
    fn read_count_rows(&self) -> Result<Vec<Vec<String>>, StoreError> {
        let path = self.path(CELL_COUNTS_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = ::csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&path)?;
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|s| s.trim().to_string()).collect());
        }
        Ok(rows)
    }
}

fn count_header() -> Vec<String> {
    ["username", "batch_id", "phase"]
        .iter()
        .map(|s| s.to_string())
        .chain(columns())
        .collect()
}

fn is_count_row_for(row: &[String], username: &str, batch_id: u32) -> bool {
    row.first().map(String::as_str) == Some(username)
        && row.get(1).and_then(|id| id.parse::<u32>().ok()) == Some(batch_id)
}

impl Storage for CsvStore {
    fn read_batches(&self, username: &str) -> Result<Vec<Batch>, StoreError> {
        let records: Vec<BatchRecord> = self.read_records(BATCHES_FILE)?;
        Ok(records
            .iter()
            .filter(|r| r.username == username)
            .filter_map(BatchRecord::to_batch)
            .collect())
    }

    fn write_batch(&mut self, batch: &Batch) -> Result<(), StoreError> {
        batch.validate()?;
        let mut records: Vec<BatchRecord> = self.read_records(BATCHES_FILE)?;
        upsert_record(&mut records, batch);
        self.write_records(BATCHES_FILE, &records)
    }

    fn read_accounts(&self) -> Result<Vec<Account>, StoreError> {
        self.read_records(ACCOUNTS_FILE)
    }

    fn write_account(&mut self, account: &Account) -> Result<(), StoreError> {
        let mut accounts = self.read_accounts()?;
        if accounts.iter().any(|a| a.username == account.username) {
            return Err(StoreError::DuplicateAccount(account.username.clone()));
        }
        accounts.push(account.clone());
        self.write_records(ACCOUNTS_FILE, &accounts)
    }

    fn read_cell_counts(&self, username: &str, batch_id: u32) -> Result<CellCountSheet, StoreError> {
        let rows = self
            .read_count_rows()?
            .into_iter()
            .filter(|row| is_count_row_for(row, username, batch_id))
            .map(|mut row| {
                let values = row.split_off(3.min(row.len()));
                let phase = row.get(2).cloned().unwrap_or_default();
                (phase, values)
            });
        Ok(sheet_from_rows(rows))
    }

    fn write_cell_counts(
        &mut self,
        username: &str,
        batch_id: u32,
        sheet: &CellCountSheet,
    ) -> Result<(), StoreError> {
        let mut rows: Vec<Vec<String>> = self
            .read_count_rows()?
            .into_iter()
            .filter(|row| !is_count_row_for(row, username, batch_id))
            .collect();

        for (phase, values) in sheet_rows(sheet) {
            let mut row = vec![username.to_string(), batch_id.to_string(), phase.to_string()];
            row.extend(values);
            rows.push(row);
        }

        let path = self.path(CELL_COUNTS_FILE);
        let mut writer = ::csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&path)?;
        writer.write_record(count_header())?;
        for row in &rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}
