//! SQLite workbook backend
//!
//! A single database file whose tables mirror the worksheets of the shared
//! lab workbook: `info` for batches, `cell_counts` and `accounts`. Cells are
//! kept as text like a spreadsheet would hold them.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::debug;

use super::{sheet_from_rows, sheet_rows, upsert_record, BatchRecord, Storage, StoreError};
use crate::entities::account::Account;
use crate::entities::batch::Batch;
use crate::entities::cell_counts::{columns, CellCountSheet};

/// File name of the workbook inside the data directory
pub const WORKBOOK_FILE: &str = "workbook.sqlite";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS info (
    username TEXT NOT NULL,
    batch_id TEXT NOT NULL,
    cell TEXT NOT NULL DEFAULT '',
    start_date TEXT NOT NULL DEFAULT '',
    end_date TEXT NOT NULL DEFAULT '',
    note TEXT NOT NULL DEFAULT '',
    initial_plate_count TEXT NOT NULL DEFAULT '',
    replaced_plate_count TEXT NOT NULL DEFAULT ''
);
CREATE TABLE IF NOT EXISTS accounts (
    username TEXT PRIMARY KEY,
    password_hash TEXT NOT NULL,
    salt TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS cell_counts (
    username TEXT NOT NULL,
    batch_id INTEGER NOT NULL,
    phase TEXT NOT NULL,
    column_name TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (username, batch_id, phase, column_name)
);
";

/// Store backed by one SQLite workbook file
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    fn read_records(&self) -> Result<Vec<BatchRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT username, batch_id, cell, start_date, end_date, note,
                    initial_plate_count, replaced_plate_count
             FROM info ORDER BY rowid",
        )?;
        let records = stmt
            .query_map([], |row| {
                Ok(BatchRecord {
                    username: row.get(0)?,
                    batch_id: row.get(1)?,
                    cell: row.get(2)?,
                    start_date: row.get(3)?,
                    end_date: row.get(4)?,
                    note: row.get(5)?,
                    initial_plate_count: row.get(6)?,
                    replaced_plate_count: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

impl Storage for SqliteStore {
    fn read_batches(&self, username: &str) -> Result<Vec<Batch>, StoreError> {
        Ok(self
            .read_records()?
            .iter()
            .filter(|r| r.username == username)
            .filter_map(BatchRecord::to_batch)
            .collect())
    }

    fn write_batch(&mut self, batch: &Batch) -> Result<(), StoreError> {
        batch.validate()?;
        let mut records = self.read_records()?;
        upsert_record(&mut records, batch);

        // Whole-sheet rewrite, as with the worksheet it stands in for
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM info", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO info (username, batch_id, cell, start_date, end_date, note,
                                   initial_plate_count, replaced_plate_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for r in &records {
                insert.execute(params![
                    r.username,
                    r.batch_id,
                    r.cell,
                    r.start_date,
                    r.end_date,
                    r.note,
                    r.initial_plate_count,
                    r.replaced_plate_count,
                ])?;
            }
        }
        tx.commit()?;
        debug!(rows = records.len(), "rewrote info table");
        Ok(())
    }

    fn read_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT username, password_hash, salt FROM accounts ORDER BY rowid")?;
        let accounts = stmt
            .query_map([], |row| {
                Ok(Account {
                    username: row.get(0)?,
                    password_hash: row.get(1)?,
                    salt: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(accounts)
    }

    fn write_account(&mut self, account: &Account) -> Result<(), StoreError> {
        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT username FROM accounts WHERE username = ?1",
                [&account.username],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Err(StoreError::DuplicateAccount(account.username.clone()));
        }
        self.conn.execute(
            "INSERT INTO accounts (username, password_hash, salt) VALUES (?1, ?2, ?3)",
            params![account.username, account.password_hash, account.salt],
        )?;
        Ok(())
    }

    fn read_cell_counts(&self, username: &str, batch_id: u32) -> Result<CellCountSheet, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT phase, column_name, value FROM cell_counts
             WHERE username = ?1 AND batch_id = ?2",
        )?;
        let cells = stmt
            .query_map(params![username, batch_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let cols = columns();
        let rows = cells.into_iter().map(|(phase, column, value)| {
            let values = cols
                .iter()
                .map(|c| if *c == column { value.clone() } else { String::new() })
                .collect();
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
        let cols = columns();
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM cell_counts WHERE username = ?1 AND batch_id = ?2",
            params![username, batch_id],
        )?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO cell_counts (username, batch_id, phase, column_name, value)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (phase, values) in sheet_rows(sheet) {
                for (column, value) in cols.iter().zip(values) {
                    if !value.is_empty() {
                        insert.execute(params![username, batch_id, phase, column, value])?;
                    }
                }
            }
        }
        tx.commit()?;
        Ok(())
    }
}
