//! Cell count sheet - per-batch counts recorded at the milestone phases

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rows of the sheet, in display order
pub const PHASES: &[&str] = &["Day 15", "Day 21", "Banking"];

/// Column labels: three replicate wells plus fifteen plate slots
pub fn columns() -> Vec<String> {
    ["A", "B", "C"]
        .iter()
        .map(|s| s.to_string())
        .chain((1..=15).map(|i| i.to_string()))
        .collect()
}

/// Free-text cell count values keyed by (phase, column)
///
/// Only non-empty cells are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellCountSheet {
    cells: BTreeMap<String, BTreeMap<String, String>>,
}

/// Reasons a cell address is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CellAddressError {
    #[error("Unknown phase '{0}' (expected one of: Day 15, Day 21, Banking)")]
    UnknownPhase(String),

    #[error("Unknown column '{0}' (expected A, B, C or 1-15)")]
    UnknownColumn(String),
}

impl CellCountSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a phase label case-insensitively ("day15", "Day 15", "banking")
    pub fn resolve_phase(input: &str) -> Result<&'static str, CellAddressError> {
        let wanted: String = input
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        PHASES
            .iter()
            .find(|p| p.replace(' ', "").to_lowercase() == wanted)
            .copied()
            .ok_or_else(|| CellAddressError::UnknownPhase(input.to_string()))
    }

    fn resolve_column(input: &str) -> Result<String, CellAddressError> {
        let upper = input.trim().to_uppercase();
        if columns().contains(&upper) {
            Ok(upper)
        } else {
            Err(CellAddressError::UnknownColumn(input.to_string()))
        }
    }

    pub fn get(&self, phase: &str, column: &str) -> Option<&str> {
        self.cells
            .get(phase)
            .and_then(|row| row.get(column))
            .map(String::as_str)
    }

    /// Set a cell; an empty value clears it
    pub fn set(&mut self, phase: &str, column: &str, value: &str) -> Result<(), CellAddressError> {
        let phase = Self::resolve_phase(phase)?;
        let column = Self::resolve_column(column)?;
        let value = value.trim();

        if value.is_empty() {
            if let Some(row) = self.cells.get_mut(phase) {
                row.remove(&column);
                if row.is_empty() {
                    self.cells.remove(phase);
                }
            }
        } else {
            self.cells
                .entry(phase.to_string())
                .or_default()
                .insert(column, value.to_string());
        }
        Ok(())
    }

    /// Full row for a phase, one entry per column (empty string when unset)
    pub fn row(&self, phase: &str) -> Vec<String> {
        columns()
            .iter()
            .map(|c| self.get(phase, c).unwrap_or_default().to_string())
            .collect()
    }

    /// Columns holding at least one value, in column order
    pub fn used_columns(&self) -> Vec<String> {
        columns()
            .into_iter()
            .filter(|c| PHASES.iter().any(|p| self.get(p, c).is_some()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_layout() {
        let cols = columns();
        assert_eq!(cols.len(), 18);
        assert_eq!(cols[0], "A");
        assert_eq!(cols[3], "1");
        assert_eq!(cols[17], "15");
    }

    #[test]
    fn test_set_and_get() {
        let mut sheet = CellCountSheet::new();
        sheet.set("day15", "a", "1.2e6").unwrap();
        sheet.set("Banking", "3", "8").unwrap();

        assert_eq!(sheet.get("Day 15", "A"), Some("1.2e6"));
        assert_eq!(sheet.get("Banking", "3"), Some("8"));
        assert_eq!(sheet.used_columns(), vec!["A".to_string(), "3".to_string()]);
        assert_eq!(sheet.row("Day 21"), vec![String::new(); 18]);
    }

    #[test]
    fn test_clear_cell() {
        let mut sheet = CellCountSheet::new();
        sheet.set("Day 21", "B", "5").unwrap();
        sheet.set("Day 21", "B", "").unwrap();
        assert!(sheet.is_empty());
    }

    #[test]
    fn test_reject_unknown_address() {
        let mut sheet = CellCountSheet::new();
        assert!(matches!(
            sheet.set("Day 30", "A", "1"),
            Err(CellAddressError::UnknownPhase(_))
        ));
        assert!(matches!(
            sheet.set("Day 15", "16", "1"),
            Err(CellAddressError::UnknownColumn(_))
        ));
    }
}
