//! Protocol table - the day-by-day differentiation schedule
//!
//! A protocol table is a flat list of rows keyed by integer day offset. Several
//! rows may share a day (one per component of a media change). Loading runs
//! three steps:
//!
//! 1. read rows from CSV or YAML
//! 2. backfill missing percentages from stock/working concentrations
//! 3. group rows into per-day task lists

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::concentration::dilution_percentage;
use crate::yaml::{parse_yaml, YamlError};

/// Task names containing one of these markers carry a composition list
const COMPOSITION_MARKERS: &[&str] = &["Media Change", "Plate coating"];

/// Errors that can occur while loading a protocol table
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Protocol file not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported protocol format '{0}' (expected .csv, .yaml or .yml)")]
    UnsupportedFormat(String),

    #[error("Failed to read protocol CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Yaml(#[from] YamlError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One row of the protocol table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolEntry {
    pub day: u32,
    pub task: String,
    #[serde(default)]
    pub component: String,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub stock_conc: String,
    #[serde(default)]
    pub working_conc: String,
}

/// A spreadsheet cell that may hold a number, a boolean or free text
///
/// CSV fields are type-sniffed, so a bare `true` arrives as a boolean.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Cell {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl Cell {
    fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Flag(_) => None,
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    fn into_text(self) -> String {
        match self {
            Cell::Number(n) => n.to_string(),
            Cell::Flag(b) => b.to_string(),
            Cell::Text(s) => s,
        }
    }
}

/// Row shape as it appears on disk, before validation
#[derive(Debug, Deserialize)]
struct RawRow {
    day: Option<Cell>,
    #[serde(default)]
    task: Option<Cell>,
    #[serde(default)]
    component: Option<Cell>,
    #[serde(default)]
    percentage: Option<Cell>,
    #[serde(default)]
    stock_conc: Option<Cell>,
    #[serde(default)]
    working_conc: Option<Cell>,
}

impl RawRow {
    fn into_entry(self) -> Option<ProtocolEntry> {
        let day = self.day.as_ref().and_then(Cell::as_number)?;
        if day < 0.0 || day.fract() != 0.0 || day > u32::MAX as f64 {
            return None;
        }
        let task = self.task.map(Cell::into_text).filter(|t| !t.trim().is_empty())?;

        Some(ProtocolEntry {
            day: day as u32,
            task,
            component: self.component.map(Cell::into_text).unwrap_or_default(),
            percentage: self
                .percentage
                .as_ref()
                .and_then(Cell::as_number)
                .filter(|p| p.is_finite()),
            stock_conc: self.stock_conc.map(Cell::into_text).unwrap_or_default(),
            working_conc: self.working_conc.map(Cell::into_text).unwrap_or_default(),
        })
    }
}

/// The flat protocol table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProtocolTable {
    pub entries: Vec<ProtocolEntry>,
}

impl ProtocolTable {
    pub fn new(entries: Vec<ProtocolEntry>) -> Self {
        Self { entries }
    }

    /// Load a table from a `.csv`, `.yaml` or `.yml` file
    pub fn load(path: &Path) -> Result<Self, ProtocolError> {
        if !path.exists() {
            return Err(ProtocolError::NotFound(path.to_path_buf()));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let raw = match ext.as_str() {
            "csv" => {
                let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
                reader
                    .deserialize::<RawRow>()
                    .collect::<Result<Vec<_>, _>>()?
            }
            "yaml" | "yml" => {
                let content = std::fs::read_to_string(path)?;
                parse_yaml::<Vec<RawRow>>(&content, &path.display().to_string())?
            }
            other => return Err(ProtocolError::UnsupportedFormat(other.to_string())),
        };

        let total = raw.len();
        let entries: Vec<ProtocolEntry> = raw.into_iter().filter_map(RawRow::into_entry).collect();
        if entries.len() < total {
            tracing::warn!(
                skipped = total - entries.len(),
                path = %path.display(),
                "skipped protocol rows without a valid day or task"
            );
        }
        tracing::debug!(rows = entries.len(), "loaded protocol table");

        Ok(Self { entries })
    }

    /// Fill in missing percentages from working/stock concentrations
    ///
    /// Rows that already carry a percentage are untouched. Rows whose
    /// concentrations do not both parse (or whose stock is zero) stay empty.
    pub fn backfill_percentages(&mut self) {
        for entry in self.entries.iter_mut().filter(|e| e.percentage.is_none()) {
            entry.percentage = dilution_percentage(&entry.working_conc, &entry.stock_conc);
        }
    }

    /// Group rows by day, then by task name within the day
    pub fn group(&self) -> Protocol {
        let mut days: BTreeMap<u32, Vec<TaskEntry>> = BTreeMap::new();

        for entry in &self.entries {
            let tasks = days.entry(entry.day).or_default();
            let idx = match tasks.iter().position(|t| t.task == entry.task) {
                Some(idx) => idx,
                None => {
                    tasks.push(TaskEntry::new(&entry.task));
                    tasks.len() - 1
                }
            };

            if let Some(composition) = tasks[idx].composition.as_mut() {
                composition.push(CompositionItem {
                    component: entry.component.clone(),
                    percentage: entry.percentage,
                    stock_conc: entry.stock_conc.clone(),
                    working_conc: entry.working_conc.clone(),
                });
            }
        }

        Protocol { days }
    }
}

/// One component of a media change or coating mix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionItem {
    pub component: String,
    pub percentage: Option<f64>,
    pub stock_conc: String,
    pub working_conc: String,
}

/// A task scheduled on a given day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEntry {
    pub task: String,
    /// Present only for composition tasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composition: Option<Vec<CompositionItem>>,
}

impl TaskEntry {
    fn new(task: &str) -> Self {
        let composition = if is_composition_task(task) {
            Some(Vec::new())
        } else {
            None
        };
        Self {
            task: task.to_string(),
            composition,
        }
    }

    pub fn has_composition(&self) -> bool {
        self.composition.is_some()
    }
}

/// Whether a task name denotes a multi-component mix (case-sensitive)
pub fn is_composition_task(task: &str) -> bool {
    COMPOSITION_MARKERS.iter().any(|m| task.contains(m))
}

/// Grouped protocol: day offset -> ordered task list
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Protocol {
    days: BTreeMap<u32, Vec<TaskEntry>>,
}

impl Protocol {
    /// Load, backfill and group a protocol file in one go
    pub fn load(path: &Path) -> Result<Self, ProtocolError> {
        let mut table = ProtocolTable::load(path)?;
        table.backfill_percentages();
        Ok(table.group())
    }

    /// Tasks scheduled for a day offset; empty for unknown or negative days
    pub fn tasks_for(&self, offset: i64) -> &[TaskEntry] {
        u32::try_from(offset)
            .ok()
            .and_then(|day| self.days.get(&day))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First task name for a day, or "No task"
    pub fn headline(&self, offset: i64) -> &str {
        self.tasks_for(offset)
            .first()
            .map(|t| t.task.as_str())
            .unwrap_or("No task")
    }

    pub fn days(&self) -> impl Iterator<Item = (u32, &[TaskEntry])> {
        self.days.iter().map(|(d, t)| (*d, t.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn row(day: u32, task: &str, component: &str, pct: Option<f64>, stock: &str, work: &str) -> ProtocolEntry {
        ProtocolEntry {
            day,
            task: task.to_string(),
            component: component.to_string(),
            percentage: pct,
            stock_conc: stock.to_string(),
            working_conc: work.to_string(),
        }
    }

    fn sample_table() -> ProtocolTable {
        ProtocolTable::new(vec![
            row(0, "Plate coating", "Laminin", None, "1 mg/ml", "10 ug/ml"),
            row(0, "Seed cells", "", None, "", ""),
            row(1, "Media Change (N2B27)", "DMEM/F12", Some(48.5), "", ""),
            row(1, "Media Change (N2B27)", "SB431542", None, "10 mM", "10 uM"),
            row(1, "Media Change (N2B27)", "LDN193189", None, "100 uM", "100 nM"),
            row(2, "Check morphology", "", None, "", ""),
        ])
    }

    #[test]
    fn test_backfill_percentage() {
        let mut table = ProtocolTable::new(vec![row(1, "Media Change", "X", None, "100uM", "10uM")]);
        table.backfill_percentages();
        let pct = table.entries[0].percentage.unwrap();
        assert!((pct - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_backfill_keeps_existing_and_unparseable() {
        let mut table = sample_table();
        table.backfill_percentages();

        // Existing percentage untouched
        assert_eq!(table.entries[2].percentage, Some(48.5));
        // "1 mg/ml" has no recognized unit -> stays empty
        assert_eq!(table.entries[0].percentage, None);
        // 10 uM / 10 mM = 0.1 %
        assert!((table.entries[3].percentage.unwrap() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_group_by_day_and_task() {
        let protocol = sample_table().group();

        let day0 = protocol.tasks_for(0);
        assert_eq!(day0.len(), 2);
        assert_eq!(day0[0].task, "Plate coating");
        assert!(day0[0].has_composition());
        assert_eq!(day0[1].task, "Seed cells");
        assert!(!day0[1].has_composition());

        let day1 = protocol.tasks_for(1);
        assert_eq!(day1.len(), 1);
        let comp = day1[0].composition.as_ref().unwrap();
        assert_eq!(comp.len(), 3);
        assert_eq!(comp[0].component, "DMEM/F12");
        assert_eq!(comp[2].component, "LDN193189");
    }

    #[test]
    fn test_composition_marker_is_case_sensitive() {
        assert!(is_composition_task("Day 4 Media Change"));
        assert!(is_composition_task("Plate coating (PLO)"));
        assert!(!is_composition_task("media change"));
        assert!(!is_composition_task("Plate Coating"));
    }

    #[test]
    fn test_group_is_idempotent() {
        let table = sample_table();
        assert_eq!(table.group(), table.group());
    }

    #[test]
    fn test_missing_day_is_empty() {
        let protocol = sample_table().group();
        assert!(protocol.tasks_for(7).is_empty());
        assert!(protocol.tasks_for(-1).is_empty());
        assert_eq!(protocol.headline(7), "No task");
        assert_eq!(protocol.headline(2), "Check morphology");
    }

    #[test]
    fn test_load_csv() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("protocol.csv");
        fs::write(
            &path,
            "day,task,component,percentage,stock_conc,working_conc\n\
             1,Media Change,Neurobasal,49,,\n\
             1,Media Change,CHIR99021,,3 mM,0.7 uM\n\
             x,Broken row,,,,\n\
             2,Observe,,,,\n",
        )
        .unwrap();

        let table = ProtocolTable::load(&path).unwrap();
        assert_eq!(table.entries.len(), 3);
        assert_eq!(table.entries[0].percentage, Some(49.0));
        assert_eq!(table.entries[1].percentage, None);
        assert_eq!(table.entries[1].stock_conc, "3 mM");

        let protocol = Protocol::load(&path).unwrap();
        let comp = protocol.tasks_for(1)[0].composition.clone().unwrap();
        assert!(comp[1].percentage.is_some());
    }

    #[test]
    fn test_load_csv_with_boolean_like_cells() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("protocol.csv");
        fs::write(
            &path,
            "day,task,component,percentage,stock_conc,working_conc\n\
             1,Media Change,true,10,,\n\
             1,Media Change,Neurobasal,false,100 uM,10 uM\n\
             true,Observe,,,,\n\
             2,false,,,,\n",
        )
        .unwrap();

        let table = ProtocolTable::load(&path).unwrap();
        assert_eq!(table.entries.len(), 3);
        assert_eq!(table.entries[2].task, "false");
        assert_eq!(table.entries[0].component, "true");
        assert_eq!(table.entries[0].percentage, Some(10.0));
        assert_eq!(table.entries[1].percentage, None);

        let protocol = Protocol::load(&path).unwrap();
        let comp = protocol.tasks_for(1)[0].composition.clone().unwrap();
        assert_eq!(comp[1].percentage, Some(10.0));
    }

    #[test]
    fn test_load_yaml() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("protocol.yaml");
        fs::write(
            &path,
            "- day: 0\n  task: Plate coating\n  component: Matrigel\n  percentage: 1\n\
             - day: 3\n  task: Observe\n",
        )
        .unwrap();

        let protocol = Protocol::load(&path).unwrap();
        assert_eq!(protocol.tasks_for(0)[0].composition.as_ref().unwrap()[0].percentage, Some(1.0));
        assert_eq!(protocol.headline(3), "Observe");
    }

    #[test]
    fn test_load_missing_and_unsupported() {
        let tmp = tempdir().unwrap();
        assert!(matches!(
            ProtocolTable::load(&tmp.path().join("nope.csv")),
            Err(ProtocolError::NotFound(_))
        ));

        let xlsx = tmp.path().join("protocol.xlsx");
        fs::write(&xlsx, "binary").unwrap();
        assert!(matches!(
            ProtocolTable::load(&xlsx),
            Err(ProtocolError::UnsupportedFormat(_))
        ));
    }
}
