//! Daily task sheet - what every ongoing batch needs on a date

use chrono::NaiveDate;
use serde::Serialize;

use crate::core::calendar::scheduled_on;
use crate::core::protocol::Protocol;
use crate::core::stage::{DayShade, Stage, FINAL_DAY};
use crate::core::volume::{dispense_lines, suggested_total_ml, DispenseLine};
use crate::entities::batch::Batch;

/// One protocol task resolved for a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskItem {
    pub task: String,
    /// Component volumes; empty for tasks without a composition
    pub lines: Vec<DispenseLine>,
}

/// Everything one batch needs on the sheet's date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchTasks {
    pub batch_id: u32,
    pub cell: String,
    pub day: i64,
    pub stage: Stage,
    pub stage_label: String,
    pub shade: DayShade,
    pub total_ml: f64,
    /// First task of the day or "No task"
    pub headline: String,
    pub tasks: Vec<TaskItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSheet {
    pub date: NaiveDate,
    pub batches: Vec<BatchTasks>,
}

impl TaskSheet {
    /// Build the sheet for `date`
    ///
    /// `total_ml` overrides the per-batch suggested medium volume.
    pub fn build(
        batches: &[Batch],
        protocol: &Protocol,
        date: NaiveDate,
        ml_per_plate: f64,
        total_ml: Option<f64>,
    ) -> Self {
        let batches = scheduled_on(batches, date)
            .into_iter()
            .filter(|s| s.day <= FINAL_DAY)
            .map(|s| {
                let total = total_ml.unwrap_or_else(|| suggested_total_ml(s.batch, s.day, ml_per_plate));
                let tasks = protocol
                    .tasks_for(s.day)
                    .iter()
                    .map(|entry| TaskItem {
                        task: entry.task.clone(),
                        lines: entry
                            .composition
                            .as_deref()
                            .map(|items| dispense_lines(items, total))
                            .unwrap_or_default(),
                    })
                    .collect();

                BatchTasks {
                    batch_id: s.batch.batch_id,
                    cell: s.batch.cell.clone(),
                    day: s.day,
                    stage: s.stage(),
                    stage_label: s.stage().to_string(),
                    shade: s.shade(),
                    total_ml: total,
                    headline: protocol.headline(s.day).to_string(),
                    tasks,
                }
            })
            .collect();

        Self { date, batches }
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}
