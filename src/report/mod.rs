//! Rendered reports and bundled project files

use rust_embed::Embed;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Tera, Value};
use thiserror::Error;

use crate::cli::helpers::escape_md;
use crate::core::tasks::TaskSheet;

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

const TASK_SHEET_TEMPLATE: &str = "task_sheet.md.tera";
const DEFAULT_PROTOCOL: &str = "protocol.csv";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template rendering error: {0}")]
    RenderError(String),
}

/// The protocol table written by `difftrack init`
pub fn default_protocol() -> Result<String, TemplateError> {
    let file = EmbeddedTemplates::get(DEFAULT_PROTOCOL)
        .ok_or_else(|| TemplateError::NotFound(DEFAULT_PROTOCOL.to_string()))?;
    String::from_utf8(file.data.into_owned())
        .map_err(|e| TemplateError::RenderError(e.to_string()))
}

#[derive(Serialize)]
struct LineView {
    component: String,
    volume: String,
}

#[derive(Serialize)]
struct TaskView {
    task: String,
    lines: Vec<LineView>,
}

#[derive(Serialize)]
struct BatchView {
    batch_id: u32,
    cell: String,
    day: i64,
    stage: String,
    total: String,
    tasks: Vec<TaskView>,
}

/// Tera filter keeping user text inside one Markdown table cell or heading
fn md_cell(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(escape_md(s))),
        other => Ok(other.clone()),
    }
}

/// Report renderer over the embedded tera templates
pub struct ReportGenerator {
    tera: Tera,
}

impl ReportGenerator {
    pub fn new() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        tera.register_filter("md_cell", md_cell);

        for file in EmbeddedTemplates::iter() {
            let filename = file.as_ref();
            if !filename.ends_with(".tera") {
                continue;
            }
            if let Some(content) = EmbeddedTemplates::get(filename) {
                if let Ok(template_str) = std::str::from_utf8(&content.data) {
                    tera.add_raw_template(filename, template_str)
                        .map_err(|e| TemplateError::RenderError(e.to_string()))?;
                }
            }
        }

        Ok(Self { tera })
    }

    /// Markdown task sheet for one date
    pub fn task_sheet(&self, sheet: &TaskSheet) -> Result<String, TemplateError> {
        if !self.tera.get_template_names().any(|n| n == TASK_SHEET_TEMPLATE) {
            return Err(TemplateError::NotFound(TASK_SHEET_TEMPLATE.to_string()));
        }

        let batches: Vec<BatchView> = sheet
            .batches
            .iter()
            .map(|b| BatchView {
                batch_id: b.batch_id,
                cell: b.cell.clone(),
                day: b.day,
                stage: b.stage_label.clone(),
                total: format!("{:.1} mL", b.total_ml),
                tasks: b
                    .tasks
                    .iter()
                    .map(|t| TaskView {
                        task: t.task.clone(),
                        lines: t
                            .lines
                            .iter()
                            .map(|l| LineView {
                                component: l.component.clone(),
                                volume: l.volume_text(),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        let mut context = tera::Context::new();
        context.insert("date", &sheet.date.format("%Y-%m-%d (%a)").to_string());
        context.insert("batches", &batches);

        self.tera
            .render(TASK_SHEET_TEMPLATE, &context)
            .map_err(|e| TemplateError::RenderError(e.to_string()))
    }
}
