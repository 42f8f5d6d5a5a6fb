//! Terminal heatmap of batch day offsets
//!
//! # Example Output
//! ```text
//!               2024
//!               Jan
//!               Wed 10 Thu 11 Fri 12 Sat 13 Sun 14 Mon 15
//! B1  H9             9     10     11     12     13     14
//! B2  KOLF2.1J       2      3      4      5      6      7
//! ```
//!
//! Media-change days are shaded yellow, milestone days blue, and the first
//! column (the window start) is underlined.

use console::{style, StyledObject};

use crate::cli::helpers::truncate_str;
use crate::core::calendar::Calendar;
use crate::core::stage::DayShade;

const LABEL_WIDTH: usize = 14;
const CELL_WIDTH: usize = 6;

fn shade_cell(text: String, shade: Option<DayShade>, first: bool) -> StyledObject<String> {
    let styled = match shade {
        Some(DayShade::MediaChange) => style(text).black().on_yellow(),
        Some(DayShade::Milestone) => style(text).white().on_blue().bold(),
        Some(DayShade::Unclassified) => style(text),
        None => style(text).dim(),
    };
    if first {
        styled.underlined()
    } else {
        styled
    }
}

/// Header line that only prints a label where it changes from the previous column
fn changing_header(values: &[String]) -> String {
    let mut line = " ".repeat(LABEL_WIDTH);
    let mut previous: Option<&String> = None;
    for value in values {
        if previous != Some(value) {
            line.push_str(&format!("{:<width$} ", value, width = CELL_WIDTH));
        } else {
            line.push_str(&" ".repeat(CELL_WIDTH + 1));
        }
        previous = Some(value);
    }
    line.trim_end().to_string()
}

/// Render the calendar as a colored grid
pub fn render_heatmap(calendar: &Calendar) -> String {
    let headers = calendar.headers();
    let mut lines = Vec::new();

    let years: Vec<String> = headers.iter().map(|h| h.year.clone()).collect();
    let months: Vec<String> = headers.iter().map(|h| h.month.clone()).collect();
    lines.push(changing_header(&years));
    lines.push(changing_header(&months));

    let mut day_line = " ".repeat(LABEL_WIDTH);
    for (i, h) in headers.iter().enumerate() {
        let text = format!("{:>width$}", h.day, width = CELL_WIDTH);
        let styled = if i == 0 {
            style(text).bold().underlined()
        } else {
            style(text).bold()
        };
        day_line.push_str(&format!("{} ", styled));
    }
    lines.push(day_line.trim_end().to_string());

    let shading = calendar.shading();
    for (row, shades) in calendar.rows.iter().zip(shading) {
        let label = format!("B{:<3}{}", row.batch_id, truncate_str(&row.cell, LABEL_WIDTH - 5));
        let mut line = format!("{:<width$}", label, width = LABEL_WIDTH);
        for (i, (offset, shade)) in row.offsets.iter().zip(shades).enumerate() {
            let text = match offset {
                Some(day) => format!("{:>width$}", day, width = CELL_WIDTH),
                None => format!("{:>width$}", "·", width = CELL_WIDTH),
            };
            line.push_str(&format!("{} ", shade_cell(text, shade, i == 0)));
        }
        lines.push(line.trim_end().to_string());
    }

    lines.push(String::new());
    lines.push(format!(
        "{} media change  {} milestone",
        style("  ").on_yellow(),
        style("  ").on_blue()
    ));

    lines.join("\n") + "\n"
}
