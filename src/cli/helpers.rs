//! Shared helper functions for CLI commands

use chrono::{Local, NaiveDate};

use crate::entities::batch::parse_batch_date;

/// Today's date in the local timezone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a date argument: `today`, `YYYY-MM-DD`, `YYYY.MM.DD` or `YYYY/MM/DD`
///
/// Used as a clap `value_parser`.
pub fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    if s.trim().eq_ignore_ascii_case("today") {
        return Ok(today());
    }
    parse_batch_date(s).ok_or_else(|| format!("invalid date '{}' (expected YYYY-MM-DD)", s))
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for a markdown table cell
pub fn escape_md(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

/// Parse one `PHASE:COLUMN=VALUE` cell assignment
pub fn parse_cell_assignment(s: &str) -> Result<(String, String, String), String> {
    let (address, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected PHASE:COLUMN=VALUE, got '{}'", s))?;
    let (phase, column) = address
        .rsplit_once(':')
        .ok_or_else(|| format!("expected PHASE:COLUMN=VALUE, got '{}'", s))?;
    Ok((
        phase.trim().to_string(),
        column.trim().to_string(),
        value.trim().to_string(),
    ))
}
