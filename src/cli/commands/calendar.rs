//! `difftrack calendar` command - day-offset heatmap

use chrono::NaiveDate;
use miette::Result;

use crate::cli::commands::utils::Workspace;
use crate::cli::helpers::{parse_date_arg, today};
use crate::cli::output::print_structured;
use crate::cli::table::TextTable;
use crate::cli::viz::render_heatmap;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::calendar::{ongoing_on, Calendar};

#[derive(clap::Args, Debug)]
pub struct CalendarArgs {
    /// First date of the window (defaults to today)
    #[arg(long, short = 'f', value_parser = parse_date_arg)]
    pub from: Option<NaiveDate>,

    /// Number of days to show (defaults to the configured window)
    #[arg(long, short = 'n', value_parser = clap::value_parser!(u32).range(1..=366))]
    pub days: Option<u32>,
}

pub fn run(args: CalendarArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open()?;
    let session = ws.session()?;
    let batches = ws
        .store()?
        .read_batches(&session.username)
        .map_err(|e| miette::miette!("{}", e))?;

    let start = args.from.unwrap_or_else(today);
    let length = args.days.unwrap_or(ws.config.calendar_days);
    // Only batches still inside the protocol on the first day get a row
    let calendar = Calendar::build(&ongoing_on(&batches, start), start, length);

    if print_structured(&calendar, global.output)? {
        return Ok(());
    }
    if calendar.is_empty() {
        println!("No ongoing batches to show on {}.", start);
        return Ok(());
    }

    match global.output {
        OutputFormat::Auto => print!("{}", render_heatmap(&calendar)),
        format => {
            let mut table = TextTable::new(
                ["BATCH".to_string(), "CELL".to_string()]
                    .into_iter()
                    .chain(calendar.dates.iter().map(|d| d.to_string())),
            );
            for row in &calendar.rows {
                table.push(
                    [row.batch_id.to_string(), row.cell.clone()].into_iter().chain(
                        row.offsets
                            .iter()
                            .map(|o| o.map(|d| d.to_string()).unwrap_or_default()),
                    ),
                );
            }
            table.print(format)?;
        }
    }
    Ok(())
}
