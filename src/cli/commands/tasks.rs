//! `difftrack tasks` command - what to do today and how much to dispense

use chrono::NaiveDate;
use console::style;
use miette::Result;

use crate::cli::commands::utils::Workspace;
use crate::cli::helpers::{parse_date_arg, today};
use crate::cli::output::print_structured;
use crate::cli::table::TextTable;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::stage::DayShade;
use crate::core::tasks::{BatchTasks, TaskSheet};
use crate::report::ReportGenerator;

#[derive(clap::Args, Debug)]
pub struct TasksArgs {
    /// Date to plan for (defaults to today)
    #[arg(long, short = 'd', value_parser = parse_date_arg)]
    pub date: Option<NaiveDate>,

    /// Only this batch
    #[arg(long, short = 'b')]
    pub batch: Option<u32>,

    /// Total medium volume in mL (overrides the per-batch suggestion)
    #[arg(long, value_parser = parse_volume)]
    pub volume: Option<f64>,
}

fn parse_volume(s: &str) -> Result<f64, String> {
    let v: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("invalid volume '{}'", s))?;
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err(format!("volume must be positive, got '{}'", s))
    }
}

pub fn run(args: TasksArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open()?;
    let session = ws.session()?;
    let protocol = ws.protocol()?;
    let batches: Vec<_> = ws
        .store()?
        .read_batches(&session.username)
        .map_err(|e| miette::miette!("{}", e))?
        .into_iter()
        .filter(|b| args.batch.is_none_or(|id| b.batch_id == id))
        .collect();

    let date = args.date.unwrap_or_else(today);
    let sheet = TaskSheet::build(&batches, &protocol, date, ws.config.ml_per_plate, args.volume);

    if print_structured(&sheet, global.output)? {
        return Ok(());
    }

    match global.output {
        OutputFormat::Md => {
            let generator = ReportGenerator::new().map_err(|e| miette::miette!("{}", e))?;
            let md = generator
                .task_sheet(&sheet)
                .map_err(|e| miette::miette!("{}", e))?;
            print!("{}", md);
        }
        OutputFormat::Auto => print_sheet(&sheet),
        format => {
            let mut table = TextTable::new(["BATCH", "DAY", "STAGE", "TASK", "COMPONENT", "VOLUME"]);
            for b in &sheet.batches {
                if b.tasks.is_empty() {
                    table.push([
                        b.batch_id.to_string(),
                        b.day.to_string(),
                        b.stage_label.clone(),
                        b.headline.clone(),
                        String::new(),
                        String::new(),
                    ]);
                }
                for t in &b.tasks {
                    let lines: Vec<(String, String)> = if t.lines.is_empty() {
                        vec![(String::new(), String::new())]
                    } else {
                        t.lines
                            .iter()
                            .map(|l| (l.component.clone(), l.volume_text()))
                            .collect()
                    };
                    for (component, volume) in lines {
                        table.push([
                            b.batch_id.to_string(),
                            b.day.to_string(),
                            b.stage_label.clone(),
                            t.task.clone(),
                            component,
                            volume,
                        ]);
                    }
                }
            }
            table.print(format)?;
        }
    }
    Ok(())
}

fn print_sheet(sheet: &TaskSheet) {
    println!(
        "{} {}",
        style("Tasks for").bold(),
        style(sheet.date.format("%Y-%m-%d (%a)")).cyan()
    );
    if sheet.is_empty() {
        println!("No ongoing batches.");
        return;
    }
    for b in &sheet.batches {
        print_batch(b);
    }
}

fn print_batch(b: &BatchTasks) {
    let day = match b.shade {
        DayShade::MediaChange => style(format!("Day {}", b.day)).yellow().bold(),
        DayShade::Milestone => style(format!("Day {}", b.day)).blue().bold(),
        DayShade::Unclassified => style(format!("Day {}", b.day)).bold(),
    };
    println!();
    println!("{}", style("─".repeat(60)).dim());
    println!(
        "{} {}  {}  {}",
        style("Batch").bold(),
        style(b.batch_id).cyan(),
        day,
        style(&b.stage_label).dim()
    );
    if !b.cell.is_empty() {
        println!("Cell: {}", b.cell);
    }

    if b.tasks.is_empty() {
        println!("  {}", style(&b.headline).dim());
        return;
    }
    for t in &b.tasks {
        println!("  • {}", style(&t.task).yellow());
        if !t.lines.is_empty() {
            println!("    total medium: {:.1} mL", b.total_ml);
        }
        for line in &t.lines {
            let volume = line.volume_text();
            let volume = if volume.is_empty() { "?".to_string() } else { volume };
            println!("    {:<28} {:>10}", line.component, volume);
        }
    }
}
