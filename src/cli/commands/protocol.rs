//! `difftrack protocol` command - inspect the differentiation protocol

use clap::Subcommand;
use console::style;
use miette::Result;
use serde::Serialize;

use crate::cli::commands::utils::Workspace;
use crate::cli::output::{effective_format, print_structured};
use crate::cli::table::TextTable;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::concentration::{parse_concentration, Concentration};
use crate::core::protocol::TaskEntry;
use crate::core::stage::{DayShade, Stage};

#[derive(Subcommand, Debug)]
pub enum ProtocolCommands {
    /// Show the protocol, or one day of it
    Show(ShowArgs),

    /// Parse concentration strings the way the protocol loader does
    Conc(ConcArgs),

    /// Stage and day type for a day offset
    Stage(StageArgs),
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Only this day offset
    #[arg(long, short = 'd')]
    pub day: Option<u32>,
}

#[derive(clap::Args, Debug)]
pub struct ConcArgs {
    /// Values such as "10 uM", "5ng/mL", "2X"
    #[arg(required = true)]
    pub values: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct StageArgs {
    #[arg(allow_negative_numbers = true)]
    pub day: i64,
}

pub fn run(cmd: ProtocolCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ProtocolCommands::Show(args) => run_show(args, global),
        ProtocolCommands::Conc(args) => run_conc(args, global),
        ProtocolCommands::Stage(args) => run_stage(args, global),
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open()?;
    let protocol = ws.protocol()?;

    let days: Vec<(u32, &[TaskEntry])> = protocol
        .days()
        .filter(|(day, _)| args.day.is_none_or(|d| d == *day))
        .collect();

    if matches!(global.output, OutputFormat::Json | OutputFormat::Yaml) {
        let map: std::collections::BTreeMap<u32, &[TaskEntry]> = days.iter().copied().collect();
        print_structured(&map, global.output)?;
        return Ok(());
    }

    if days.is_empty() {
        match args.day {
            Some(day) => println!("Day {}: No task", day),
            None => println!("Protocol is empty."),
        }
        return Ok(());
    }

    match global.output {
        OutputFormat::Auto => {
            for (day, tasks) in &days {
                println!(
                    "{} {}",
                    style(format!("Day {:>2}", day)).bold(),
                    style(Stage::for_day(i64::from(*day))).dim()
                );
                for task in tasks.iter() {
                    println!("  • {}", style(&task.task).yellow());
                    for item in task.composition.iter().flatten() {
                        let pct = item
                            .percentage
                            .map(|p| format!("{:.3}%", p))
                            .unwrap_or_else(|| "?".to_string());
                        println!("      {:<28} {:>10}", item.component, pct);
                    }
                }
            }
        }
        format => {
            let mut table =
                TextTable::new(["DAY", "TASK", "COMPONENT", "PERCENT", "STOCK", "WORKING"]);
            for (day, tasks) in &days {
                for task in tasks.iter() {
                    match task.composition.as_deref() {
                        Some(items) if !items.is_empty() => {
                            for item in items {
                                table.push([
                                    day.to_string(),
                                    task.task.clone(),
                                    item.component.clone(),
                                    item.percentage.map(|p| p.to_string()).unwrap_or_default(),
                                    item.stock_conc.clone(),
                                    item.working_conc.clone(),
                                ]);
                            }
                        }
                        _ => table.push([
                            day.to_string(),
                            task.task.clone(),
                            String::new(),
                            String::new(),
                            String::new(),
                            String::new(),
                        ]),
                    }
                }
            }
            table.print(format)?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct ParsedValue {
    input: String,
    parsed: Option<Concentration>,
}

fn run_conc(args: ConcArgs, global: &GlobalOpts) -> Result<()> {
    let parsed: Vec<ParsedValue> = args
        .values
        .into_iter()
        .map(|input| ParsedValue {
            parsed: parse_concentration(&input),
            input,
        })
        .collect();

    let format = effective_format(global.output, true);
    if print_structured(&parsed, format)? {
        return Ok(());
    }

    let mut table = TextTable::new(["INPUT", "VALUE", "UNIT"]);
    for p in &parsed {
        match p.parsed {
            Some(c) => table.push([p.input.clone(), c.value.to_string(), c.family.to_string()]),
            None => table.push([p.input.clone(), String::new(), String::new()]),
        }
    }
    table.print(format)
}

#[derive(Serialize)]
struct DayInfo {
    day: i64,
    stage: Stage,
    stage_code: &'static str,
    shade: DayShade,
    task: String,
}

fn run_stage(args: StageArgs, global: &GlobalOpts) -> Result<()> {
    let stage = Stage::for_day(args.day);
    let shade = DayShade::classify(args.day);

    // The task line is informative only; outside a project it is omitted
    let task = Workspace::open()
        .and_then(|ws| ws.protocol())
        .map(|p| p.headline(args.day).to_string())
        .unwrap_or_default();

    let info = DayInfo {
        day: args.day,
        stage,
        stage_code: stage.code(),
        shade,
        task,
    };
    if print_structured(&info, global.output)? {
        return Ok(());
    }

    let kind = match shade {
        DayShade::Unclassified => String::new(),
        other => format!(", {}", other),
    };
    println!(
        "Day {}: {} ({}){}",
        info.day,
        style(stage).bold(),
        info.stage_code,
        kind
    );
    if !info.task.is_empty() {
        println!("Task: {}", info.task);
    }
    Ok(())
}
