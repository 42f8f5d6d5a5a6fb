//! `difftrack batch` command - batch management

use chrono::NaiveDate;
use clap::Subcommand;
use console::style;
use dialoguer::{theme::ColorfulTheme, Input};
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::utils::Workspace;
use crate::cli::filters::BatchFilter;
use crate::cli::helpers::{parse_cell_assignment, parse_date_arg, today, truncate_str};
use crate::cli::output::{effective_format, print_structured};
use crate::cli::table::TextTable;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::stage::Stage;
use crate::entities::batch::{next_batch_id, Batch, BatchError};
use crate::entities::cell_counts::{CellCountSheet, PHASES};

#[derive(Subcommand, Debug)]
pub enum BatchCommands {
    /// List your batches
    List(ListArgs),

    /// Create a new batch
    New(NewArgs),

    /// Show a batch's details
    Show(ShowArgs),

    /// Change fields of an existing batch
    Edit(EditArgs),

    /// Show or record cell counts
    Counts(CountsArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Which batches to list
    #[arg(long, short = 'f', default_value = "all")]
    pub filter: BatchFilter,

    /// Reference date for the filter and day column
    #[arg(long, short = 'd', value_parser = parse_date_arg)]
    pub date: Option<NaiveDate>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Batch ID (defaults to one past your highest)
    #[arg(long)]
    pub id: Option<u32>,

    /// Cell line
    #[arg(long, short = 'c')]
    pub cell: Option<String>,

    /// Day 0 of the protocol (defaults to today)
    #[arg(long, short = 's', value_parser = parse_date_arg)]
    pub start: Option<NaiveDate>,

    /// Last tracked day (defaults to start + 21 days)
    #[arg(long, short = 'e', value_parser = parse_date_arg)]
    pub end: Option<NaiveDate>,

    #[arg(long, short = 'n')]
    pub note: Option<String>,

    /// Plates seeded at day 0
    #[arg(long, default_value_t = 1)]
    pub plates: u32,

    /// Plates after replating at day 15
    #[arg(long, default_value_t = 0)]
    pub replated: u32,

    /// Prompt for fields not given on the command line
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    pub id: u32,

    /// Reference date for the current day and stage
    #[arg(long, short = 'd', value_parser = parse_date_arg)]
    pub date: Option<NaiveDate>,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    pub id: u32,

    #[arg(long, short = 'c')]
    pub cell: Option<String>,

    #[arg(long, short = 's', value_parser = parse_date_arg)]
    pub start: Option<NaiveDate>,

    #[arg(long, short = 'e', value_parser = parse_date_arg, conflicts_with = "clear_end")]
    pub end: Option<NaiveDate>,

    /// Remove the end date (falls back to start + 21 days)
    #[arg(long)]
    pub clear_end: bool,

    #[arg(long, short = 'n')]
    pub note: Option<String>,

    #[arg(long)]
    pub plates: Option<u32>,

    #[arg(long)]
    pub replated: Option<u32>,
}

#[derive(clap::Args, Debug)]
pub struct CountsArgs {
    pub id: u32,

    /// Set a cell, e.g. --set "Day 15:A=1.2e6" (empty value clears it)
    #[arg(long = "set", value_parser = parse_cell_assignment)]
    pub set: Vec<(String, String, String)>,
}

pub fn run(cmd: BatchCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        BatchCommands::List(args) => run_list(args, global),
        BatchCommands::New(args) => run_new(args),
        BatchCommands::Show(args) => run_show(args, global),
        BatchCommands::Edit(args) => run_edit(args),
        BatchCommands::Counts(args) => run_counts(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open()?;
    let session = ws.session()?;
    let store = ws.store()?;
    let date = args.date.unwrap_or_else(today);

    let mut batches: Vec<Batch> = store
        .read_batches(&session.username)
        .map_err(|e| miette::miette!("{}", e))?
        .into_iter()
        .filter(|b| args.filter.matches(b, date))
        .collect();
    batches.sort_by_key(|b| b.batch_id);

    if args.count {
        println!("{}", batches.len());
        return Ok(());
    }

    let format = effective_format(global.output, true);
    if print_structured(&batches, format)? {
        return Ok(());
    }

    if batches.is_empty() {
        match args.filter {
            BatchFilter::All => println!("No batches found."),
            other => println!("No {} batches found.", other),
        }
        return Ok(());
    }

    let mut table = TextTable::new([
        "ID", "CELL", "START", "END", "DAY", "STAGE", "STATUS", "PLATES", "NOTE",
    ]);
    for b in &batches {
        let day = b.offset_on(date);
        table.push([
            b.batch_id.to_string(),
            b.cell.clone(),
            b.start_date.to_string(),
            b.effective_end_date().to_string(),
            day.map(|d| d.to_string()).unwrap_or_default(),
            day.map(|d| Stage::for_day(d).to_string()).unwrap_or_default(),
            b.phase(date).to_string(),
            format!("{}/{}", b.initial_plate_count, b.replaced_plate_count),
            truncate_str(&b.note, 30),
        ]);
    }
    table.print(format)
}

fn run_new(args: NewArgs) -> Result<()> {
    let ws = Workspace::open()?;
    let session = ws.session()?;
    let mut store = ws.store()?;
    let existing = store
        .read_batches(&session.username)
        .map_err(|e| miette::miette!("{}", e))?;

    let theme = ColorfulTheme::default();
    let suggested_id = next_batch_id(&existing);

    let batch_id = match args.id {
        Some(id) => id,
        None if args.interactive => Input::<u32>::with_theme(&theme)
            .with_prompt("Batch ID")
            .default(suggested_id)
            .interact_text()
            .into_diagnostic()?,
        None => suggested_id,
    };

    let cell = match args.cell {
        Some(c) => c,
        None if args.interactive => Input::<String>::with_theme(&theme)
            .with_prompt("Cell line")
            .allow_empty(true)
            .interact_text()
            .into_diagnostic()?,
        None => String::new(),
    };

    let start = match args.start {
        Some(d) => d,
        None if args.interactive => {
            let text = Input::<String>::with_theme(&theme)
                .with_prompt("Start date (YYYY-MM-DD)")
                .default(today().to_string())
                .validate_with(|s: &String| parse_date_arg(s).map(|_| ()))
                .interact_text()
                .into_diagnostic()?;
            parse_date_arg(&text).map_err(|e| miette::miette!("{}", e))?
        }
        None => today(),
    };

    if existing.iter().any(|b| b.batch_id == batch_id) {
        return Err(miette::miette!(
            "{} (use 'difftrack batch edit {}')",
            BatchError::AlreadyExists(batch_id),
            batch_id
        ));
    }

    let mut batch = Batch::new(batch_id, session.username.as_str(), cell.trim(), start);
    batch.end_date = args.end;
    batch.note = args.note.unwrap_or_default();
    batch.initial_plate_count = args.plates;
    batch.replaced_plate_count = args.replated;

    store
        .write_batch(&batch)
        .map_err(|e| miette::miette!("{}", e))?;

    println!(
        "{} Created batch {} starting {} (ends {})",
        style("✓").green(),
        style(batch.batch_id).cyan(),
        batch.start_date,
        batch.effective_end_date()
    );
    Ok(())
}

fn load_batch(ws: &Workspace, username: &str, id: u32) -> Result<Batch> {
    ws.store()?
        .find_batch(username, id)
        .map_err(|e| miette::miette!("{}", e))?
        .ok_or_else(|| miette::miette!("{}", BatchError::NotFound(id)))
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open()?;
    let session = ws.session()?;
    let batch = load_batch(&ws, &session.username, args.id)?;
    let date = args.date.unwrap_or_else(today);

    if print_structured(&batch, global.output)? {
        return Ok(());
    }
    print_batch_details(&batch, date);
    Ok(())
}

fn print_batch_details(batch: &Batch, date: NaiveDate) {
    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("Batch").bold(), style(batch.batch_id).cyan());
    println!("{}: {}", style("Cell").bold(), style(&batch.cell).yellow());
    println!("{}: {}", style("Status").bold(), batch.phase(date));
    println!("{}", style("─".repeat(60)).dim());
    println!("Start:    {}", batch.start_date);
    match batch.end_date {
        Some(end) => println!("End:      {}", end),
        None => println!("End:      {} (default)", batch.effective_end_date()),
    }
    match batch.offset_on(date) {
        Some(day) => println!("Day:      {} ({})", day, Stage::for_day(day)),
        None => println!("Day:      -"),
    }
    println!(
        "Plates:   {} seeded, {} after replating",
        batch.initial_plate_count, batch.replaced_plate_count
    );
    if !batch.note.is_empty() {
        println!();
        println!("{}:", style("Note").bold());
        println!("  {}", batch.note);
    }
}

fn run_edit(args: EditArgs) -> Result<()> {
    let ws = Workspace::open()?;
    let session = ws.session()?;
    let mut batch = load_batch(&ws, &session.username, args.id)?;

    if let Some(cell) = args.cell {
        batch.cell = cell.trim().to_string();
    }
    if let Some(start) = args.start {
        batch.start_date = start;
    }
    if let Some(end) = args.end {
        batch.end_date = Some(end);
    }
    if args.clear_end {
        batch.end_date = None;
    }
    if let Some(note) = args.note {
        batch.note = note;
    }
    if let Some(plates) = args.plates {
        batch.initial_plate_count = plates;
    }
    if let Some(replated) = args.replated {
        batch.replaced_plate_count = replated;
    }

    ws.store()?
        .write_batch(&batch)
        .map_err(|e| miette::miette!("{}", e))?;

    println!("{} Updated batch {}", style("✓").green(), style(batch.batch_id).cyan());
    Ok(())
}

fn run_counts(args: CountsArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open()?;
    let session = ws.session()?;
    let mut store = ws.store()?;

    // The batch must exist before counts are attached to it
    store
        .find_batch(&session.username, args.id)
        .map_err(|e| miette::miette!("{}", e))?
        .ok_or_else(|| miette::miette!("{}", BatchError::NotFound(args.id)))?;

    let mut sheet = store
        .read_cell_counts(&session.username, args.id)
        .map_err(|e| miette::miette!("{}", e))?;

    if !args.set.is_empty() {
        for (phase, column, value) in &args.set {
            sheet
                .set(phase, column, value)
                .map_err(|e| miette::miette!("{}", e))?;
        }
        store
            .write_cell_counts(&session.username, args.id, &sheet)
            .map_err(|e| miette::miette!("{}", e))?;
        eprintln!(
            "{} Saved {} cell count(s) for batch {}",
            style("✓").green(),
            args.set.len(),
            args.id
        );
    }

    print_counts(&sheet, global.output)
}

fn print_counts(sheet: &CellCountSheet, output: OutputFormat) -> Result<()> {
    let format = effective_format(output, true);
    if print_structured(sheet, format)? {
        return Ok(());
    }
    if sheet.is_empty() {
        println!("No cell counts recorded.");
        return Ok(());
    }

    let used = sheet.used_columns();
    let mut table = TextTable::new(std::iter::once("PHASE".to_string()).chain(used.iter().cloned()));
    for phase in PHASES {
        let row = std::iter::once(phase.to_string()).chain(
            used.iter()
                .map(|c| sheet.get(phase, c).unwrap_or_default().to_string()),
        );
        table.push(row);
    }
    table.print(format)
}
