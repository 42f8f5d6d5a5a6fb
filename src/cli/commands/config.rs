//! `difftrack config` command - effective configuration

use clap::Subcommand;
use miette::Result;

use crate::cli::output::{effective_format, print_structured};
use crate::cli::table::TextTable;
use crate::cli::GlobalOpts;
use crate::core::config::Config;
use crate::core::project::Project;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the merged configuration
    Show,

    /// Print the config file locations, lowest precedence first
    Path,
}

pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show => run_show(global),
        ConfigCommands::Path => run_path(),
    }
}

fn run_show(global: &GlobalOpts) -> Result<()> {
    let config = Config::load().map_err(|e| miette::miette!("{}", e))?;
    let format = effective_format(global.output, false);
    if print_structured(&config, format)? {
        return Ok(());
    }

    let mut table = TextTable::new(["KEY", "VALUE"]);
    table.push(["store".to_string(), config.store.to_string()]);
    table.push(["data_dir".to_string(), config.data_dir.display().to_string()]);
    table.push(["protocol".to_string(), config.protocol.display().to_string()]);
    table.push(["calendar_days".to_string(), config.calendar_days.to_string()]);
    table.push(["ml_per_plate".to_string(), config.ml_per_plate.to_string()]);
    table.push(["image_prefix".to_string(), config.image_prefix.clone()]);
    table.print(format)
}

fn run_path() -> Result<()> {
    match Config::user_config_path() {
        Some(path) => println!("user:    {}", path.display()),
        None => println!("user:    (no home directory)"),
    }
    match Project::discover() {
        Ok(project) => println!("project: {}", project.config_path().display()),
        Err(_) => println!("project: (not in a difftrack project)"),
    }
    Ok(())
}
