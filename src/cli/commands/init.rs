//! `difftrack init` command - create a project

use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;

use crate::core::config::Config;
use crate::core::project::Project;
use crate::core::store::open_store;
use crate::report::default_protocol;
use crate::yaml::write_yaml_file;

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Re-initialize an existing project (keeps existing data and protocol)
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let cwd = std::env::current_dir().into_diagnostic()?;
    let project = Project::init_with(&cwd, args.force).map_err(|e| miette::miette!("{}", e))?;

    if !project.config_path().exists() {
        write_yaml_file(&project.config_path(), &Config::default())
            .map_err(|e| miette::miette!("{}", e))?;
    }
    let config = Config::load_for(Some(&project)).map_err(|e| miette::miette!("{}", e))?;

    let protocol_path = config.protocol_path(&project);
    if !protocol_path.exists() {
        let content = default_protocol().map_err(|e| miette::miette!("{}", e))?;
        fs::write(&protocol_path, content).into_diagnostic()?;
    }

    // Opening the store creates the data directory
    open_store(&config, &project).map_err(|e| miette::miette!("{}", e))?;

    println!(
        "{} Initialized difftrack project in {}",
        style("✓").green(),
        style(project.root().display()).cyan()
    );
    println!("  config:   {}", project.config_path().display());
    println!("  protocol: {}", protocol_path.display());
    println!("  data:     {}", config.data_path(&project).display());
    println!();
    println!(
        "Next: {} and {}",
        style("difftrack account new").yellow(),
        style("difftrack account login").yellow()
    );
    Ok(())
}
