use clap::Parser;
use difftrack::cli::commands::{
    account, batch, calendar, completions, config, images, init, protocol, tasks,
};
use difftrack::cli::{Cli, Commands};
use miette::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_tracing(cli.global.verbose, cli.global.quiet)?;

    let global = &cli.global;
    match cli.command {
        Commands::Init(args) => init::run(args),
        Commands::Account(cmd) => account::run(cmd, global),
        Commands::Batch(cmd) => batch::run(cmd, global),
        Commands::Calendar(args) => calendar::run(args, global),
        Commands::Tasks(args) => tasks::run(args, global),
        Commands::Protocol(cmd) => protocol::run(cmd, global),
        Commands::Images(args) => images::run(args, global),
        Commands::Config(cmd) => config::run(cmd, global),
        Commands::Completions(args) => completions::run(args),
    }
}

fn init_tracing(verbose: bool, quiet: bool) -> Result<()> {
    let level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_env("DIFFTRACK_LOG").unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| miette::miette!("failed to initialize logging: {}", e))
}
