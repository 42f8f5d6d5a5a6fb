//! `difftrack account` command - accounts and login session

use clap::Subcommand;
use console::style;
use dialoguer::{theme::ColorfulTheme, Input, Password};
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::utils::Workspace;
use crate::cli::output::print_structured;
use crate::cli::GlobalOpts;
use crate::core::session::{create_account, login, Session};

#[derive(Subcommand, Debug)]
pub enum AccountCommands {
    /// Create an account
    New(CredentialArgs),

    /// Log in as an existing account
    Login(CredentialArgs),

    /// End the current session
    Logout,

    /// Show the logged-in user
    Whoami,
}

#[derive(clap::Args, Debug)]
pub struct CredentialArgs {
    /// Username (prompted when omitted)
    pub username: Option<String>,

    /// Password (prompted when omitted)
    #[arg(long, short = 'p', env = "DIFFTRACK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

pub fn run(cmd: AccountCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        AccountCommands::New(args) => run_new(args),
        AccountCommands::Login(args) => run_login(args),
        AccountCommands::Logout => run_logout(),
        AccountCommands::Whoami => run_whoami(global),
    }
}

fn prompt_credentials(args: CredentialArgs, confirm: bool) -> Result<(String, String)> {
    let theme = ColorfulTheme::default();

    let username = match args.username {
        Some(u) => u,
        None => Input::<String>::with_theme(&theme)
            .with_prompt("Username")
            .interact_text()
            .into_diagnostic()?,
    };

    let password = match args.password {
        Some(p) => p,
        None => {
            let prompt = Password::with_theme(&theme).with_prompt("Password");
            let prompt = if confirm {
                prompt.with_confirmation("Confirm password", "Passwords do not match")
            } else {
                prompt
            };
            prompt.interact().into_diagnostic()?
        }
    };

    Ok((username, password))
}

fn run_new(args: CredentialArgs) -> Result<()> {
    let ws = Workspace::open()?;
    let mut store = ws.store()?;
    let (username, password) = prompt_credentials(args, true)?;

    let account = create_account(store.as_mut(), &username, &password)
        .map_err(|e| miette::miette!("{}", e))?;

    println!(
        "{} Created account {}",
        style("✓").green(),
        style(&account.username).cyan()
    );
    Ok(())
}

fn run_login(args: CredentialArgs) -> Result<()> {
    let ws = Workspace::open()?;
    let store = ws.store()?;
    let (username, password) = prompt_credentials(args, false)?;

    let session = login(store.as_ref(), &username, &password).map_err(|e| miette::miette!("{}", e))?;
    session
        .save(&ws.project)
        .map_err(|e| miette::miette!("{}", e))?;

    println!(
        "{} Logged in as {}",
        style("✓").green(),
        style(&session.username).cyan()
    );
    Ok(())
}

fn run_logout() -> Result<()> {
    let ws = Workspace::open()?;
    let had_session = Session::clear(&ws.project).map_err(|e| miette::miette!("{}", e))?;
    if had_session {
        println!("{} Logged out", style("✓").green());
    } else {
        println!("Not logged in.");
    }
    Ok(())
}

fn run_whoami(global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open()?;
    let session = ws.session()?;

    if !print_structured(&session, global.output)? {
        println!("{}", session.username);
    }
    Ok(())
}
