mod cli;
mod commands;
mod config;
mod logging;
mod output;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands, OutputFormat, SessionsCommands};
use commands::sessions::SessionContext;
use output::print_error;

/// Exit status of `check` when the route is denied.
const EXIT_DENIED: i32 = 2;

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(EXIT_DENIED),
        Err(e) => {
            print_error(&format!("{e:#}"));
            std::process::exit(1);
        }
    }
}

/// Runs the command. `Ok(false)` means a check was denied.
fn run() -> Result<bool> {
    let cli = Cli::parse();
    logging::init_tracing(&cli.log_level);
    let format = cli.format.unwrap_or_default();

    match &cli.command {
        Commands::Roles => commands::policy::roles(format)?,
        Commands::Resolve(args) => commands::policy::resolve_role(args.role, format)?,
        Commands::Check(args) => return commands::policy::check(args.role, &args.path, format),
        Commands::Config => {
            let path = config::config_path(cli.config.as_deref())?;
            let cfg = config::load(&path)?;
            match format {
                OutputFormat::Json => output::print_json(&cfg)?,
                OutputFormat::Table => {
                    let state = if path.exists() { "" } else { " (not found, using defaults)" };
                    println!("{}: {}{}", "Config".cyan(), path.display(), state);
                    print!("{}", cfg.to_toml_string()?);
                }
            }
        }
        Commands::Sessions(args) => {
            let path = config::config_path(cli.config.as_deref())?;
            let cfg = config::load(&path)?;
            let ctx = SessionContext::open(&cfg)?;
            tracing::debug!(config = %path.display(), "Session store opened");

            match &args.command {
                SessionsCommands::List => commands::sessions::list(&ctx, format)?,
                SessionsCommands::Show(show) => commands::sessions::show(&ctx, &show.id, format)?,
                SessionsCommands::Put(put) => commands::sessions::put(&ctx, put, format)?,
                SessionsCommands::Clear(clear) => commands::sessions::clear(&ctx, clear)?,
            }
        }
    }

    Ok(true)
}
