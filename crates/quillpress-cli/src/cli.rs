use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use quillpress_auth::Role;

#[derive(Parser)]
#[command(name = "quillpress")]
#[command(about = "Quillpress authorization tool: inspect role policy and cached sessions")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the authorization config (defaults to ~/.quillpress/authz.toml)
    #[arg(short, long, global = true, env = "QUILLPRESS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List every role with its landing route and grants
    Roles,
    /// Show the permission set resolved for a role
    Resolve(ResolveArgs),
    /// Check whether a role may open a route
    Check(CheckArgs),
    /// Inspect and manage cached sessions
    Sessions(SessionsArgs),
    /// Show the effective configuration
    Config,
}

#[derive(clap::Args)]
pub struct ResolveArgs {
    /// Role name (guest, user, writer, admin)
    pub role: Role,
}

#[derive(clap::Args)]
pub struct CheckArgs {
    /// Role name (guest, user, writer, admin)
    pub role: Role,
    /// Normalized route path (e.g. /article/edit/42)
    pub path: String,
}

#[derive(clap::Args)]
pub struct SessionsArgs {
    #[command(subcommand)]
    pub command: SessionsCommands,
}

#[derive(Subcommand)]
pub enum SessionsCommands {
    /// List fresh persisted sessions
    List,
    /// Show one session
    Show(SessionIdArgs),
    /// Cache a session for an identity
    Put(PutArgs),
    /// Clear one session, or all of them with --all
    Clear(ClearArgs),
}

#[derive(clap::Args)]
pub struct SessionIdArgs {
    /// Identity id
    pub id: String,
}

#[derive(clap::Args)]
pub struct PutArgs {
    /// Identity id
    pub id: String,
    /// Email address
    #[arg(long)]
    pub email: String,
    /// Role name
    #[arg(long, default_value = "guest")]
    pub role: Role,
    /// Display name (defaults to the local part of the email)
    #[arg(long)]
    pub display_name: Option<String>,
    /// Mark the email as verified
    #[arg(long)]
    pub verified: bool,
}

#[derive(clap::Args)]
pub struct ClearArgs {
    /// Identity id
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub id: Option<String>,
    /// Clear every session in the namespace
    #[arg(long)]
    pub all: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from(["quillpress", "check", "Writer", "/drafts"]).unwrap();
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.role, Role::Writer);
                assert_eq!(args.path, "/drafts");
            }
            _ => panic!("expected check"),
        }
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!(Cli::try_parse_from(["quillpress", "resolve", "owner"]).is_err());
    }

    #[test]
    fn test_clear_requires_id_or_all() {
        assert!(Cli::try_parse_from(["quillpress", "sessions", "clear"]).is_err());
        assert!(Cli::try_parse_from(["quillpress", "sessions", "clear", "--all"]).is_ok());
        assert!(Cli::try_parse_from(["quillpress", "sessions", "clear", "u1", "--all"]).is_err());
    }
}
