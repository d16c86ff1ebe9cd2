//! Command-line interface for havenbook.
//!
//! This module provides the CLI structure and command handlers for the
//! `haven` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    parse_email, parse_phone, ConfigCommand, ContactCommand, DuressCommand, GroupCommand,
    RelationshipCommand, ShareCommand, StatusArg, TabArg,
};

/// haven - A personal contact vault with a duress-mode gate
///
/// Stores contacts, groups, and relationships in a local database. A
/// PIN-guarded duress mode hides everything not explicitly marked safe,
/// and share links grant scoped read access to single records.
#[derive(Debug, Parser)]
#[command(name = "haven")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Account to operate on
    #[arg(short, long, global = true, env = "HAVENBOOK_ACCOUNT", default_value = "default")]
    pub account: String,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage contacts
    #[command(subcommand)]
    Contact(ContactCommand),

    /// Manage groups
    #[command(subcommand)]
    Group(GroupCommand),

    /// Manage relationship categories
    #[command(subcommand)]
    Relationship(RelationshipCommand),

    /// Control duress mode
    #[command(subcommand)]
    Duress(DuressCommand),

    /// Issue and manage share links
    #[command(subcommand)]
    Share(ShareCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Delete every record the account owns
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "haven");
    }

    #[test]
    fn test_cli_verify() {
        // Verify the CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_quiet() {
        let cli = Cli::try_parse_from(["haven", "-q", "duress", "status"]).unwrap();
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Quiet);
    }

    #[test]
    fn test_verbosity_levels() {
        let cli = Cli::try_parse_from(["haven", "duress", "status"]).unwrap();
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Normal);

        let cli = Cli::try_parse_from(["haven", "-v", "duress", "status"]).unwrap();
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Verbose);

        let cli = Cli::try_parse_from(["haven", "-vv", "duress", "status"]).unwrap();
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Trace);
    }

    #[test]
    fn test_parse_contact_add() {
        let cli = Cli::try_parse_from([
            "haven", "contact", "add", "Alice", "Nguyen", "--phone", "Work:+1 555 0100",
            "--safe",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Contact(ContactCommand::Add { .. })
        ));
    }

    #[test]
    fn test_parse_contact_list_with_tab() {
        let cli =
            Cli::try_parse_from(["haven", "contact", "list", "--tab", "favorites"]).unwrap();
        match cli.command {
            Command::Contact(ContactCommand::List { tab, .. }) => {
                assert_eq!(tab, TabArg::Favorites);
            }
            _ => panic!("expected contact list"),
        }
    }

    #[test]
    fn test_parse_duress_on_with_pin() {
        let cli = Cli::try_parse_from(["haven", "duress", "on", "--pin", "123456"]).unwrap();
        match cli.command {
            Command::Duress(DuressCommand::On { pin }) => {
                assert_eq!(pin.as_deref(), Some("123456"));
            }
            _ => panic!("expected duress on"),
        }
    }

    #[test]
    fn test_parse_share_contact_with_expiry() {
        let cli = Cli::try_parse_from([
            "haven", "share", "contact", "42", "--expires-days", "7",
        ])
        .unwrap();
        match cli.command {
            Command::Share(ShareCommand::Contact { id, expires_days }) => {
                assert_eq!(id, 42);
                assert_eq!(expires_days, Some(7));
            }
            _ => panic!("expected share contact"),
        }
    }

    #[test]
    fn test_parse_with_account() {
        let cli = Cli::try_parse_from(["haven", "-a", "alice", "group", "list"]).unwrap();
        assert_eq!(cli.account, "alice");
    }

    #[test]
    fn test_account_defaults() {
        let cli = Cli::try_parse_from(["haven", "group", "list"]).unwrap();
        assert_eq!(cli.account, "default");
    }

    #[test]
    fn test_parse_with_config() {
        let cli =
            Cli::try_parse_from(["haven", "-c", "/custom/config.toml", "group", "list"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_reset_requires_subcommand_flag_shape() {
        let cli = Cli::try_parse_from(["haven", "reset", "--yes"]).unwrap();
        assert!(matches!(cli.command, Command::Reset { yes: true }));

        let cli = Cli::try_parse_from(["haven", "reset"]).unwrap();
        assert!(matches!(cli.command, Command::Reset { yes: false }));
    }
}
