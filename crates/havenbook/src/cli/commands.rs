//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::contact::{ContactStatus, Email, Phone};
use crate::store::ContactTab;

/// Contact management commands.
#[derive(Debug, Subcommand)]
pub enum ContactCommand {
    /// Add a contact
    Add {
        /// First name
        first_name: String,

        /// Last name
        #[arg(default_value = "")]
        last_name: String,

        /// Company
        #[arg(long)]
        company: Option<String>,

        /// Job title
        #[arg(long)]
        title: Option<String>,

        /// Phone number, optionally labelled as "Label:number" (repeatable)
        #[arg(long)]
        phone: Vec<String>,

        /// Email address, optionally labelled as "Label:address" (repeatable)
        #[arg(long)]
        email: Vec<String>,

        /// Postal address
        #[arg(long)]
        address: Option<String>,

        /// Free-text notes
        #[arg(long)]
        notes: Option<String>,

        /// Pin as a favorite
        #[arg(long)]
        favorite: bool,

        /// Keep visible while duress mode is active
        #[arg(long)]
        safe: bool,
    },

    /// List contacts
    List {
        /// Listing tab
        #[arg(short, long, value_enum, default_value = "all")]
        tab: TabArg,

        /// Substring search over name, company, and title
        #[arg(short, long)]
        search: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one contact
    Show {
        /// Contact ID
        id: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change a contact's pipeline status
    Status {
        /// Contact ID
        id: i64,

        /// New status
        #[arg(value_enum)]
        status: StatusArg,
    },

    /// Toggle a contact's favorite flag
    Favorite {
        /// Contact ID
        id: i64,
    },

    /// Mark or unmark a contact as duress-safe
    Safe {
        /// Contact ID
        id: i64,

        /// Remove the safe flag instead of setting it
        #[arg(long)]
        off: bool,
    },

    /// Delete a contact
    Remove {
        /// Contact ID
        id: i64,
    },

    /// Import contacts from a JSON file
    Import {
        /// Path to a JSON array of contacts
        file: PathBuf,
    },
}

/// Group management commands.
#[derive(Debug, Subcommand)]
pub enum GroupCommand {
    /// Create a group
    Create {
        /// Group name
        name: String,
    },

    /// List groups with member counts
    List,

    /// Delete a group (member contacts are kept)
    Remove {
        /// Group ID
        id: i64,
    },

    /// Add a contact to a group
    Add {
        /// Contact ID
        contact_id: i64,
        /// Group ID
        group_id: i64,
    },

    /// Remove a contact from a group
    RemoveMember {
        /// Contact ID
        contact_id: i64,
        /// Group ID
        group_id: i64,
    },
}

/// Relationship management commands.
#[derive(Debug, Subcommand)]
pub enum RelationshipCommand {
    /// Create a relationship category
    Create {
        /// Relationship name
        name: String,
    },

    /// List relationships with member counts
    List,

    /// Delete a relationship (member contacts are kept)
    Remove {
        /// Relationship ID
        id: i64,
    },

    /// Link a contact to a relationship
    Link {
        /// Contact ID
        contact_id: i64,
        /// Relationship ID
        relationship_id: i64,
    },

    /// Unlink a contact from a relationship
    Unlink {
        /// Contact ID
        contact_id: i64,
        /// Relationship ID
        relationship_id: i64,
    },
}

/// Duress-mode commands.
#[derive(Debug, Subcommand)]
pub enum DuressCommand {
    /// Show the current duress-mode state
    Status,

    /// Turn duress mode on
    On {
        /// Set this PIN together with enabling (required if none is stored)
        #[arg(long)]
        pin: Option<String>,
    },

    /// Turn duress mode off
    Off,

    /// Set or replace the duress PIN
    SetPin {
        /// Six-decimal-digit PIN
        pin: String,
    },
}

/// Share-link commands.
#[derive(Debug, Subcommand)]
pub enum ShareCommand {
    /// Issue a share link for a contact
    Contact {
        /// Contact ID
        id: i64,

        /// Days until the link expires (defaults to the configured value)
        #[arg(long)]
        expires_days: Option<i64>,
    },

    /// Issue a share link for a group
    Group {
        /// Group ID
        id: i64,

        /// Days until the link expires (defaults to the configured value)
        #[arg(long)]
        expires_days: Option<i64>,
    },

    /// Resolve a share token
    Resolve {
        /// The token to resolve
        token: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Revoke a share link
    Revoke {
        /// The token to revoke
        token: String,
    },

    /// List issued share links
    List,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Listing tab argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TabArg {
    /// Every contact
    #[default]
    All,
    /// Favorites only
    Favorites,
    /// Contacts with status `new`
    New,
    /// Contacts with status `qualified`
    Qualified,
    /// Contacts with status `contacted`
    Contacted,
}

impl From<TabArg> for ContactTab {
    fn from(arg: TabArg) -> Self {
        match arg {
            TabArg::All => Self::All,
            TabArg::Favorites => Self::Favorites,
            TabArg::New => Self::Status(ContactStatus::New),
            TabArg::Qualified => Self::Status(ContactStatus::Qualified),
            TabArg::Contacted => Self::Status(ContactStatus::Contacted),
        }
    }
}

/// Pipeline status argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    /// Newly added
    New,
    /// Qualified
    Qualified,
    /// Already contacted
    Contacted,
}

impl From<StatusArg> for ContactStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::New => Self::New,
            StatusArg::Qualified => Self::Qualified,
            StatusArg::Contacted => Self::Contacted,
        }
    }
}

/// Parse a `--phone` argument of the form `number` or `Label:number`.
#[must_use]
pub fn parse_phone(value: &str) -> Phone {
    match value.split_once(':') {
        Some((label, number)) if !label.is_empty() => Phone {
            label: label.to_string(),
            number: number.to_string(),
        },
        _ => Phone {
            label: "Mobile".to_string(),
            number: value.to_string(),
        },
    }
}

/// Parse an `--email` argument of the form `address` or `Label:address`.
#[must_use]
pub fn parse_email(value: &str) -> Email {
    match value.split_once(':') {
        Some((label, address)) if !label.is_empty() => Email {
            label: label.to_string(),
            address: address.to_string(),
        },
        _ => Email {
            label: "Personal".to_string(),
            address: value.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_arg_conversion() {
        assert_eq!(ContactTab::from(TabArg::All), ContactTab::All);
        assert_eq!(ContactTab::from(TabArg::Favorites), ContactTab::Favorites);
        assert_eq!(
            ContactTab::from(TabArg::Qualified),
            ContactTab::Status(ContactStatus::Qualified)
        );
    }

    #[test]
    fn test_status_arg_conversion() {
        assert_eq!(ContactStatus::from(StatusArg::New), ContactStatus::New);
        assert_eq!(
            ContactStatus::from(StatusArg::Contacted),
            ContactStatus::Contacted
        );
    }

    #[test]
    fn test_parse_phone_plain() {
        let phone = parse_phone("+1 555 0100");
        assert_eq!(phone.label, "Mobile");
        assert_eq!(phone.number, "+1 555 0100");
    }

    #[test]
    fn test_parse_phone_labelled() {
        let phone = parse_phone("Work:+1 555 0200");
        assert_eq!(phone.label, "Work");
        assert_eq!(phone.number, "+1 555 0200");
    }

    #[test]
    fn test_parse_email_labelled_and_plain() {
        let email = parse_email("Work:a@example.com");
        assert_eq!(email.label, "Work");
        assert_eq!(email.address, "a@example.com");

        let email = parse_email("a@example.com");
        assert_eq!(email.label, "Personal");
    }

    #[test]
    fn test_parse_with_leading_colon_falls_back() {
        let phone = parse_phone(":12345");
        assert_eq!(phone.label, "Mobile");
        assert_eq!(phone.number, ":12345");
    }

    #[test]
    fn test_tab_arg_default() {
        assert_eq!(TabArg::default(), TabArg::All);
    }

    #[test]
    fn test_duress_command_debug() {
        let cmd = DuressCommand::On {
            pin: Some("123456".to_string()),
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("On"));
    }
}
