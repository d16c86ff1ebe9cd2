//! `haven` - CLI for havenbook
//!
//! This binary provides the command-line interface for managing contacts,
//! duress mode, and share links in a havenbook directory.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use clap::Parser;

use havenbook::cli::{
    parse_email, parse_phone, Cli, Command, ConfigCommand, ContactCommand, DuressCommand,
    GroupCommand, RelationshipCommand, ShareCommand,
};
use havenbook::contact::ContactPatch;
use havenbook::share::{ResourceRef, ResourceSnapshot};
use havenbook::{init_logging, Config, ContactRecord, Directory, ImportedContact};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::load_from(path.clone())?,
        None => Config::load()?,
    };

    // Config commands don't need an open database
    let command = match cli.command {
        Command::Config(config_cmd) => return handle_config(&config, config_cmd),
        other => other,
    };

    let directory = Directory::open(&config)?;
    let account = cli.account.as_str();

    match command {
        Command::Contact(cmd) => handle_contact(&directory, account, cmd),
        Command::Group(cmd) => handle_group(&directory, account, &cmd),
        Command::Relationship(cmd) => handle_relationship(&directory, account, &cmd),
        Command::Duress(cmd) => handle_duress(&directory, account, cmd),
        Command::Share(cmd) => handle_share(&directory, account, cmd),
        Command::Reset { yes } => handle_reset(&directory, account, yes),
        Command::Config(_) => Ok(()),
    }
}

fn handle_contact(
    directory: &Directory,
    account: &str,
    cmd: ContactCommand,
) -> anyhow::Result<()> {
    match cmd {
        ContactCommand::Add {
            first_name,
            last_name,
            company,
            title,
            phone,
            email,
            address,
            notes,
            favorite,
            safe,
        } => {
            let mut contact = ContactRecord::new(first_name, last_name);
            contact.company = company;
            contact.job_title = title;
            contact.phones = phone.iter().map(|p| parse_phone(p)).collect();
            contact.emails = email.iter().map(|e| parse_email(e)).collect();
            contact.address = address;
            contact.notes = notes;
            contact.is_favorite = favorite;
            contact.is_emergency_safe = safe;

            let created = directory.create_contact(account, contact)?;
            println!(
                "Added contact #{}: {}",
                created.id.unwrap_or_default(),
                created.full_name()
            );
        }
        ContactCommand::List { tab, search, json } => {
            let page = directory.list_contacts(account, tab.into(), search.as_deref())?;
            if json {
                let contacts: Vec<_> = page.contacts.iter().map(|v| &v.contact).collect();
                println!("{}", serde_json::to_string_pretty(&contacts)?);
            } else {
                println!(
                    "Contacts: {} total, {} favorites ({} new / {} qualified / {} contacted)",
                    page.counts.all,
                    page.counts.favorites,
                    page.counts.new,
                    page.counts.qualified,
                    page.counts.contacted
                );
                println!();
                for view in &page.contacts {
                    let markers = format!(
                        "{}{}",
                        if view.contact.is_favorite { "*" } else { "" },
                        if view.contact.is_emergency_safe { "+" } else { "" },
                    );
                    let relationships = if view.relationships.is_empty() {
                        String::new()
                    } else {
                        format!("  [{}]", view.relationships.join(", "))
                    };
                    let status = view.contact.status.to_string();
                    println!(
                        "#{:<6} {:<30} {status:<12} {markers}{relationships}",
                        view.contact.id.unwrap_or_default(),
                        view.contact.full_name(),
                    );
                }
            }
        }
        ContactCommand::Show { id, json } => match directory.get_contact(account, id)? {
            Some(contact) => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&contact)?);
                } else {
                    print_contact(&contact);
                }
            }
            None => println!("Contact #{id} not found."),
        },
        ContactCommand::Status { id, status } => {
            let patch = ContactPatch {
                status: Some(status.into()),
                ..Default::default()
            };
            if directory.update_contact(account, id, &patch)? {
                println!("Contact #{id} updated.");
            } else {
                println!("Contact #{id} not found.");
            }
        }
        ContactCommand::Favorite { id } => match directory.toggle_favorite(account, id)? {
            Some(true) => println!("Contact #{id} marked as favorite."),
            Some(false) => println!("Contact #{id} unmarked as favorite."),
            None => println!("Contact #{id} not found."),
        },
        ContactCommand::Safe { id, off } => {
            if directory.set_emergency_safe(account, id, !off)? {
                if off {
                    println!("Contact #{id} will be hidden while duress mode is active.");
                } else {
                    println!("Contact #{id} will stay visible while duress mode is active.");
                }
            } else {
                println!("Contact #{id} not found.");
            }
        }
        ContactCommand::Remove { id } => {
            if directory.delete_contact(account, id)? {
                println!("Contact #{id} deleted.");
            } else {
                println!("Contact #{id} not found.");
            }
        }
        ContactCommand::Import { file } => {
            let text = std::fs::read_to_string(&file)?;
            let batch: Vec<ImportedContact> = serde_json::from_str(&text)?;
            let imported = directory.bulk_import(account, batch)?;
            println!("Imported {imported} contacts from {}.", file.display());
        }
    }
    Ok(())
}

fn handle_group(
    directory: &Directory,
    account: &str,
    cmd: &GroupCommand,
) -> anyhow::Result<()> {
    match cmd {
        GroupCommand::Create { name } => {
            let group = directory.create_group(account, name)?;
            println!("Created group #{}: {}", group.id.unwrap_or_default(), group.name);
        }
        GroupCommand::List => {
            let views = directory.list_groups(account)?;
            if views.is_empty() {
                println!("No groups.");
            }
            for view in views {
                println!(
                    "#{:<6} {:<30} {} members",
                    view.group.id.unwrap_or_default(),
                    view.group.name,
                    view.member_count
                );
            }
        }
        GroupCommand::Remove { id } => {
            if directory.delete_group(account, *id)? {
                println!("Group #{id} deleted. Member contacts were kept.");
            } else {
                println!("Group #{id} not found.");
            }
        }
        GroupCommand::Add {
            contact_id,
            group_id,
        } => {
            directory.add_to_group(account, *contact_id, *group_id)?;
            println!("Added contact #{contact_id} to group #{group_id}.");
        }
        GroupCommand::RemoveMember {
            contact_id,
            group_id,
        } => {
            if directory.remove_from_group(account, *contact_id, *group_id)? {
                println!("Removed contact #{contact_id} from group #{group_id}.");
            } else {
                println!("Contact #{contact_id} is not in group #{group_id}.");
            }
        }
    }
    Ok(())
}

fn handle_relationship(
    directory: &Directory,
    account: &str,
    cmd: &RelationshipCommand,
) -> anyhow::Result<()> {
    match cmd {
        RelationshipCommand::Create { name } => {
            let relationship = directory.create_relationship(account, name)?;
            println!(
                "Created relationship #{}: {}",
                relationship.id.unwrap_or_default(),
                relationship.name
            );
        }
        RelationshipCommand::List => {
            let views = directory.list_relationships(account)?;
            if views.is_empty() {
                println!("No relationships.");
            }
            for view in views {
                println!(
                    "#{:<6} {:<30} {} members",
                    view.relationship.id.unwrap_or_default(),
                    view.relationship.name,
                    view.member_count
                );
            }
        }
        RelationshipCommand::Remove { id } => {
            if directory.delete_relationship(account, *id)? {
                println!("Relationship #{id} deleted. Member contacts were kept.");
            } else {
                println!("Relationship #{id} not found.");
            }
        }
        RelationshipCommand::Link {
            contact_id,
            relationship_id,
        } => {
            directory.link_relationship(account, *contact_id, *relationship_id)?;
            println!("Linked contact #{contact_id} to relationship #{relationship_id}.");
        }
        RelationshipCommand::Unlink {
            contact_id,
            relationship_id,
        } => {
            if directory.unlink_relationship(account, *contact_id, *relationship_id)? {
                println!("Unlinked contact #{contact_id} from relationship #{relationship_id}.");
            } else {
                println!("Contact #{contact_id} is not linked to relationship #{relationship_id}.");
            }
        }
    }
    Ok(())
}

fn handle_duress(
    directory: &Directory,
    account: &str,
    cmd: DuressCommand,
) -> anyhow::Result<()> {
    let modes = directory.access_mode();
    match cmd {
        DuressCommand::Status => {
            let settings = modes.get(account)?;
            println!(
                "Duress mode: {}",
                if settings.enabled { "ACTIVE" } else { "off" }
            );
            println!("PIN set:     {}", if settings.has_pin { "yes" } else { "no" });
        }
        DuressCommand::On { pin } => {
            let settings = match pin {
                Some(pin) => modes.enable_with_pin(account, &pin)?,
                None => modes.set_enabled(account, true)?,
            };
            if settings.enabled {
                println!("Duress mode is active. Only safe contacts are visible.");
            }
        }
        DuressCommand::Off => {
            modes.set_enabled(account, false)?;
            println!("Duress mode is off.");
        }
        DuressCommand::SetPin { pin } => {
            modes.set_pin(account, &pin)?;
            println!("PIN updated.");
        }
    }
    Ok(())
}

fn handle_share(
    directory: &Directory,
    account: &str,
    cmd: ShareCommand,
) -> anyhow::Result<()> {
    let shares = directory.shares();
    match cmd {
        ShareCommand::Contact { id, expires_days } => {
            let expiry = expires_days.or_else(|| directory.default_expiry_days());
            let link = shares.issue(account, ResourceRef::Contact(id), expiry)?;
            print_issued_link(&link.token, link.expires_at);
        }
        ShareCommand::Group { id, expires_days } => {
            let expiry = expires_days.or_else(|| directory.default_expiry_days());
            let link = shares.issue(account, ResourceRef::Group(id), expiry)?;
            print_issued_link(&link.token, link.expires_at);
        }
        ShareCommand::Resolve { token, json } => match shares.resolve(&token)? {
            ResourceSnapshot::Contact(contact) => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&contact)?);
                } else {
                    print_contact(&contact);
                }
            }
            ResourceSnapshot::Group { group, members } => {
                if json {
                    let out = serde_json::json!({
                        "group": group,
                        "members": members,
                    });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                } else {
                    println!("Group: {} ({} members)", group.name, members.len());
                    for member in &members {
                        println!("  {}", member.full_name());
                    }
                }
            }
        },
        ShareCommand::Revoke { token } => {
            shares.revoke(account, &token)?;
            println!("Link revoked.");
        }
        ShareCommand::List => {
            let links = shares.list(account)?;
            if links.is_empty() {
                println!("No share links.");
            }
            for link in links {
                let expiry = link.expires_at.map_or_else(
                    || "never expires".to_string(),
                    |at| format!("expires {}", at.format("%Y-%m-%d %H:%M UTC")),
                );
                println!(
                    "{}  {} #{}  {}",
                    link.token, link.resource_type, link.resource_id, expiry
                );
            }
        }
    }
    Ok(())
}

fn handle_reset(
    directory: &Directory,
    account: &str,
    yes: bool,
) -> anyhow::Result<()> {
    if !yes {
        println!("This will delete every contact, group, relationship, and share link");
        println!("for account '{account}'. Duress settings are kept.");
        println!("Use --yes to confirm.");
        return Ok(());
    }

    directory.reset_all_data(account)?;
    println!("All data for account '{account}' has been deleted.");
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:  {}", config.storage.database_path.display());
                println!();
                println!("[Sharing]");
                println!("  Token length:   {}", config.sharing.token_length);
                println!("  Permission:     {}", config.sharing.default_permission);
                println!(
                    "  Default expiry: {}",
                    config
                        .sharing
                        .default_expiry_days
                        .map_or_else(|| "never".to_string(), |d| format!("{d} days"))
                );
                println!();
                println!("[Import]");
                println!("  Max batch:      {}", config.import.max_batch);
            }
        }
        ConfigCommand::Path => {
            println!("{}", havenbook::config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(havenbook::config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(path) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn print_contact(contact: &ContactRecord) {
    println!("#{} {}", contact.id.unwrap_or_default(), contact.full_name());
    if let Some(company) = &contact.company {
        println!("  Company:  {company}");
    }
    if let Some(title) = &contact.job_title {
        println!("  Title:    {title}");
    }
    for phone in &contact.phones {
        println!("  Phone:    {} ({})", phone.number, phone.label);
    }
    for email in &contact.emails {
        println!("  Email:    {} ({})", email.address, email.label);
    }
    if let Some(address) = &contact.address {
        println!("  Address:  {address}");
    }
    println!("  Status:   {}", contact.status);
    println!("  Favorite: {}", if contact.is_favorite { "yes" } else { "no" });
    println!(
        "  Safe:     {}",
        if contact.is_emergency_safe { "yes" } else { "no" }
    );
    if let Some(notes) = &contact.notes {
        println!("  Notes:    {notes}");
    }
    println!("  Added:    {}", contact.created_at.format("%Y-%m-%d"));
}

fn print_issued_link(token: &str, expires_at: Option<chrono::DateTime<chrono::Utc>>) {
    println!("Share token: {token}");
    match expires_at {
        Some(at) => println!("Expires:     {}", at.format("%Y-%m-%d %H:%M UTC")),
        None => println!("Expires:     never"),
    }
}
