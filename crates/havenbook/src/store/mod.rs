//! Record gateway for havenbook.
//!
//! This module provides `SQLite`-based persistent storage for contacts,
//! groups, relationships, duress settings, and share links. The gateway
//! knows nothing about duress semantics: callers narrow queries with a
//! [`crate::duress::SafeSetFilter`] before they reach this layer.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::contact::{
    ContactPatch, ContactRecord, ContactStatus, GroupRecord, RelationshipRecord,
};
use crate::error::{Error, Result};
use crate::share::ShareLink;

/// A parametrized contact listing request.
///
/// The gateway applies exactly the predicates present here; it never adds
/// any of its own. In particular `safe_only` is set by the duress filter,
/// not by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactQuery {
    /// Owning account.
    pub account: String,
    /// Restrict to contacts flagged emergency-safe.
    pub safe_only: bool,
    /// Status tab to restrict to.
    pub tab: ContactTab,
    /// Case-insensitive substring search over name, company, and title.
    pub search: Option<String>,
}

/// The listing tab a query is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContactTab {
    /// Every contact.
    #[default]
    All,
    /// Favorites only.
    Favorites,
    /// A single pipeline status.
    Status(ContactStatus),
}

impl ContactQuery {
    /// A query for every contact the account owns.
    #[must_use]
    pub fn for_account(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            safe_only: false,
            tab: ContactTab::All,
            search: None,
        }
    }

    /// Restrict the query to a listing tab.
    #[must_use]
    pub fn with_tab(mut self, tab: ContactTab) -> Self {
        self.tab = tab;
        self
    }

    /// Restrict the query to a substring search.
    #[must_use]
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }
}

/// Record gateway over a single `SQLite` database.
#[derive(Debug)]
pub struct Store {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

const CONTACT_COLUMNS: &str = "id, first_name, last_name, company, job_title, phones, emails, \
                               address, status, is_favorite, is_emergency_safe, notes, created_at";

impl Store {
    /// Open or create a store database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // Enable WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory store instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    // === Contacts ===

    /// Insert a contact for the given account, returning the assigned ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_contact(&self, account: &str, contact: &ContactRecord) -> Result<i64> {
        self.conn.execute(
            r"
            INSERT INTO contacts (account_id, first_name, last_name, company, job_title,
                                  phones, emails, address, status, is_favorite,
                                  is_emergency_safe, notes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ",
            params![
                account,
                contact.first_name,
                contact.last_name,
                contact.company,
                contact.job_title,
                serde_json::to_string(&contact.phones)?,
                serde_json::to_string(&contact.emails)?,
                contact.address,
                contact.status.to_string(),
                contact.is_favorite,
                contact.is_emergency_safe,
                contact.notes,
                contact.created_at.to_rfc3339(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted contact with id {}", id);
        Ok(id)
    }

    /// Insert a batch of contacts in one transaction, returning how many
    /// were inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails; in that case the whole batch
    /// is rolled back.
    pub fn bulk_insert_contacts(&self, account: &str, contacts: &[ContactRecord]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for contact in contacts {
            tx.execute(
                r"
                INSERT INTO contacts (account_id, first_name, last_name, company, job_title,
                                      phones, emails, address, status, is_favorite,
                                      is_emergency_safe, notes, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                ",
                params![
                    account,
                    contact.first_name,
                    contact.last_name,
                    contact.company,
                    contact.job_title,
                    serde_json::to_string(&contact.phones)?,
                    serde_json::to_string(&contact.emails)?,
                    contact.address,
                    contact.status.to_string(),
                    contact.is_favorite,
                    contact.is_emergency_safe,
                    contact.notes,
                    contact.created_at.to_rfc3339(),
                ],
            )?;
        }
        tx.commit()?;

        info!("Bulk-inserted {} contacts", contacts.len());
        Ok(contacts.len())
    }

    /// Get a contact by its ID, scoped to the owning account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_contact(&self, account: &str, id: i64) -> Result<Option<ContactRecord>> {
        let result = self
            .conn
            .query_row(
                &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?1 AND account_id = ?2"),
                params![id, account],
                Self::row_to_contact,
            )
            .optional()?;
        Ok(result)
    }

    /// List contacts matching the given query, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_contacts(&self, query: &ContactQuery) -> Result<Vec<ContactRecord>> {
        let mut sql = format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE account_id = ?1"
        );
        let mut values: Vec<Value> = vec![Value::from(query.account.clone())];

        if query.safe_only {
            sql.push_str(" AND is_emergency_safe = 1");
        }

        match query.tab {
            ContactTab::All => {}
            ContactTab::Favorites => sql.push_str(" AND is_favorite = 1"),
            ContactTab::Status(status) => {
                values.push(Value::from(status.to_string()));
                sql.push_str(&format!(" AND status = ?{}", values.len()));
            }
        }

        if let Some(term) = &query.search {
            let pattern = format!("%{term}%");
            let base = values.len();
            values.extend([
                Value::from(pattern.clone()),
                Value::from(pattern.clone()),
                Value::from(pattern.clone()),
                Value::from(pattern),
            ]);
            sql.push_str(&format!(
                " AND (first_name LIKE ?{} OR last_name LIKE ?{} OR company LIKE ?{} OR job_title LIKE ?{})",
                base + 1,
                base + 2,
                base + 3,
                base + 4
            ));
        }

        sql.push_str(" ORDER BY created_at DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let contacts = stmt
            .query_map(params_from_iter(values), Self::row_to_contact)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(contacts)
    }

    /// Get the (status, favorite) flags of the account's contacts, for
    /// count annotation. Honors the same safe-only predicate as listings.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn contact_flags(
        &self,
        account: &str,
        safe_only: bool,
    ) -> Result<Vec<(ContactStatus, bool)>> {
        let mut sql = "SELECT status, is_favorite FROM contacts WHERE account_id = ?1".to_string();
        if safe_only {
            sql.push_str(" AND is_emergency_safe = 1");
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let flags = stmt
            .query_map([account], |row| {
                let status: String = row.get(0)?;
                let favorite: bool = row.get(1)?;
                Ok((ContactStatus::parse(&status), favorite))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(flags)
    }

    /// Apply a partial update to a contact.
    ///
    /// Returns `true` if a contact was updated, `false` if the account owns
    /// no contact with that ID. An empty patch is a no-op returning whether
    /// the contact exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_contact(&self, account: &str, id: i64, patch: &ContactPatch) -> Result<bool> {
        if patch.is_empty() {
            return Ok(self.get_contact(account, id)?.is_some());
        }

        let mut sets: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        let mut push = |sets: &mut Vec<String>, column: &str, value: Value| {
            values.push(value);
            sets.push(format!("{column} = ?{}", values.len()));
        };

        if let Some(v) = &patch.first_name {
            push(&mut sets, "first_name", Value::from(v.clone()));
        }
        if let Some(v) = &patch.last_name {
            push(&mut sets, "last_name", Value::from(v.clone()));
        }
        if let Some(v) = &patch.company {
            push(&mut sets, "company", Value::from(v.clone()));
        }
        if let Some(v) = &patch.job_title {
            push(&mut sets, "job_title", Value::from(v.clone()));
        }
        if let Some(v) = &patch.phones {
            push(&mut sets, "phones", Value::from(serde_json::to_string(v)?));
        }
        if let Some(v) = &patch.emails {
            push(&mut sets, "emails", Value::from(serde_json::to_string(v)?));
        }
        if let Some(v) = &patch.address {
            push(&mut sets, "address", Value::from(v.clone()));
        }
        if let Some(v) = patch.status {
            push(&mut sets, "status", Value::from(v.to_string()));
        }
        if let Some(v) = patch.is_favorite {
            push(&mut sets, "is_favorite", Value::from(v));
        }
        if let Some(v) = patch.is_emergency_safe {
            push(&mut sets, "is_emergency_safe", Value::from(v));
        }
        if let Some(v) = &patch.notes {
            push(&mut sets, "notes", Value::from(v.clone()));
        }

        values.push(Value::from(id));
        let id_pos = values.len();
        values.push(Value::from(account.to_string()));
        let account_pos = values.len();

        let sql = format!(
            "UPDATE contacts SET {} WHERE id = ?{id_pos} AND account_id = ?{account_pos}",
            sets.join(", ")
        );

        let affected = self.conn.execute(&sql, params_from_iter(values))?;
        Ok(affected > 0)
    }

    /// Delete a contact and its membership rows.
    ///
    /// Returns `true` if a contact was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_contact(&self, account: &str, id: i64) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let affected = tx.execute(
            "DELETE FROM contacts WHERE id = ?1 AND account_id = ?2",
            params![id, account],
        )?;
        if affected > 0 {
            tx.execute(
                "DELETE FROM contact_groups WHERE contact_id = ?1",
                [id],
            )?;
            tx.execute(
                "DELETE FROM contact_relationships WHERE contact_id = ?1",
                [id],
            )?;
        }
        tx.commit()?;
        Ok(affected > 0)
    }

    // === Groups ===

    /// Create a group, returning the stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_group(&self, account: &str, name: &str) -> Result<GroupRecord> {
        self.conn.execute(
            "INSERT INTO groups (account_id, name) VALUES (?1, ?2)",
            params![account, name],
        )?;
        Ok(GroupRecord {
            id: Some(self.conn.last_insert_rowid()),
            name: name.to_string(),
        })
    }

    /// List the account's groups ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_groups(&self, account: &str) -> Result<Vec<GroupRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM groups WHERE account_id = ?1 ORDER BY name")?;
        let groups = stmt
            .query_map([account], |row| {
                Ok(GroupRecord {
                    id: Some(row.get(0)?),
                    name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(groups)
    }

    /// Get one group, scoped to the owning account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_group(&self, account: &str, id: i64) -> Result<Option<GroupRecord>> {
        let group = self
            .conn
            .query_row(
                "SELECT id, name FROM groups WHERE id = ?1 AND account_id = ?2",
                params![id, account],
                |row| {
                    Ok(GroupRecord {
                        id: Some(row.get(0)?),
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(group)
    }

    /// Delete a group and its membership rows. Member contacts are kept.
    ///
    /// Returns `true` if a group was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_group(&self, account: &str, id: i64) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let affected = tx.execute(
            "DELETE FROM groups WHERE id = ?1 AND account_id = ?2",
            params![id, account],
        )?;
        if affected > 0 {
            tx.execute("DELETE FROM contact_groups WHERE group_id = ?1", [id])?;
        }
        tx.commit()?;
        Ok(affected > 0)
    }

    /// Add a contact to a group. Both must belong to the account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotOwner`] if either side belongs to another
    /// account, or an error if the database operation fails.
    pub fn add_contact_to_group(&self, account: &str, contact_id: i64, group_id: i64) -> Result<()> {
        self.check_contact_owner(account, contact_id)?;
        if self.get_group(account, group_id)?.is_none() {
            return Err(Error::NotOwner);
        }
        self.conn.execute(
            "INSERT OR IGNORE INTO contact_groups (contact_id, group_id) VALUES (?1, ?2)",
            params![contact_id, group_id],
        )?;
        Ok(())
    }

    /// Remove a contact from a group.
    ///
    /// Returns `true` if a membership row was removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotOwner`] if the contact belongs to another
    /// account, or an error if the database operation fails.
    pub fn remove_contact_from_group(
        &self,
        account: &str,
        contact_id: i64,
        group_id: i64,
    ) -> Result<bool> {
        self.check_contact_owner(account, contact_id)?;
        let affected = self.conn.execute(
            "DELETE FROM contact_groups WHERE contact_id = ?1 AND group_id = ?2",
            params![contact_id, group_id],
        )?;
        Ok(affected > 0)
    }

    /// Get the emergency-safe flags of a group's members.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn group_member_flags(&self, account: &str, group_id: i64) -> Result<Vec<bool>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT c.is_emergency_safe
            FROM contact_groups cg
            JOIN contacts c ON c.id = cg.contact_id
            WHERE cg.group_id = ?1 AND c.account_id = ?2
            ",
        )?;
        let flags = stmt
            .query_map(params![group_id, account], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(flags)
    }

    /// Get a group's member contacts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn group_members(&self, account: &str, group_id: i64) -> Result<Vec<ContactRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            r"
            SELECT {CONTACT_COLUMNS_QUALIFIED}
            FROM contact_groups cg
            JOIN contacts c ON c.id = cg.contact_id
            WHERE cg.group_id = ?1 AND c.account_id = ?2
            ORDER BY c.created_at DESC
            "
        ))?;
        let members = stmt
            .query_map(params![group_id, account], Self::row_to_contact)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(members)
    }

    // === Relationships ===

    /// Create a relationship category, returning the stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_relationship(&self, account: &str, name: &str) -> Result<RelationshipRecord> {
        self.conn.execute(
            "INSERT INTO relationships (account_id, name) VALUES (?1, ?2)",
            params![account, name],
        )?;
        Ok(RelationshipRecord {
            id: Some(self.conn.last_insert_rowid()),
            name: name.to_string(),
        })
    }

    /// List the account's relationships ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_relationships(&self, account: &str) -> Result<Vec<RelationshipRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM relationships WHERE account_id = ?1 ORDER BY name")?;
        let relationships = stmt
            .query_map([account], |row| {
                Ok(RelationshipRecord {
                    id: Some(row.get(0)?),
                    name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(relationships)
    }

    /// Delete a relationship and its membership rows. Member contacts are kept.
    ///
    /// Returns `true` if a relationship was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_relationship(&self, account: &str, id: i64) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let affected = tx.execute(
            "DELETE FROM relationships WHERE id = ?1 AND account_id = ?2",
            params![id, account],
        )?;
        if affected > 0 {
            tx.execute(
                "DELETE FROM contact_relationships WHERE relationship_id = ?1",
                [id],
            )?;
        }
        tx.commit()?;
        Ok(affected > 0)
    }

    /// Link a contact to a relationship. Both must belong to the account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotOwner`] if either side belongs to another
    /// account, or an error if the database operation fails.
    pub fn add_contact_to_relationship(
        &self,
        account: &str,
        contact_id: i64,
        relationship_id: i64,
    ) -> Result<()> {
        self.check_contact_owner(account, contact_id)?;
        let owned: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM relationships WHERE id = ?1 AND account_id = ?2)",
            params![relationship_id, account],
            |row| row.get(0),
        )?;
        if !owned {
            return Err(Error::NotOwner);
        }
        self.conn.execute(
            "INSERT OR IGNORE INTO contact_relationships (contact_id, relationship_id) VALUES (?1, ?2)",
            params![contact_id, relationship_id],
        )?;
        Ok(())
    }

    /// Unlink a contact from a relationship.
    ///
    /// Returns `true` if a membership row was removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotOwner`] if the contact belongs to another
    /// account, or an error if the database operation fails.
    pub fn remove_contact_from_relationship(
        &self,
        account: &str,
        contact_id: i64,
        relationship_id: i64,
    ) -> Result<bool> {
        self.check_contact_owner(account, contact_id)?;
        let affected = self.conn.execute(
            "DELETE FROM contact_relationships WHERE contact_id = ?1 AND relationship_id = ?2",
            params![contact_id, relationship_id],
        )?;
        Ok(affected > 0)
    }

    /// Get the emergency-safe flags of a relationship's members.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn relationship_member_flags(&self, account: &str, relationship_id: i64) -> Result<Vec<bool>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT c.is_emergency_safe
            FROM contact_relationships cr
            JOIN contacts c ON c.id = cr.contact_id
            WHERE cr.relationship_id = ?1 AND c.account_id = ?2
            ",
        )?;
        let flags = stmt
            .query_map(params![relationship_id, account], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(flags)
    }

    /// Get the (id, name) pairs of the relationships a contact is linked to.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn contact_relationships(&self, contact_id: i64) -> Result<Vec<(i64, String)>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT r.id, r.name
            FROM contact_relationships cr
            JOIN relationships r ON r.id = cr.relationship_id
            WHERE cr.contact_id = ?1
            ORDER BY r.name
            ",
        )?;
        let names = stmt
            .query_map([contact_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    // === Duress settings rows ===

    /// Read the raw (enabled, pin_hash) settings row for an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn emergency_settings_row(&self, account: &str) -> Result<Option<(bool, Option<String>)>> {
        let row = self
            .conn
            .query_row(
                "SELECT enabled, pin_hash FROM emergency_settings WHERE account_id = ?1",
                [account],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(row)
    }

    /// Flip the enabled flag on, but only if a PIN hash is already stored.
    ///
    /// The precondition and the write are one statement, so a concurrent
    /// PIN removal cannot slip an unguarded enable through. Returns `true`
    /// if the flag was set, `false` if no PIN exists for the account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn enable_emergency_if_pin_set(&self, account: &str) -> Result<bool> {
        let affected = self.conn.execute(
            "UPDATE emergency_settings SET enabled = 1 WHERE account_id = ?1 AND pin_hash IS NOT NULL",
            [account],
        )?;
        Ok(affected > 0)
    }

    /// Store a PIN hash and flip the enabled flag on in one upsert.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn enable_emergency_with_pin(&self, account: &str, pin_hash: &str) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO emergency_settings (account_id, enabled, pin_hash)
            VALUES (?1, 1, ?2)
            ON CONFLICT(account_id) DO UPDATE SET enabled = 1, pin_hash = excluded.pin_hash
            ",
            params![account, pin_hash],
        )?;
        Ok(())
    }

    /// Flip the enabled flag off. The PIN hash is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn disable_emergency(&self, account: &str) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO emergency_settings (account_id, enabled)
            VALUES (?1, 0)
            ON CONFLICT(account_id) DO UPDATE SET enabled = 0
            ",
            [account],
        )?;
        Ok(())
    }

    /// Store a PIN hash. The enabled flag is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_emergency_pin(&self, account: &str, pin_hash: &str) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO emergency_settings (account_id, enabled, pin_hash)
            VALUES (?1, 0, ?2)
            ON CONFLICT(account_id) DO UPDATE SET pin_hash = excluded.pin_hash
            ",
            params![account, pin_hash],
        )?;
        Ok(())
    }

    // === Share links ===

    /// Insert a share link.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_share_link(&self, link: &ShareLink) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO shared_links (token, account_id, resource_id, resource_type,
                                      permission, expires_at, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
            params![
                link.token,
                link.account,
                link.resource_id,
                link.resource_type.to_string(),
                link.permission.to_string(),
                link.expires_at.map(|t| t.to_rfc3339()),
                link.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Look up a share link by token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_share_link(&self, token: &str) -> Result<Option<ShareLink>> {
        let link = self
            .conn
            .query_row(
                r"
                SELECT token, account_id, resource_id, resource_type, permission,
                       expires_at, created_at
                FROM shared_links WHERE token = ?1
                ",
                [token],
                ShareLink::from_row,
            )
            .optional()?;
        Ok(link)
    }

    /// List the account's share links, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_share_links(&self, account: &str) -> Result<Vec<ShareLink>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT token, account_id, resource_id, resource_type, permission,
                   expires_at, created_at
            FROM shared_links WHERE account_id = ?1
            ORDER BY created_at DESC
            ",
        )?;
        let links = stmt
            .query_map([account], ShareLink::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(links)
    }

    /// Delete a share link by token.
    ///
    /// Returns `true` if a link was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_share_link(&self, token: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM shared_links WHERE token = ?1", [token])?;
        Ok(affected > 0)
    }

    // === Account wipe ===

    /// Delete every record the account owns: share links, memberships,
    /// relationships, groups, and contacts. Duress settings are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if any delete fails; the wipe is transactional.
    pub fn reset_account(&self, account: &str) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM shared_links WHERE account_id = ?1", [account])?;
        tx.execute(
            r"
            DELETE FROM contact_groups WHERE contact_id IN
                (SELECT id FROM contacts WHERE account_id = ?1)
            ",
            [account],
        )?;
        tx.execute(
            r"
            DELETE FROM contact_relationships WHERE contact_id IN
                (SELECT id FROM contacts WHERE account_id = ?1)
            ",
            [account],
        )?;
        tx.execute("DELETE FROM relationships WHERE account_id = ?1", [account])?;
        tx.execute("DELETE FROM groups WHERE account_id = ?1", [account])?;
        tx.execute("DELETE FROM contacts WHERE account_id = ?1", [account])?;
        tx.commit()?;

        info!("Wiped all records for account");
        Ok(())
    }

    // === Helpers ===

    fn check_contact_owner(&self, account: &str, contact_id: i64) -> Result<()> {
        let owned: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM contacts WHERE id = ?1 AND account_id = ?2)",
            params![contact_id, account],
            |row| row.get(0),
        )?;
        if owned {
            Ok(())
        } else {
            Err(Error::NotOwner)
        }
    }

    /// Convert a database row to a `ContactRecord`.
    fn row_to_contact(row: &rusqlite::Row) -> rusqlite::Result<ContactRecord> {
        let phones_json: String = row.get(5)?;
        let emails_json: String = row.get(6)?;
        let status_str: String = row.get(8)?;
        let created_at_str: String = row.get(12)?;

        let phones = serde_json::from_str(&phones_json).unwrap_or_else(|e| {
            warn!("Unreadable phone list on contact row: {}", e);
            Vec::new()
        });
        let emails = serde_json::from_str(&emails_json).unwrap_or_else(|e| {
            warn!("Unreadable email list on contact row: {}", e);
            Vec::new()
        });

        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

        Ok(ContactRecord {
            id: Some(row.get(0)?),
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            company: row.get(3)?,
            job_title: row.get(4)?,
            phones,
            emails,
            address: row.get(7)?,
            status: ContactStatus::parse(&status_str),
            is_favorite: row.get(9)?,
            is_emergency_safe: row.get(10)?,
            notes: row.get(11)?,
            created_at,
        })
    }
}

const CONTACT_COLUMNS_QUALIFIED: &str =
    "c.id, c.first_name, c.last_name, c.company, c.job_title, c.phones, c.emails, \
     c.address, c.status, c.is_favorite, c.is_emergency_safe, c.notes, c.created_at";
