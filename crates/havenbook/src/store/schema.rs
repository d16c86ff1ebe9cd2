//! `SQLite` schema definitions for havenbook.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema. Every table except the membership joins carries
//! an `account_id` column; the joins are scoped through their contact.

/// SQL statement to create the contacts table.
pub const CREATE_CONTACTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS contacts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id TEXT NOT NULL,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL DEFAULT '',
    company TEXT,
    job_title TEXT,
    phones TEXT NOT NULL DEFAULT '[]',
    emails TEXT NOT NULL DEFAULT '[]',
    address TEXT,
    status TEXT NOT NULL DEFAULT 'new',
    is_favorite INTEGER NOT NULL DEFAULT 0,
    is_emergency_safe INTEGER NOT NULL DEFAULT 0,
    notes TEXT,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create the groups table.
pub const CREATE_GROUPS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS groups (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id TEXT NOT NULL,
    name TEXT NOT NULL
)
";

/// SQL statement to create the relationships table.
pub const CREATE_RELATIONSHIPS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS relationships (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id TEXT NOT NULL,
    name TEXT NOT NULL
)
";

/// SQL statement to create the contact/group membership join.
pub const CREATE_CONTACT_GROUPS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS contact_groups (
    contact_id INTEGER NOT NULL,
    group_id INTEGER NOT NULL,
    UNIQUE(contact_id, group_id)
)
";

/// SQL statement to create the contact/relationship membership join.
pub const CREATE_CONTACT_RELATIONSHIPS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS contact_relationships (
    contact_id INTEGER NOT NULL,
    relationship_id INTEGER NOT NULL,
    UNIQUE(contact_id, relationship_id)
)
";

/// SQL statement to create the per-account duress settings table.
///
/// Invariant: `enabled = 1` is only ever written together with, or after,
/// a non-null `pin_hash`.
pub const CREATE_EMERGENCY_SETTINGS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS emergency_settings (
    account_id TEXT PRIMARY KEY,
    enabled INTEGER NOT NULL DEFAULT 0,
    pin_hash TEXT
)
";

/// SQL statement to create the share-links table.
pub const CREATE_SHARED_LINKS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS shared_links (
    token TEXT PRIMARY KEY,
    account_id TEXT NOT NULL,
    resource_id INTEGER NOT NULL,
    resource_type TEXT NOT NULL,
    permission TEXT NOT NULL DEFAULT 'view',
    expires_at TEXT,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create an index on contact ownership.
pub const CREATE_CONTACT_ACCOUNT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_contacts_account ON contacts(account_id)
";

/// SQL statement to create an index on the emergency-safe flag, the
/// predicate every duress-narrowed query filters on.
pub const CREATE_CONTACT_SAFE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_contacts_safe ON contacts(account_id, is_emergency_safe)
";

/// SQL statement to create an index on contact status for tab listings.
pub const CREATE_CONTACT_STATUS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_contacts_status ON contacts(account_id, status)
";

/// SQL statement to create an index on share-link ownership.
pub const CREATE_SHARED_LINKS_ACCOUNT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_shared_links_account ON shared_links(account_id)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_CONTACTS_TABLE,
    CREATE_GROUPS_TABLE,
    CREATE_RELATIONSHIPS_TABLE,
    CREATE_CONTACT_GROUPS_TABLE,
    CREATE_CONTACT_RELATIONSHIPS_TABLE,
    CREATE_EMERGENCY_SETTINGS_TABLE,
    CREATE_SHARED_LINKS_TABLE,
    CREATE_CONTACT_ACCOUNT_INDEX,
    CREATE_CONTACT_SAFE_INDEX,
    CREATE_CONTACT_STATUS_INDEX,
    CREATE_SHARED_LINKS_ACCOUNT_INDEX,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.is_empty());
        }
    }

    #[test]
    fn test_create_contacts_table_contains_required_columns() {
        assert!(CREATE_CONTACTS_TABLE.contains("id INTEGER PRIMARY KEY"));
        assert!(CREATE_CONTACTS_TABLE.contains("account_id TEXT NOT NULL"));
        assert!(CREATE_CONTACTS_TABLE.contains("is_emergency_safe INTEGER NOT NULL"));
        assert!(CREATE_CONTACTS_TABLE.contains("status TEXT NOT NULL"));
        assert!(CREATE_CONTACTS_TABLE.contains("created_at TEXT NOT NULL"));
    }

    #[test]
    fn test_join_tables_are_unique_pairs() {
        assert!(CREATE_CONTACT_GROUPS_TABLE.contains("UNIQUE(contact_id, group_id)"));
        assert!(
            CREATE_CONTACT_RELATIONSHIPS_TABLE.contains("UNIQUE(contact_id, relationship_id)")
        );
    }

    #[test]
    fn test_emergency_settings_pin_is_nullable() {
        assert!(CREATE_EMERGENCY_SETTINGS_TABLE.contains("pin_hash TEXT"));
        assert!(!CREATE_EMERGENCY_SETTINGS_TABLE.contains("pin_hash TEXT NOT NULL"));
    }

    #[test]
    fn test_shared_links_token_is_primary_key() {
        assert!(CREATE_SHARED_LINKS_TABLE.contains("token TEXT PRIMARY KEY"));
    }

    #[test]
    fn test_create_metadata_table_structure() {
        assert!(CREATE_METADATA_TABLE.contains("key TEXT PRIMARY KEY"));
        assert!(CREATE_METADATA_TABLE.contains("value TEXT NOT NULL"));
    }
}
