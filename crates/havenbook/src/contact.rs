//! Core record types for havenbook.
//!
//! This module defines the domain records stored and served by the
//! directory: contacts, groups, relationships, and the normalized
//! shape accepted from import collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pipeline status of a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    /// Newly added, not yet worked.
    New,
    /// Qualified as a real relationship worth keeping.
    Qualified,
    /// Already contacted.
    Contacted,
}

impl std::fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Qualified => write!(f, "qualified"),
            Self::Contacted => write!(f, "contacted"),
        }
    }
}

impl ContactStatus {
    /// Parse a status from its stored string form.
    ///
    /// Unknown values fall back to `New` so a damaged row never poisons
    /// a whole listing.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "qualified" => Self::Qualified,
            "contacted" => Self::Contacted,
            "new" => Self::New,
            other => {
                tracing::warn!("Unknown contact status: {}, defaulting to new", other);
                Self::New
            }
        }
    }
}

/// A labelled phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phone {
    /// Label such as "Mobile" or "Work".
    pub label: String,
    /// The number itself, stored as entered.
    pub number: String,
}

/// A labelled email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    /// Label such as "Personal" or "Work".
    pub label: String,
    /// The address itself.
    pub address: String,
}

/// A single contact record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    /// Unique identifier (assigned by the store).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// First name.
    pub first_name: String,

    /// Last name.
    pub last_name: String,

    /// Company, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    /// Job title, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,

    /// Phone numbers.
    pub phones: Vec<Phone>,

    /// Email addresses.
    pub emails: Vec<Email>,

    /// Postal address, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Pipeline status.
    pub status: ContactStatus,

    /// Whether the contact is pinned as a favorite.
    pub is_favorite: bool,

    /// Whether the contact stays visible while duress mode is active.
    pub is_emergency_safe: bool,

    /// Free-text notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// When this contact was created.
    pub created_at: DateTime<Utc>,
}

impl ContactRecord {
    /// Create a new contact with the given name and defaults everywhere else.
    #[must_use]
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            company: None,
            job_title: None,
            phones: Vec::new(),
            emails: Vec::new(),
            address: None,
            status: ContactStatus::New,
            is_favorite: false,
            is_emergency_safe: false,
            notes: None,
            created_at: Utc::now(),
        }
    }

    /// Full display name.
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.last_name.is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }
}

/// A partial update to a contact. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPatch {
    /// New first name.
    pub first_name: Option<String>,
    /// New last name.
    pub last_name: Option<String>,
    /// New company.
    pub company: Option<String>,
    /// New job title.
    pub job_title: Option<String>,
    /// Replacement phone list.
    pub phones: Option<Vec<Phone>>,
    /// Replacement email list.
    pub emails: Option<Vec<Email>>,
    /// New postal address.
    pub address: Option<String>,
    /// New pipeline status.
    pub status: Option<ContactStatus>,
    /// New favorite flag.
    pub is_favorite: Option<bool>,
    /// New emergency-safe flag.
    pub is_emergency_safe: Option<bool>,
    /// New notes.
    pub notes: Option<String>,
}

impl ContactPatch {
    /// Check whether the patch changes anything at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.company.is_none()
            && self.job_title.is_none()
            && self.phones.is_none()
            && self.emails.is_none()
            && self.address.is_none()
            && self.status.is_none()
            && self.is_favorite.is_none()
            && self.is_emergency_safe.is_none()
            && self.notes.is_none()
    }
}

/// A normalized contact record handed over by an import collaborator.
///
/// The CSV/VCF text itself is parsed outside this crate; by the time a
/// record reaches the directory it is already in this shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedContact {
    /// First name.
    pub first_name: String,
    /// Last name.
    #[serde(default)]
    pub last_name: String,
    /// Company.
    #[serde(default)]
    pub company: Option<String>,
    /// Job title.
    #[serde(default)]
    pub job_title: Option<String>,
    /// Phone numbers.
    #[serde(default)]
    pub phones: Vec<Phone>,
    /// Email addresses.
    #[serde(default)]
    pub emails: Vec<Email>,
    /// Postal address.
    #[serde(default)]
    pub address: Option<String>,
}

impl From<ImportedContact> for ContactRecord {
    fn from(imported: ImportedContact) -> Self {
        let mut record = Self::new(imported.first_name, imported.last_name);
        record.company = imported.company;
        record.job_title = imported.job_title;
        record.phones = imported.phones;
        record.emails = imported.emails;
        record.address = imported.address;
        record
    }
}

/// A named group of contacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    /// Unique identifier (assigned by the store).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Group name.
    pub name: String,
}

/// A named relationship category (e.g. "Family", "Colleague").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    /// Unique identifier (assigned by the store).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Relationship name.
    pub name: String,
}

/// Per-status contact counts for a listing, computed over the same
/// (possibly duress-narrowed) set as the listing itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactCounts {
    /// All visible contacts.
    pub all: usize,
    /// Visible favorites.
    pub favorites: usize,
    /// Visible contacts with status `new`.
    pub new: usize,
    /// Visible contacts with status `qualified`.
    pub qualified: usize,
    /// Visible contacts with status `contacted`.
    pub contacted: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_status_display() {
        assert_eq!(ContactStatus::New.to_string(), "new");
        assert_eq!(ContactStatus::Qualified.to_string(), "qualified");
        assert_eq!(ContactStatus::Contacted.to_string(), "contacted");
    }

    #[test]
    fn test_contact_status_parse_roundtrip() {
        for status in [
            ContactStatus::New,
            ContactStatus::Qualified,
            ContactStatus::Contacted,
        ] {
            assert_eq!(ContactStatus::parse(&status.to_string()), status);
        }
    }

    #[test]
    fn test_contact_status_parse_unknown_defaults_to_new() {
        assert_eq!(ContactStatus::parse("archived"), ContactStatus::New);
    }

    #[test]
    fn test_contact_new_defaults() {
        let contact = ContactRecord::new("Alice", "Nguyen");

        assert!(contact.id.is_none());
        assert_eq!(contact.first_name, "Alice");
        assert_eq!(contact.last_name, "Nguyen");
        assert_eq!(contact.status, ContactStatus::New);
        assert!(!contact.is_favorite);
        assert!(!contact.is_emergency_safe);
        assert!(contact.phones.is_empty());
        assert!(contact.emails.is_empty());
    }

    #[test]
    fn test_full_name() {
        let contact = ContactRecord::new("Alice", "Nguyen");
        assert_eq!(contact.full_name(), "Alice Nguyen");

        let mononym = ContactRecord::new("Cher", "");
        assert_eq!(mononym.full_name(), "Cher");
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(ContactPatch::default().is_empty());

        let patch = ContactPatch {
            is_favorite: Some(true),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_imported_contact_conversion() {
        let imported = ImportedContact {
            first_name: "Sam".to_string(),
            last_name: "Rivera".to_string(),
            company: Some("Acme".to_string()),
            job_title: Some("Engineer".to_string()),
            phones: vec![Phone {
                label: "Mobile".to_string(),
                number: "+1 555 0100".to_string(),
            }],
            emails: vec![Email {
                label: "Personal".to_string(),
                address: "sam@example.com".to_string(),
            }],
            address: Some("12 Elm St".to_string()),
        };

        let record: ContactRecord = imported.into();
        assert_eq!(record.first_name, "Sam");
        assert_eq!(record.company.as_deref(), Some("Acme"));
        assert_eq!(record.phones.len(), 1);
        assert_eq!(record.emails.len(), 1);
        assert_eq!(record.status, ContactStatus::New);
        assert!(!record.is_emergency_safe);
    }

    #[test]
    fn test_contact_serialization_roundtrip() {
        let mut contact = ContactRecord::new("Alice", "Nguyen");
        contact.emails.push(Email {
            label: "Work".to_string(),
            address: "alice@example.com".to_string(),
        });

        let json = serde_json::to_string(&contact).unwrap();
        let back: ContactRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(contact, back);
    }

    #[test]
    fn test_imported_contact_minimal_json() {
        // Import collaborators may omit everything but the first name.
        let record: ImportedContact = serde_json::from_str(r#"{"first_name": "Ada"}"#).unwrap();
        assert_eq!(record.first_name, "Ada");
        assert!(record.last_name.is_empty());
        assert!(record.phones.is_empty());
    }

    #[test]
    fn test_counts_default() {
        let counts = ContactCounts::default();
        assert_eq!(counts.all, 0);
        assert_eq!(counts.favorites, 0);
    }
}
