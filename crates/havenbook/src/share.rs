//! Share-link issuance and resolution.
//!
//! A share link is an unguessable token granting read access to one
//! contact or one group, optionally until an expiry instant. Resolution
//! is capability-based: possession of the token is the whole credential,
//! and the owner's duress mode does not narrow what it returns. Missing,
//! foreign, and expired tokens all resolve to the same error so a caller
//! cannot probe which of the three it hit.

use chrono::{DateTime, Duration, Utc};
use rand::distr::Alphanumeric;
use rand::Rng;
use tracing::{debug, info};

use crate::contact::{ContactRecord, GroupRecord};
use crate::error::{Error, Result};
use crate::store::Store;

/// The kind of resource a share link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    /// A single contact.
    Contact,
    /// A group and its member contacts.
    Group,
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Contact => write!(f, "contact"),
            Self::Group => write!(f, "group"),
        }
    }
}

impl ResourceType {
    /// Parse a resource type from its stored string form.
    ///
    /// # Errors
    ///
    /// Returns an internal error for unknown values; the store is the
    /// only writer, so an unknown value is a bug.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "contact" => Ok(Self::Contact),
            "group" => Ok(Self::Group),
            other => Err(Error::internal(format!("unknown resource type: {other}"))),
        }
    }
}

/// The access level a share link grants.
///
/// Resolution currently serves reads either way; the level is stored so
/// consumers can honor it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Read-only access.
    #[default]
    View,
    /// Read and suggest-edit access.
    Edit,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::View => write!(f, "view"),
            Self::Edit => write!(f, "edit"),
        }
    }
}

impl Permission {
    /// Parse a permission from its stored string form.
    ///
    /// Unknown values fall back to the most restrictive level.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "edit" => Self::Edit,
            "view" => Self::View,
            other => {
                tracing::warn!("Unknown share permission: {}, defaulting to view", other);
                Self::View
            }
        }
    }
}

/// A reference to a shareable resource owned by the issuing account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceRef {
    /// A contact by ID.
    Contact(i64),
    /// A group by ID.
    Group(i64),
}

/// A stored share link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    /// The unguessable token; also the primary key.
    pub token: String,
    /// Issuing account.
    pub account: String,
    /// ID of the shared resource.
    pub resource_id: i64,
    /// Kind of the shared resource.
    pub resource_type: ResourceType,
    /// Access level granted.
    pub permission: Permission,
    /// Expiry instant, or `None` for a link that never expires.
    pub expires_at: Option<DateTime<Utc>>,
    /// When the link was issued.
    pub created_at: DateTime<Utc>,
}

impl ShareLink {
    /// Whether the link is expired as of the given instant.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| now > expiry)
    }

    /// Convert a database row to a `ShareLink`.
    pub(crate) fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        let resource_type_str: String = row.get(3)?;
        let permission_str: String = row.get(4)?;
        let expires_at_str: Option<String> = row.get(5)?;
        let created_at_str: String = row.get(6)?;

        let resource_type = ResourceType::parse(&resource_type_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())),
            )
        })?;

        let permission = Permission::parse(&permission_str);

        let expires_at = expires_at_str.and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        });
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

        Ok(Self {
            token: row.get(0)?,
            account: row.get(1)?,
            resource_id: row.get(2)?,
            resource_type,
            permission,
            expires_at,
            created_at,
        })
    }
}

/// What a successfully resolved share link yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSnapshot {
    /// A shared contact.
    Contact(ContactRecord),
    /// A shared group with its member contacts.
    Group {
        /// The group itself.
        group: GroupRecord,
        /// Its member contacts at resolution time.
        members: Vec<ContactRecord>,
    },
}

/// Issues, resolves, and revokes share links.
#[derive(Debug)]
pub struct ShareLinks<'a> {
    store: &'a Store,
    token_length: usize,
    default_permission: Permission,
}

impl<'a> ShareLinks<'a> {
    /// Create a share-link service over the given record store.
    #[must_use]
    pub fn new(store: &'a Store, token_length: usize, default_permission: Permission) -> Self {
        Self {
            store,
            token_length,
            default_permission,
        }
    }

    /// Issue a share link for a resource the account owns.
    ///
    /// `expires_in_days` of `None` issues a link that never expires.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotOwner`] if the resource belongs to a different
    /// account or does not exist, or an error if the database operation
    /// fails.
    pub fn issue(
        &self,
        account: &str,
        resource: ResourceRef,
        expires_in_days: Option<i64>,
    ) -> Result<ShareLink> {
        let (resource_type, resource_id) = match resource {
            ResourceRef::Contact(id) => {
                if self.store.get_contact(account, id)?.is_none() {
                    return Err(Error::NotOwner);
                }
                (ResourceType::Contact, id)
            }
            ResourceRef::Group(id) => {
                if self.store.get_group(account, id)?.is_none() {
                    return Err(Error::NotOwner);
                }
                (ResourceType::Group, id)
            }
        };

        let now = Utc::now();
        let link = ShareLink {
            token: self.generate_token(),
            account: account.to_string(),
            resource_id,
            resource_type,
            permission: self.default_permission,
            expires_at: expires_in_days.map(|days| now + Duration::days(days)),
            created_at: now,
        };
        self.store.insert_share_link(&link)?;

        info!("Issued {} share link", resource_type);
        Ok(link)
    }

    /// Resolve a token to the resource it shares, as of now.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFoundOrExpired`] for unknown and expired
    /// tokens alike, or an error if the database operation fails.
    pub fn resolve(&self, token: &str) -> Result<ResourceSnapshot> {
        self.resolve_at(token, Utc::now())
    }

    /// Resolve a token against an explicit clock reading.
    ///
    /// The resource is read in the owner's scope without duress
    /// narrowing: the link was issued before the mode changed, and its
    /// audience is not the account holder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFoundOrExpired`] for unknown and expired
    /// tokens alike, or an error if the database operation fails.
    pub fn resolve_at(&self, token: &str, now: DateTime<Utc>) -> Result<ResourceSnapshot> {
        let link = self
            .store
            .get_share_link(token)?
            .ok_or(Error::NotFoundOrExpired)?;

        if link.is_expired_at(now) {
            debug!("Rejected expired share token");
            return Err(Error::NotFoundOrExpired);
        }

        match link.resource_type {
            ResourceType::Contact => {
                let contact = self
                    .store
                    .get_contact(&link.account, link.resource_id)?
                    .ok_or(Error::NotFoundOrExpired)?;
                Ok(ResourceSnapshot::Contact(contact))
            }
            ResourceType::Group => {
                let group = self
                    .store
                    .get_group(&link.account, link.resource_id)?
                    .ok_or(Error::NotFoundOrExpired)?;
                let members = self.store.group_members(&link.account, link.resource_id)?;
                Ok(ResourceSnapshot::Group { group, members })
            }
        }
    }

    /// Revoke a link the account issued. Foreign links are left intact.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFoundOrExpired`] for unknown tokens,
    /// [`Error::NotOwner`] for links issued by a different account, or an
    /// error if the database operation fails.
    pub fn revoke(&self, account: &str, token: &str) -> Result<()> {
        let link = self
            .store
            .get_share_link(token)?
            .ok_or(Error::NotFoundOrExpired)?;

        if link.account != account {
            return Err(Error::NotOwner);
        }

        self.store.delete_share_link(token)?;
        info!("Revoked share link");
        Ok(())
    }

    /// List the links the account has issued, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list(&self, account: &str) -> Result<Vec<ShareLink>> {
        self.store.list_share_links(account)
    }

    fn generate_token(&self) -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(self.token_length)
            .map(char::from)
            .collect()
    }
}
