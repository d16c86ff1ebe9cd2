//! The directory facade.
//!
//! [`Directory`] is the single entry point callers use for contact,
//! group, and relationship operations. Every read path constructs a
//! fresh [`SafeSetFilter`] and applies it before touching the store, so
//! the duress predicate lives in exactly one place per read instead of
//! being restated inside each query.

use tracing::info;

use crate::config::Config;
use crate::contact::{
    ContactCounts, ContactPatch, ContactRecord, ContactStatus, GroupRecord, ImportedContact,
    RelationshipRecord,
};
use crate::duress::{AccessModeStore, SafeSetFilter};
use crate::error::{Error, Result};
use crate::share::{Permission, ShareLinks};
use crate::store::{ContactQuery, ContactTab, Store};

/// A contact in a listing, annotated with its relationship names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactView {
    /// The contact record.
    pub contact: ContactRecord,
    /// Names of the relationships the contact is linked to.
    pub relationships: Vec<String>,
}

/// One page of a contact listing: the visible contacts plus counts
/// computed over the same visible set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactPage {
    /// Visible contacts, newest first.
    pub contacts: Vec<ContactView>,
    /// Per-tab counts over the visible set.
    pub counts: ContactCounts,
}

/// A group in a listing, with its visible member count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupView {
    /// The group record.
    pub group: GroupRecord,
    /// Number of members visible under the current mode.
    pub member_count: usize,
}

/// A relationship in a listing, with its visible member count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipView {
    /// The relationship record.
    pub relationship: RelationshipRecord,
    /// Number of members visible under the current mode.
    pub member_count: usize,
}

/// The personal-directory facade over one record store.
#[derive(Debug)]
pub struct Directory {
    store: Store,
    token_length: usize,
    default_permission: Permission,
    default_expiry_days: Option<i64>,
    max_batch: usize,
}

impl Directory {
    /// Create a directory over an already-open store.
    #[must_use]
    pub fn new(store: Store, config: &Config) -> Self {
        Self {
            store,
            token_length: config.sharing.token_length,
            default_permission: config.sharing.default_permission,
            default_expiry_days: config.sharing.default_expiry_days,
            max_batch: config.import.max_batch,
        }
    }

    /// Open the configured database and wrap it in a directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(config: &Config) -> Result<Self> {
        let store = Store::open(&config.storage.database_path)?;
        Ok(Self::new(store, config))
    }

    /// Access the underlying record store.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Access the duress-mode settings for this directory's store.
    #[must_use]
    pub fn access_mode(&self) -> AccessModeStore<'_> {
        AccessModeStore::new(&self.store)
    }

    /// Access the share-link service for this directory's store.
    #[must_use]
    pub fn shares(&self) -> ShareLinks<'_> {
        ShareLinks::new(&self.store, self.token_length, self.default_permission)
    }

    /// The configured default share-link expiry, in days.
    #[must_use]
    pub fn default_expiry_days(&self) -> Option<i64> {
        self.default_expiry_days
    }

    // === Contacts ===

    /// List the account's visible contacts with counts and relationship
    /// annotations.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_contacts(
        &self,
        account: &str,
        tab: ContactTab,
        search: Option<&str>,
    ) -> Result<ContactPage> {
        let filter = SafeSetFilter::for_account(&self.store, account)?;

        let mut query = ContactQuery::for_account(account).with_tab(tab);
        if let Some(term) = search {
            query = query.with_search(term);
        }
        let query = filter.narrow(query);

        let records = self.store.list_contacts(&query)?;
        let mut contacts = Vec::with_capacity(records.len());
        for contact in records {
            let relationships = match contact.id {
                Some(id) => self
                    .store
                    .contact_relationships(id)?
                    .into_iter()
                    .map(|(_, name)| name)
                    .collect(),
                None => Vec::new(),
            };
            contacts.push(ContactView {
                contact,
                relationships,
            });
        }

        let counts = self.contact_counts(account, filter)?;
        Ok(ContactPage { contacts, counts })
    }

    /// Get one contact, concealed as not-found while duress mode hides it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_contact(&self, account: &str, id: i64) -> Result<Option<ContactRecord>> {
        let filter = SafeSetFilter::for_account(&self.store, account)?;
        let contact = self.store.get_contact(account, id)?;
        Ok(filter.conceal(contact))
    }

    /// Create a contact, returning it with its assigned ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn create_contact(&self, account: &str, mut contact: ContactRecord) -> Result<ContactRecord> {
        let id = self.store.insert_contact(account, &contact)?;
        contact.id = Some(id);
        Ok(contact)
    }

    /// Apply a partial update to a contact.
    ///
    /// Returns `true` if a contact was updated.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_contact(&self, account: &str, id: i64, patch: &ContactPatch) -> Result<bool> {
        self.store.update_contact(account, id, patch)
    }

    /// Delete a contact.
    ///
    /// Returns `true` if a contact was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_contact(&self, account: &str, id: i64) -> Result<bool> {
        self.store.delete_contact(account, id)
    }

    /// Flip a contact's favorite flag, returning the new value, or
    /// `None` if the contact does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn toggle_favorite(&self, account: &str, id: i64) -> Result<Option<bool>> {
        let Some(contact) = self.store.get_contact(account, id)? else {
            return Ok(None);
        };
        let flipped = !contact.is_favorite;
        let patch = ContactPatch {
            is_favorite: Some(flipped),
            ..Default::default()
        };
        self.store.update_contact(account, id, &patch)?;
        Ok(Some(flipped))
    }

    /// Set a contact's emergency-safe flag, returning `true` if the
    /// contact exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_emergency_safe(&self, account: &str, id: i64, safe: bool) -> Result<bool> {
        let patch = ContactPatch {
            is_emergency_safe: Some(safe),
            ..Default::default()
        };
        self.store.update_contact(account, id, &patch)
    }

    /// Import a batch of normalized contacts, returning how many were
    /// stored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BatchTooLarge`] if the batch exceeds the
    /// configured limit, or an error if the database operation fails.
    pub fn bulk_import(&self, account: &str, batch: Vec<ImportedContact>) -> Result<usize> {
        if batch.len() > self.max_batch {
            return Err(Error::BatchTooLarge {
                limit: self.max_batch,
            });
        }

        let records: Vec<ContactRecord> = batch.into_iter().map(Into::into).collect();
        self.store.bulk_insert_contacts(account, &records)
    }

    // === Groups ===

    /// Create a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn create_group(&self, account: &str, name: &str) -> Result<GroupRecord> {
        self.store.insert_group(account, name)
    }

    /// List the account's groups with visible member counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_groups(&self, account: &str) -> Result<Vec<GroupView>> {
        let filter = SafeSetFilter::for_account(&self.store, account)?;

        let mut views = Vec::new();
        for group in self.store.list_groups(account)? {
            let member_count = match group.id {
                Some(id) => filter.member_count(&self.store.group_member_flags(account, id)?),
                None => 0,
            };
            views.push(GroupView {
                group,
                member_count,
            });
        }
        Ok(views)
    }

    /// Delete a group. Member contacts are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_group(&self, account: &str, id: i64) -> Result<bool> {
        self.store.delete_group(account, id)
    }

    /// Add a contact to a group.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotOwner`] if either side belongs to another
    /// account, or an error if the database operation fails.
    pub fn add_to_group(&self, account: &str, contact_id: i64, group_id: i64) -> Result<()> {
        self.store.add_contact_to_group(account, contact_id, group_id)
    }

    /// Remove a contact from a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn remove_from_group(&self, account: &str, contact_id: i64, group_id: i64) -> Result<bool> {
        self.store
            .remove_contact_from_group(account, contact_id, group_id)
    }

    // === Relationships ===

    /// Create a relationship category.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn create_relationship(&self, account: &str, name: &str) -> Result<RelationshipRecord> {
        self.store.insert_relationship(account, name)
    }

    /// List the account's relationships with visible member counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_relationships(&self, account: &str) -> Result<Vec<RelationshipView>> {
        let filter = SafeSetFilter::for_account(&self.store, account)?;

        let mut views = Vec::new();
        for relationship in self.store.list_relationships(account)? {
            let member_count = match relationship.id {
                Some(id) => {
                    filter.member_count(&self.store.relationship_member_flags(account, id)?)
                }
                None => 0,
            };
            views.push(RelationshipView {
                relationship,
                member_count,
            });
        }
        Ok(views)
    }

    /// Delete a relationship. Member contacts are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_relationship(&self, account: &str, id: i64) -> Result<bool> {
        self.store.delete_relationship(account, id)
    }

    /// Link a contact to a relationship.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotOwner`] if either side belongs to another
    /// account, or an error if the database operation fails.
    pub fn link_relationship(
        &self,
        account: &str,
        contact_id: i64,
        relationship_id: i64,
    ) -> Result<()> {
        self.store
            .add_contact_to_relationship(account, contact_id, relationship_id)
    }

    /// Unlink a contact from a relationship.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn unlink_relationship(
        &self,
        account: &str,
        contact_id: i64,
        relationship_id: i64,
    ) -> Result<bool> {
        self.store
            .remove_contact_from_relationship(account, contact_id, relationship_id)
    }

    // === Account wipe ===

    /// Delete every record the account owns. Duress settings survive the
    /// wipe, so the mode and PIN are unchanged afterward.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn reset_all_data(&self, account: &str) -> Result<()> {
        self.store.reset_account(account)?;
        info!("Account data reset");
        Ok(())
    }

    // === Helpers ===

    fn contact_counts(&self, account: &str, filter: SafeSetFilter) -> Result<ContactCounts> {
        let flags = self.store.contact_flags(account, filter.is_active())?;

        let mut counts = ContactCounts::default();
        for (status, favorite) in flags {
            counts.all += 1;
            if favorite {
                counts.favorites += 1;
            }
            match status {
                ContactStatus::New => counts.new += 1,
                ContactStatus::Qualified => counts.qualified += 1,
                ContactStatus::Contacted => counts.contacted += 1,
            }
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::{Email, Phone};
    use crate::share::{ResourceRef, ResourceSnapshot};

    fn create_test_directory() -> Directory {
        let store = Store::open_in_memory().expect("failed to create test store");
        Directory::new(store, &Config::default())
    }

    fn add_contact(dir: &Directory, account: &str, first: &str, safe: bool) -> i64 {
        let mut contact = ContactRecord::new(first, "Test");
        contact.is_emergency_safe = safe;
        dir.create_contact(account, contact)
            .unwrap()
            .id
            .expect("created contact has an id")
    }

    #[test]
    fn test_disabled_mode_is_passthrough() {
        let dir = create_test_directory();
        add_contact(&dir, "acct", "Alice", false);
        add_contact(&dir, "acct", "Bob", true);

        let page = dir.list_contacts("acct", ContactTab::All, None).unwrap();
        assert_eq!(page.contacts.len(), 2);
        assert_eq!(page.counts.all, 2);
    }

    #[test]
    fn test_active_mode_hides_unsafe_everywhere() {
        let dir = create_test_directory();
        let hidden = add_contact(&dir, "acct", "Hidden", false);
        let visible = add_contact(&dir, "acct", "Visible", true);
        dir.access_mode().enable_with_pin("acct", "123456").unwrap();

        // Listing
        let page = dir.list_contacts("acct", ContactTab::All, None).unwrap();
        assert_eq!(page.contacts.len(), 1);
        assert_eq!(page.contacts[0].contact.first_name, "Visible");

        // Counts follow the visible set
        assert_eq!(page.counts.all, 1);
        assert_eq!(page.counts.new, 1);

        // Single fetch conceals as plain not-found
        assert!(dir.get_contact("acct", hidden).unwrap().is_none());
        assert!(dir.get_contact("acct", visible).unwrap().is_some());

        // Search cannot reach the hidden contact either
        let page = dir
            .list_contacts("acct", ContactTab::All, Some("Hidden"))
            .unwrap();
        assert!(page.contacts.is_empty());
    }

    #[test]
    fn test_mode_flip_takes_effect_on_next_read() {
        let dir = create_test_directory();
        let id = add_contact(&dir, "acct", "Alice", false);

        dir.access_mode().enable_with_pin("acct", "123456").unwrap();
        assert!(dir.get_contact("acct", id).unwrap().is_none());

        dir.access_mode().set_enabled("acct", false).unwrap();
        assert!(dir.get_contact("acct", id).unwrap().is_some());
    }

    #[test]
    fn test_group_counts_shrink_under_duress() {
        let dir = create_test_directory();
        let safe = add_contact(&dir, "acct", "Safe", true);
        let unsafe_id = add_contact(&dir, "acct", "Unsafe", false);
        let group = dir.create_group("acct", "Family").unwrap();
        dir.add_to_group("acct", safe, group.id.unwrap()).unwrap();
        dir.add_to_group("acct", unsafe_id, group.id.unwrap()).unwrap();

        let views = dir.list_groups("acct").unwrap();
        assert_eq!(views[0].member_count, 2);

        dir.access_mode().enable_with_pin("acct", "123456").unwrap();
        let views = dir.list_groups("acct").unwrap();
        assert_eq!(views[0].member_count, 1);
    }

    #[test]
    fn test_relationship_counts_shrink_under_duress() {
        let dir = create_test_directory();
        let safe = add_contact(&dir, "acct", "Safe", true);
        let unsafe_id = add_contact(&dir, "acct", "Unsafe", false);
        let rel = dir.create_relationship("acct", "Colleague").unwrap();
        dir.link_relationship("acct", safe, rel.id.unwrap()).unwrap();
        dir.link_relationship("acct", unsafe_id, rel.id.unwrap())
            .unwrap();

        dir.access_mode().enable_with_pin("acct", "123456").unwrap();
        let views = dir.list_relationships("acct").unwrap();
        assert_eq!(views[0].member_count, 1);
    }

    #[test]
    fn test_listing_annotates_relationships() {
        let dir = create_test_directory();
        let id = add_contact(&dir, "acct", "Alice", false);
        let rel = dir.create_relationship("acct", "Mentor").unwrap();
        dir.link_relationship("acct", id, rel.id.unwrap()).unwrap();

        let page = dir.list_contacts("acct", ContactTab::All, None).unwrap();
        assert_eq!(page.contacts[0].relationships, vec!["Mentor".to_string()]);
    }

    #[test]
    fn test_toggle_favorite() {
        let dir = create_test_directory();
        let id = add_contact(&dir, "acct", "Alice", false);

        assert_eq!(dir.toggle_favorite("acct", id).unwrap(), Some(true));
        assert_eq!(dir.toggle_favorite("acct", id).unwrap(), Some(false));
        assert_eq!(dir.toggle_favorite("acct", 9999).unwrap(), None);
    }

    #[test]
    fn test_counts_by_tab() {
        let dir = create_test_directory();
        let a = add_contact(&dir, "acct", "Alice", false);
        add_contact(&dir, "acct", "Bob", false);
        dir.update_contact(
            "acct",
            a,
            &ContactPatch {
                status: Some(ContactStatus::Qualified),
                is_favorite: Some(true),
                ..Default::default()
            },
        )
        .unwrap();

        let page = dir.list_contacts("acct", ContactTab::All, None).unwrap();
        assert_eq!(page.counts.all, 2);
        assert_eq!(page.counts.favorites, 1);
        assert_eq!(page.counts.new, 1);
        assert_eq!(page.counts.qualified, 1);
        assert_eq!(page.counts.contacted, 0);

        // Tab narrows the listing but counts stay whole-set
        let page = dir
            .list_contacts("acct", ContactTab::Status(ContactStatus::Qualified), None)
            .unwrap();
        assert_eq!(page.contacts.len(), 1);
        assert_eq!(page.counts.all, 2);
    }

    #[test]
    fn test_bulk_import_respects_limit() {
        let store = Store::open_in_memory().unwrap();
        let mut config = Config::default();
        config.import.max_batch = 2;
        let dir = Directory::new(store, &config);

        let batch = vec![
            ImportedContact {
                first_name: "A".to_string(),
                ..Default::default()
            },
            ImportedContact {
                first_name: "B".to_string(),
                ..Default::default()
            },
            ImportedContact {
                first_name: "C".to_string(),
                ..Default::default()
            },
        ];

        let err = dir.bulk_import("acct", batch.clone()).unwrap_err();
        assert!(matches!(err, Error::BatchTooLarge { limit: 2 }));

        assert_eq!(dir.bulk_import("acct", batch[..2].to_vec()).unwrap(), 2);
    }

    #[test]
    fn test_bulk_import_records_are_stored() {
        let dir = create_test_directory();
        let batch = vec![ImportedContact {
            first_name: "Sam".to_string(),
            last_name: "Rivera".to_string(),
            phones: vec![Phone {
                label: "Mobile".to_string(),
                number: "+1 555 0100".to_string(),
            }],
            emails: vec![Email {
                label: "Work".to_string(),
                address: "sam@example.com".to_string(),
            }],
            ..Default::default()
        }];

        dir.bulk_import("acct", batch).unwrap();
        let page = dir.list_contacts("acct", ContactTab::All, None).unwrap();
        assert_eq!(page.contacts.len(), 1);
        assert_eq!(page.contacts[0].contact.phones.len(), 1);
        assert!(!page.contacts[0].contact.is_emergency_safe);
    }

    #[test]
    fn test_reset_keeps_duress_settings() {
        let dir = create_test_directory();
        add_contact(&dir, "acct", "Alice", false);
        dir.access_mode().enable_with_pin("acct", "123456").unwrap();

        dir.reset_all_data("acct").unwrap();

        let page = dir.list_contacts("acct", ContactTab::All, None).unwrap();
        assert!(page.contacts.is_empty());

        let settings = dir.access_mode().get("acct").unwrap();
        assert!(settings.enabled);
        assert!(settings.has_pin);
    }

    // Two accounts exercising the whole gate end to end.
    #[test]
    fn test_two_account_duress_walkthrough() {
        let dir = create_test_directory();

        // Alice keeps her family visible under duress, a journalist contact not
        let family = add_contact(&dir, "alice", "Mira", true);
        let source = add_contact(&dir, "alice", "Jonas", false);

        // Bob has his own directory, never touches duress mode
        let bobs = add_contact(&dir, "bob", "Petra", false);

        // Alice shares Jonas with a colleague before anything happens
        let link = dir
            .shares()
            .issue("alice", ResourceRef::Contact(source), Some(7))
            .unwrap();

        // Alice is coerced into opening her directory
        dir.access_mode().enable_with_pin("alice", "483920").unwrap();

        // Jonas is gone from every read Alice's coercer can make
        assert!(dir.get_contact("alice", source).unwrap().is_none());
        let page = dir.list_contacts("alice", ContactTab::All, None).unwrap();
        assert_eq!(page.contacts.len(), 1);
        assert_eq!(page.contacts[0].contact.id, Some(family));
        let page = dir
            .list_contacts("alice", ContactTab::All, Some("Jonas"))
            .unwrap();
        assert!(page.contacts.is_empty());

        // Bob's directory is untouched
        assert!(dir.get_contact("bob", bobs).unwrap().is_some());

        // The colleague's link still resolves to Jonas
        match dir.shares().resolve(&link.token).unwrap() {
            ResourceSnapshot::Contact(c) => assert_eq!(c.first_name, "Jonas"),
            ResourceSnapshot::Group { .. } => panic!("expected a contact snapshot"),
        }

        // Later, Alice turns the mode off and everything is back
        dir.access_mode().set_enabled("alice", false).unwrap();
        assert!(dir.get_contact("alice", source).unwrap().is_some());
        let page = dir.list_contacts("alice", ContactTab::All, None).unwrap();
        assert_eq!(page.contacts.len(), 2);
    }
}
