//! Safe-set narrowing for duress mode.
//!
//! Every read path that can expose contact data passes through a
//! [`SafeSetFilter`]. The filter captures the account's mode flag at
//! construction time and applies one predicate everywhere: while duress
//! mode is active, only contacts flagged emergency-safe are visible.
//! Listings are narrowed, single fetches are concealed as plain
//! not-found, and member counts shrink to the safe members.
//!
//! Share-link resolution deliberately does not construct a filter: a
//! link is a capability the owner issued before the mode changed, and
//! its audience is not the person under duress.

use crate::contact::ContactRecord;
use crate::duress::settings::AccessModeStore;
use crate::error::Result;
use crate::store::{ContactQuery, Store};

/// A point-in-time capture of one account's duress flag, applied as a
/// visibility predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafeSetFilter {
    active: bool,
}

impl SafeSetFilter {
    /// Build a filter from the account's current mode flag.
    ///
    /// Callers construct a fresh filter per read, so flag changes take
    /// effect on the next read without any cache to invalidate.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings lookup fails.
    pub fn for_account(store: &Store, account: &str) -> Result<Self> {
        let settings = AccessModeStore::new(store).get(account)?;
        Ok(Self {
            active: settings.enabled,
        })
    }

    /// A filter that narrows nothing, for paths exempt from the gate.
    #[must_use]
    pub fn inactive() -> Self {
        Self { active: false }
    }

    /// Whether duress narrowing is in effect.
    #[must_use]
    pub fn is_active(self) -> bool {
        self.active
    }

    /// Narrow a listing query to the safe set when active.
    #[must_use]
    pub fn narrow(self, mut query: ContactQuery) -> ContactQuery {
        if self.active {
            query.safe_only = true;
        }
        query
    }

    /// Conceal a single fetched contact when active and not safe.
    ///
    /// The concealed outcome is identical to the contact not existing;
    /// callers must not distinguish the two.
    #[must_use]
    pub fn conceal(self, contact: Option<ContactRecord>) -> Option<ContactRecord> {
        match contact {
            Some(c) if self.active && !c.is_emergency_safe => None,
            other => other,
        }
    }

    /// Count visible members given their emergency-safe flags.
    #[must_use]
    pub fn member_count(self, safe_flags: &[bool]) -> usize {
        if self.active {
            safe_flags.iter().filter(|safe| **safe).count()
        } else {
            safe_flags.len()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duress::settings::AccessModeStore;

    fn create_test_store() -> Store {
        Store::open_in_memory().expect("failed to create test store")
    }

    fn contact(safe: bool) -> ContactRecord {
        let mut c = ContactRecord::new("Alice", "Nguyen");
        c.is_emergency_safe = safe;
        c
    }

    #[test]
    fn test_filter_reflects_mode_flag() {
        let store = create_test_store();
        let modes = AccessModeStore::new(&store);

        let filter = SafeSetFilter::for_account(&store, "acct").unwrap();
        assert!(!filter.is_active());

        modes.enable_with_pin("acct", "123456").unwrap();
        let filter = SafeSetFilter::for_account(&store, "acct").unwrap();
        assert!(filter.is_active());

        modes.set_enabled("acct", false).unwrap();
        let filter = SafeSetFilter::for_account(&store, "acct").unwrap();
        assert!(!filter.is_active());
    }

    #[test]
    fn test_inactive_filter_narrows_nothing() {
        let filter = SafeSetFilter::inactive();

        let query = filter.narrow(ContactQuery::for_account("acct"));
        assert!(!query.safe_only);

        assert!(filter.conceal(Some(contact(false))).is_some());
        assert_eq!(filter.member_count(&[true, false, false]), 3);
    }

    #[test]
    fn test_active_filter_narrows_query() {
        let store = create_test_store();
        AccessModeStore::new(&store)
            .enable_with_pin("acct", "123456")
            .unwrap();

        let filter = SafeSetFilter::for_account(&store, "acct").unwrap();
        let query = filter.narrow(ContactQuery::for_account("acct"));
        assert!(query.safe_only);
    }

    #[test]
    fn test_active_filter_conceals_unsafe_contact() {
        let store = create_test_store();
        AccessModeStore::new(&store)
            .enable_with_pin("acct", "123456")
            .unwrap();
        let filter = SafeSetFilter::for_account(&store, "acct").unwrap();

        assert!(filter.conceal(Some(contact(false))).is_none());
        assert!(filter.conceal(Some(contact(true))).is_some());
        assert!(filter.conceal(None).is_none());
    }

    #[test]
    fn test_active_filter_counts_safe_members_only() {
        let store = create_test_store();
        AccessModeStore::new(&store)
            .enable_with_pin("acct", "123456")
            .unwrap();
        let filter = SafeSetFilter::for_account(&store, "acct").unwrap();

        assert_eq!(filter.member_count(&[true, false, true, false]), 2);
        assert_eq!(filter.member_count(&[]), 0);
    }

    #[test]
    fn test_filter_is_per_account() {
        let store = create_test_store();
        AccessModeStore::new(&store)
            .enable_with_pin("alice", "123456")
            .unwrap();

        assert!(SafeSetFilter::for_account(&store, "alice")
            .unwrap()
            .is_active());
        assert!(!SafeSetFilter::for_account(&store, "bob")
            .unwrap()
            .is_active());
    }
}
