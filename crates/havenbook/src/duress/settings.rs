//! Per-account duress-mode settings.
//!
//! [`AccessModeStore`] is the only writer of the mode flag and the PIN
//! hash. The PIN precondition for enabling is enforced inside a single
//! conditional statement at the store layer, so no read-then-write gap
//! exists between checking for a PIN and flipping the flag.

use tracing::info;

use crate::duress::pin;
use crate::error::{Error, Result};
use crate::store::Store;

/// The duress-mode state of one account.
///
/// The default is the state of an account with no stored row: mode off,
/// no PIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DuressSettings {
    /// Whether duress mode is currently active.
    pub enabled: bool,
    /// Whether a PIN has been set.
    pub has_pin: bool,
}

/// Reads and mutates the per-account duress mode flag.
#[derive(Debug)]
pub struct AccessModeStore<'a> {
    store: &'a Store,
}

impl<'a> AccessModeStore<'a> {
    /// Create an access-mode store over the given record store.
    #[must_use]
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Get the account's duress settings. Accounts without a stored row
    /// get the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, account: &str) -> Result<DuressSettings> {
        let row = self.store.emergency_settings_row(account)?;
        Ok(row.map_or_else(DuressSettings::default, |(enabled, pin_hash)| {
            DuressSettings {
                enabled,
                has_pin: pin_hash.is_some(),
            }
        }))
    }

    /// Turn duress mode on or off.
    ///
    /// Enabling requires a stored PIN; the check and the flag write are a
    /// single statement. Disabling always succeeds and keeps the PIN.
    /// Both directions are idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PinRequired`] when enabling with no stored PIN,
    /// or an error if the database operation fails.
    pub fn set_enabled(&self, account: &str, enabled: bool) -> Result<DuressSettings> {
        if enabled {
            if !self.store.enable_emergency_if_pin_set(account)? {
                return Err(Error::PinRequired);
            }
            info!("Duress mode enabled");
        } else {
            self.store.disable_emergency(account)?;
            info!("Duress mode disabled");
        }
        self.get(account)
    }

    /// Turn duress mode on, storing the given PIN in the same write.
    ///
    /// This is the path for accounts that have never set a PIN: the PIN
    /// is validated, hashed, and stored together with the flag flip.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPin`] if the PIN is malformed, or an error
    /// if the database operation fails.
    pub fn enable_with_pin(&self, account: &str, pin: &str) -> Result<DuressSettings> {
        pin::validate_pin(pin)?;
        let hash = pin::hash_pin(pin);
        self.store.enable_emergency_with_pin(account, &hash)?;
        info!("Duress mode enabled with new PIN");
        self.get(account)
    }

    /// Set or replace the account's PIN without touching the mode flag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPin`] if the PIN is malformed, or an error
    /// if the database operation fails.
    pub fn set_pin(&self, account: &str, pin: &str) -> Result<DuressSettings> {
        pin::validate_pin(pin)?;
        let hash = pin::hash_pin(pin);
        self.store.set_emergency_pin(account, &hash)?;
        info!("Duress PIN updated");
        self.get(account)
    }

    /// Check a candidate PIN against the account's stored hash.
    ///
    /// Accounts with no stored PIN reject every candidate.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn verify_pin(&self, account: &str, pin: &str) -> Result<bool> {
        let row = self.store.emergency_settings_row(account)?;
        Ok(match row.and_then(|(_, hash)| hash) {
            Some(hash) => pin::verify_pin(pin, &hash),
            None => false,
        })
    }
}
