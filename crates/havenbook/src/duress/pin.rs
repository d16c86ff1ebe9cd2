//! PIN format rules and hashing for the duress gate.
//!
//! PINs are exactly six decimal digits. They are never stored in the
//! clear; a keyed `BLAKE3` derivation keeps the stored hash from being a
//! plain rainbow-table target.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Context string for the PIN key derivation. Changing this invalidates
/// every stored hash.
const PIN_HASH_CONTEXT: &str = "havenbook 2025-06-01 duress pin v1";

/// Regex accepting exactly six decimal digits.
fn pin_format() -> &'static Regex {
    static PIN_FORMAT: OnceLock<Regex> = OnceLock::new();
    PIN_FORMAT.get_or_init(|| Regex::new(r"^\d{6}$").expect("PIN format regex is valid"))
}

/// Validate that a candidate PIN is exactly six decimal digits.
///
/// # Errors
///
/// Returns [`Error::InvalidPin`] for any other length or any non-digit
/// character, including Unicode digits outside ASCII.
pub fn validate_pin(pin: &str) -> Result<()> {
    if pin.is_ascii() && pin_format().is_match(pin) {
        Ok(())
    } else {
        Err(Error::InvalidPin)
    }
}

/// Hash a PIN for storage.
///
/// The input is assumed to have passed [`validate_pin`].
#[must_use]
pub fn hash_pin(pin: &str) -> String {
    let key = blake3::derive_key(PIN_HASH_CONTEXT, pin.as_bytes());
    blake3::Hash::from_bytes(key).to_hex().to_string()
}

/// Check a candidate PIN against a stored hash.
#[must_use]
pub fn verify_pin(pin: &str, stored_hash: &str) -> bool {
    hash_pin(pin) == stored_hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_pins() {
        for pin in ["000000", "123456", "999999", "483920"] {
            assert!(validate_pin(pin).is_ok(), "rejected valid pin: {pin}");
        }
    }

    #[test]
    fn test_pin_too_short() {
        assert!(matches!(validate_pin("12345"), Err(Error::InvalidPin)));
    }

    #[test]
    fn test_pin_too_long() {
        assert!(matches!(validate_pin("1234567"), Err(Error::InvalidPin)));
    }

    #[test]
    fn test_pin_with_letter() {
        assert!(matches!(validate_pin("12a456"), Err(Error::InvalidPin)));
    }

    #[test]
    fn test_empty_pin() {
        assert!(matches!(validate_pin(""), Err(Error::InvalidPin)));
    }

    #[test]
    fn test_pin_with_whitespace() {
        assert!(validate_pin(" 123456").is_err());
        assert!(validate_pin("123456 ").is_err());
        assert!(validate_pin("123 56").is_err());
    }

    #[test]
    fn test_non_ascii_digits_rejected() {
        // Arabic-Indic digits are \d in some regex flavors; not here.
        assert!(validate_pin("١٢٣٤٥٦").is_err());
    }

    #[test]
    fn test_hash_is_stable_and_distinct() {
        let a = hash_pin("123456");
        let b = hash_pin("123456");
        let c = hash_pin("123457");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_hash_is_not_plaintext() {
        let hash = hash_pin("123456");
        assert_ne!(hash, "123456");
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn test_verify_pin() {
        let hash = hash_pin("483920");
        assert!(verify_pin("483920", &hash));
        assert!(!verify_pin("483921", &hash));
    }
}
