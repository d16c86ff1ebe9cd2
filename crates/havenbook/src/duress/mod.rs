//! Duress-mode gate for havenbook.
//!
//! Duress mode (also surfaced as "emergency mode") hides every contact
//! not explicitly flagged emergency-safe from normal reads. The gate has
//! three parts:
//!
//! - [`pin`]: PIN format rules and hashing. A PIN must exist before the
//!   mode can ever be switched on.
//! - [`AccessModeStore`]: reads and mutates the per-account mode flag,
//!   enforcing the PIN precondition atomically.
//! - [`SafeSetFilter`]: a point-in-time capture of the flag that narrows
//!   record queries. Read paths construct a fresh filter per request, so
//!   a flag change is honored by the next read with no cache to refresh.

pub mod filter;
pub mod pin;
pub mod settings;

pub use filter::SafeSetFilter;
pub use settings::{AccessModeStore, DuressSettings};
