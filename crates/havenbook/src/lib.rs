//! `havenbook` - A personal contact vault with a duress-mode gate
//!
//! This library stores contacts, groups, and relationships in a local
//! `SQLite` database behind a single [`Directory`] facade. A PIN-guarded
//! duress mode narrows every read to the contacts explicitly marked
//! emergency-safe, and share links grant capability-style read access to
//! individual records.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod contact;
pub mod directory;
pub mod duress;
pub mod error;
pub mod logging;
pub mod share;
pub mod store;

pub use config::Config;
pub use contact::{ContactPatch, ContactRecord, ContactStatus, ImportedContact};
pub use directory::{ContactPage, ContactView, Directory};
pub use duress::{AccessModeStore, SafeSetFilter};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use share::{Permission, ResourceRef, ResourceSnapshot, ShareLink, ShareLinks};
pub use store::{ContactQuery, ContactTab, Store};
