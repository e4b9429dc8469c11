//! Data models for Folio.
//!
//! Defines the typed records stored in each user's document (profile and
//! content collections) and the account/session records behind identity.

mod account;
mod content;
mod profile;

pub use account::*;
pub use content::*;
pub use profile::*;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Raw text fields of a submitted form, keyed by field name.
pub type FormFields = BTreeMap<String, String>;

/// Generate a new UUID
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Trimmed value of the first present field among `names`.
pub(crate) fn field(fields: &FormFields, names: &[&str]) -> String {
    names
        .iter()
        .find_map(|name| fields.get(*name))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}
