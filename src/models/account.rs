//! Account and session records.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account row. Never serialized to clients (carries the password hash).
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
    pub last_login: Option<String>,
}

impl Account {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.id.clone(),
            email: self.email.clone(),
        }
    }
}

/// Session row, keyed by the hash of its bearer token.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub token_hash: String,
    pub created_at: String,
    pub expires_at: String,
    pub last_used: Option<String>,
}

/// The signed-in user as seen by every other module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
    pub email: String,
}
