//! # User model
//!
//! [`User`] is a row of the `users` table. Email is unique and is the only link between a
//! Google identity and a local user; Google's subject id is never stored. Rows are
//! created on first login and never updated afterwards, so a later change of the name on
//! the Google account is not reflected here.
//!
//! [`UserInfo`] is the subset returned to the browser by `/api/auth/me`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Full user record from the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A user not yet persisted anywhere.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }

    /// Convert to UserInfo for client consumption.
    pub fn to_info(&self) -> UserInfo {
        UserInfo {
            id: self.id.to_string(),
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

/// User information safe to send to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub name: String,
}
