//! # User store
//!
//! The login flow needs three things from persistent storage: find a user by email, find
//! one by id (to resolve the session), and create one. [`UserStore`] is that seam.
//!
//! | Implementation | Backing |
//! |----------------|---------|
//! | [`PgUserStore`] | `users` table in PostgreSQL via SQLx |
//! | [`MemoryUserStore`] | `HashMap` behind a mutex, for tests and local runs |
//!
//! `find_by_email` followed by `create` is not atomic. Two simultaneous first logins for
//! the same address race; the unique index on `users.email` makes the loser fail with a
//! store error rather than create a duplicate.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AuthError;
use crate::models::User;

mod memory;
mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError>;

    async fn create(&self, name: &str, email: &str) -> Result<User, AuthError>;
}
