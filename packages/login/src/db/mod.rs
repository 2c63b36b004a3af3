//! # Database module — PostgreSQL connection pool and migrations
//!
//! [`connect`] opens the pool the host application owns and passes to
//! [`PgUserStore`](crate::store::PgUserStore) and the session store. [`MIGRATOR`]
//! embeds the SQL files under `migrations/`; run it once at startup.

mod pool;

pub use pool::{connect, MIGRATOR};
