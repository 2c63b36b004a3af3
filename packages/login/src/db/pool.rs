//! Database connection pool.

use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Migrations for the `users` table.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Open a connection pool to `database_url`.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
}
