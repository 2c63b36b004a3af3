use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::routing::get;
use axum::Router;
use login::{GoogleLogin, MemoryUserStore, OAuthConfig, PgUserStore, UserStore};
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::EnvFilter;

mod landing;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const SESSION_INACTIVITY: Duration = Duration::from_secs(60 * 60 * 24 * 7);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = OAuthConfig::from_env().map_err(anyhow::Error::msg)?;
    config.log_setup();

    let router = match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = login::db::connect(&database_url)
                .await
                .context("Failed to connect to database")?;
            login::db::MIGRATOR
                .run(&pool)
                .await
                .context("Failed to run migrations")?;

            let session_store = PostgresStore::new(pool.clone());
            session_store
                .migrate()
                .await
                .context("Failed to migrate session store")?;

            app(config, Arc::new(PgUserStore::new(pool)), session_store)?
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; users and sessions are kept in memory");
            app(config, Arc::new(MemoryUserStore::new()), MemoryStore::default())?
        }
    };

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router.into_make_service())
        .await
        .context("Server error")
}

/// The landing page plus the login routes, behind a session layer over `session_store`.
fn app<S>(
    config: OAuthConfig,
    users: Arc<dyn UserStore>,
    session_store: S,
) -> anyhow::Result<Router>
where
    S: SessionStore + Clone,
{
    let google = GoogleLogin::new(config, users).context("Failed to create Google login")?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(true)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(
            SESSION_INACTIVITY
                .try_into()
                .context("Invalid session expiry")?,
        ));

    Ok(Router::new()
        .route(&google.config().landing_path, get(landing::index))
        .with_state(google.clone())
        .merge(login::router(google))
        .layer(session_layer))
}
