//! # Login crate — Google sign-in for the host application
//!
//! This crate implements the server side of Google's OAuth 2.0 Authorization Code flow:
//! send the browser to Google, take the code Google sends back, exchange it for tokens,
//! read the user's profile, and bind a local user to the session.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | Configuration, provider calls, the [`GoogleLogin`] flow controller, session helpers |
//! | [`db`] | PostgreSQL connection pool and migrations |
//! | [`error`] | [`AuthError`], the failure type of every flow step |
//! | [`models`] | The `User` row and its client-safe projection `UserInfo` |
//! | [`routes`] | The axum router exposing the flow over HTTP |
//! | [`store`] | The [`UserStore`] seam with Postgres and in-memory implementations |
//!
//! ## Flow
//!
//! 1. `GET /google_login` fetches Google's discovery document and redirects to its
//!    authorization endpoint with the callback URI and the fixed scope list.
//! 2. `GET /google_login/callback?code=...` exchanges the code, fetches userinfo, rejects
//!    unverified emails, finds or creates the user by email, binds the session and
//!    stores the Google credentials in it.
//! 3. `GET /logout` removes the credentials and the binding.
//!
//! Every outcome, success or failure, is a redirect to the landing route.

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod store;

pub use auth::{GoogleLogin, OAuthConfig};
pub use error::AuthError;
pub use models::{User, UserInfo};
pub use routes::{router, RequireUser};
pub use store::{MemoryUserStore, PgUserStore, UserStore};
