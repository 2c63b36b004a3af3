//! Error type shared by every step of the login flow.
//!
//! Each step returns `Result<_, AuthError>`; [`GoogleLogin`](crate::auth::GoogleLogin)
//! stops at the first error and turns it into a redirect to the landing route. The
//! `Display` text is what ends up in the redirect's query string, so it is written for
//! the person looking at the browser.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Client id or secret missing from configuration.
    #[error("Google OAuth credentials are not configured")]
    NotConfigured,

    /// Network or HTTP-status failure talking to a provider endpoint.
    #[error("Google is unreachable: {0}")]
    ProviderUnreachable(String),

    /// The provider answered, but not with what we expected.
    #[error("Unexpected response from Google: {0}")]
    ProviderMalformedResponse(String),

    /// The provider redirected back with an `error` parameter instead of a code.
    #[error("Google sign-in was not completed: {0}")]
    AuthorizationDenied(String),

    #[error("Authorization code missing from callback")]
    MissingCode,

    /// No deployment host configured and the request carried no `Host` header.
    #[error("Cannot determine the callback URL for this request")]
    UnknownHost,

    #[error("User email not verified by Google")]
    EmailNotVerified,

    /// The local HTTP client could not be built.
    #[error("HTTP client setup failed: {0}")]
    HttpClient(String),

    /// User store or session store rejected a read or write.
    #[error("Storage failure: {0}")]
    StoreFailure(String),
}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        AuthError::StoreFailure(e.to_string())
    }
}

impl From<tower_sessions::session::Error> for AuthError {
    fn from(e: tower_sessions::session::Error) -> Self {
        AuthError::StoreFailure(e.to_string())
    }
}
