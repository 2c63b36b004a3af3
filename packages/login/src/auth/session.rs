//! Session data types and accessors.
//!
//! Two keys are kept in the `tower_sessions::Session`: the id of the logged-in user, and
//! the Google credentials obtained at login, stored as one serialized value.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::AuthError;
use crate::models::User;

/// Key for storing user ID in session.
pub const SESSION_USER_ID_KEY: &str = "user_id";

/// Key for storing Google credentials in session.
pub const SESSION_CREDENTIALS_KEY: &str = "credentials";

/// Google credentials kept for API calls made later on the user's behalf.
///
/// Field names follow Google's authorized-user credential format so the value can be
/// handed to Google client libraries unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub token: String,
    pub refresh_token: Option<String>,
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    pub scopes: Vec<String>,
}

/// Associate the session with `user`.
pub async fn bind_user(session: &Session, user: &User) -> Result<(), AuthError> {
    session
        .insert(SESSION_USER_ID_KEY, user.id.to_string())
        .await?;
    Ok(())
}

/// Drop the session's association with a user. No-op if there is none.
pub async fn unbind_user(session: &Session) -> Result<(), AuthError> {
    session.remove::<String>(SESSION_USER_ID_KEY).await?;
    Ok(())
}

/// Id of the user bound to this session, if any.
pub async fn current_user_id(session: &Session) -> Result<Option<Uuid>, AuthError> {
    let user_id: Option<String> = session.get(SESSION_USER_ID_KEY).await?;
    user_id
        .map(|id| {
            Uuid::parse_str(&id)
                .map_err(|e| AuthError::StoreFailure(format!("session user id: {e}")))
        })
        .transpose()
}

pub async fn store_credentials(
    session: &Session,
    credentials: &StoredCredentials,
) -> Result<(), AuthError> {
    session.insert(SESSION_CREDENTIALS_KEY, credentials).await?;
    Ok(())
}

/// Credentials stored at login, if any.
pub async fn stored_credentials(
    session: &Session,
) -> Result<Option<StoredCredentials>, AuthError> {
    Ok(session.get(SESSION_CREDENTIALS_KEY).await?)
}

/// Remove stored credentials. No-op if there are none.
pub async fn remove_credentials(session: &Session) -> Result<(), AuthError> {
    session
        .remove::<StoredCredentials>(SESSION_CREDENTIALS_KEY)
        .await?;
    Ok(())
}
