//! # HTTP routes
//!
//! [`router`] exposes the login flow to the host application:
//!
//! | Path | Handler |
//! |------|---------|
//! | `GET /google_login` | [`GoogleLogin::initiate`] |
//! | `GET /google_login/callback` | [`GoogleLogin::handle_callback`] |
//! | `GET /logout` | [`GoogleLogin::terminate_session`], behind [`RequireUser`] |
//! | `GET /api/auth/me` | the logged-in user as JSON, or `null` |
//!
//! The router expects a `tower_sessions::SessionManagerLayer` to be applied by the host.

use axum::extract::{FromRequestParts, OriginalUri, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use tower_sessions::Session;
use uuid::Uuid;

use crate::auth::{self, FlowRedirect, GoogleLogin, RequestContext, CALLBACK_PATH};
use crate::models::UserInfo;

/// Routes of the login flow, with the handler as state.
pub fn router(login: GoogleLogin) -> Router {
    Router::new()
        .route("/google_login", get(google_login))
        .route(CALLBACK_PATH, get(google_callback))
        .route("/logout", get(logout))
        .route("/api/auth/me", get(current_user))
        .with_state(login)
}

fn request_context(headers: &HeaderMap, uri: &OriginalUri) -> RequestContext {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| uri.0.authority().map(|a| a.to_string()));
    let path_and_query = uri
        .0
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    RequestContext::new(host.as_deref(), path_and_query)
}

async fn google_login(
    State(login): State<GoogleLogin>,
    headers: HeaderMap,
    uri: OriginalUri,
) -> FlowRedirect {
    login.initiate(&request_context(&headers, &uri)).await
}

async fn google_callback(
    State(login): State<GoogleLogin>,
    headers: HeaderMap,
    uri: OriginalUri,
    session: Session,
) -> FlowRedirect {
    login
        .handle_callback(&request_context(&headers, &uri), &session)
        .await
}

async fn logout(State(login): State<GoogleLogin>, user: RequireUser) -> FlowRedirect {
    tracing::info!(user_id = %user.user_id, "Logging out");
    login.terminate_session(&user.session).await
}

async fn current_user(
    State(login): State<GoogleLogin>,
    session: Session,
) -> Result<Json<Option<UserInfo>>, (StatusCode, String)> {
    let internal = |e: crate::error::AuthError| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string());

    let Some(user_id) = auth::current_user_id(&session).await.map_err(internal)? else {
        return Ok(Json(None));
    };
    let user = login.users().find_by_id(user_id).await.map_err(internal)?;
    Ok(Json(user.map(|u| u.to_info())))
}

/// Extractor that only succeeds when the session is bound to a user.
pub struct RequireUser {
    pub user_id: Uuid,
    pub session: Session,
}

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;

        match auth::current_user_id(&session).await {
            Ok(Some(user_id)) => Ok(Self { user_id, session }),
            Ok(None) => Err((StatusCode::UNAUTHORIZED, "Login required")),
            Err(e) => {
                tracing::error!("Failed to read session: {}", e);
                Err((StatusCode::INTERNAL_SERVER_ERROR, "Session unavailable"))
            }
        }
    }
}
