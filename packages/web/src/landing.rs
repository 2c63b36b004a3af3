//! Landing page every login outcome redirects to.

use axum::extract::{Query, State};
use axum::response::Html;
use login::{auth, GoogleLogin};
use serde::Deserialize;
use tower_sessions::Session;

/// Query parameters the login flow may attach.
#[derive(Debug, Default, Deserialize)]
pub struct LandingQuery {
    error: Option<String>,
    auth_error: Option<String>,
    auth_success: Option<String>,
}

pub async fn index(
    State(login): State<GoogleLogin>,
    Query(query): Query<LandingQuery>,
    session: Session,
) -> Html<String> {
    let user = match auth::current_user_id(&session).await {
        Ok(Some(id)) => login.users().find_by_id(id).await.unwrap_or_else(|e| {
            tracing::error!("Failed to load session user: {}", e);
            None
        }),
        Ok(None) => None,
        Err(e) => {
            tracing::error!("Failed to read session: {}", e);
            None
        }
    };

    let mut body = String::from("<!DOCTYPE html><html><head><title>Sign in</title></head><body>");

    if let Some(message) = query.error.as_deref().or(query.auth_error.as_deref()) {
        body.push_str(&format!("<p class=\"error\">{}</p>", escape(message)));
    }
    if query.auth_success.is_some() && user.is_some() {
        body.push_str("<p class=\"success\">Signed in with Google.</p>");
    }

    match user {
        Some(user) => body.push_str(&format!(
            "<p>Signed in as {} ({})</p><a href=\"/logout\">Log out</a>",
            escape(&user.name),
            escape(&user.email)
        )),
        None if login.config().is_configured() => {
            body.push_str("<a href=\"/google_login\">Continue with Google</a>")
        }
        None => body.push_str("<p>Google sign-in is not configured.</p>"),
    }

    body.push_str("</body></html>");
    Html(body)
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
