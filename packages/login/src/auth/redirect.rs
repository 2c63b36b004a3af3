//! Redirect targets: the callback URI sent to Google and the landing-route redirects the
//! flow ends with.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use oauth2::RedirectUrl;
use url::form_urlencoded;

use super::config::{OAuthConfig, CALLBACK_PATH};
use crate::error::AuthError;

/// What the inbound request tells us about where it was addressed.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Value of the `Host` header.
    pub host: Option<String>,
    /// Path and query of the request, e.g. `/google_login/callback?code=...`.
    pub path_and_query: String,
}

impl RequestContext {
    pub fn new(host: Option<&str>, path_and_query: impl Into<String>) -> Self {
        Self {
            host: host.map(str::to_string),
            path_and_query: path_and_query.into(),
        }
    }

    /// The full request URL as seen by the browser, with the scheme forced to https.
    pub fn secure_url(&self) -> Result<String, AuthError> {
        let host = self.host.as_deref().ok_or(AuthError::UnknownHost)?;
        Ok(force_https(&format!("http://{host}{}", self.path_and_query)))
    }
}

/// Rewrite an `http://` URL to `https://`. Anything else is returned unchanged.
pub fn force_https(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}

/// The callback URI for this request: the configured one if a deployment host was set,
/// else one derived from the request's host.
pub fn resolve_redirect_url(
    config: &OAuthConfig,
    request: &RequestContext,
) -> Result<RedirectUrl, AuthError> {
    if let Some(url) = &config.redirect_url {
        return Ok(url.clone());
    }

    let host = request
        .host
        .as_deref()
        .map(|h| h.trim_end_matches('/'))
        .filter(|h| !h.is_empty())
        .ok_or(AuthError::UnknownHost)?;
    let derived = force_https(&format!("http://{host}{CALLBACK_PATH}"));
    RedirectUrl::new(derived).map_err(|_| AuthError::UnknownHost)
}

/// A 302 redirect produced by the login flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowRedirect {
    location: String,
}

impl FlowRedirect {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// Redirect to `landing_path` with the given query parameters.
    pub fn landing(landing_path: &str, params: &[(&str, &str)]) -> Self {
        if params.is_empty() {
            return Self::to(landing_path);
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();
        let sep = if landing_path.contains('?') { '&' } else { '?' };
        Self::to(format!("{landing_path}{sep}{query}"))
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Value of query parameter `key` in the redirect target, if any.
    pub fn param(&self, key: &str) -> Option<String> {
        let (_, query) = self.location.split_once('?')?;
        form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }
}

impl IntoResponse for FlowRedirect {
    fn into_response(self) -> Response {
        (StatusCode::FOUND, [(header::LOCATION, self.location)]).into_response()
    }
}
