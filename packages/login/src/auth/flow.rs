//! # Login flow controller
//!
//! [`GoogleLogin`] runs the three request handlers of the login flow. Each public method
//! always produces a [`FlowRedirect`]: the fallible work happens in a private `try_*`
//! method returning `Result<_, AuthError>`, and the public method maps the first error to
//! a redirect to the landing route with the error message in the query string.
//!
//! | Method | On success | On failure |
//! |--------|-----------|------------|
//! | [`initiate`](GoogleLogin::initiate) | Google's authorization endpoint | landing, `error=` |
//! | [`handle_callback`](GoogleLogin::handle_callback) | landing, `auth_success=true` | landing, `auth_error=` (`error=` for an unverified email) |
//! | [`terminate_session`](GoogleLogin::terminate_session) | landing | landing |
//!
//! Without client credentials, `initiate` and `handle_callback` return before any
//! network call.
//!
//! No OAuth `state` parameter is issued or checked, so the callback leg does not defend
//! against cross-site request forgery.

use std::sync::Arc;

use reqwest::Client;
use tower_sessions::Session;

use super::config::{ClientCredentials, OAuthConfig, GOOGLE_TOKEN_URI, SCOPES};
use super::discovery::DiscoveryDocument;
use super::google::{self, GoogleTokens};
use super::redirect::{resolve_redirect_url, FlowRedirect, RequestContext};
use super::session::{self, StoredCredentials};
use crate::error::AuthError;
use crate::models::User;
use crate::store::UserStore;

/// Google login handler.
#[derive(Clone)]
pub struct GoogleLogin {
    config: Arc<OAuthConfig>,
    http: Client,
    users: Arc<dyn UserStore>,
}

impl GoogleLogin {
    /// Create a new Google login handler.
    pub fn new(config: OAuthConfig, users: Arc<dyn UserStore>) -> Result<Self, AuthError> {
        let http = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AuthError::HttpClient(e.to_string()))?;

        Ok(Self {
            config: Arc::new(config),
            http,
            users,
        })
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    fn landing(&self, params: &[(&str, &str)]) -> FlowRedirect {
        FlowRedirect::landing(&self.config.landing_path, params)
    }

    /// Start the login: redirect the browser to Google.
    pub async fn initiate(&self, request: &RequestContext) -> FlowRedirect {
        let Some(credentials) = &self.config.credentials else {
            tracing::warn!("Google login requested but OAuth credentials are not configured");
            return self.landing(&[("error", AuthError::NotConfigured.to_string().as_str())]);
        };

        match self.try_initiate(credentials, request).await {
            Ok(url) => FlowRedirect::to(url),
            Err(e) => {
                tracing::error!("Error starting Google authentication: {}", e);
                self.landing(&[("error", e.to_string().as_str())])
            }
        }
    }

    async fn try_initiate(
        &self,
        credentials: &ClientCredentials,
        request: &RequestContext,
    ) -> Result<String, AuthError> {
        let discovery = DiscoveryDocument::fetch(&self.http, &self.config.discovery_url).await?;
        let redirect_url = resolve_redirect_url(&self.config, request)?;
        tracing::info!("Using redirect URI for auth: {}", redirect_url.as_str());

        let url = google::authorization_url(
            &discovery.authorization_endpoint,
            credentials,
            &redirect_url,
            &SCOPES,
        )?;
        Ok(url.to_string())
    }

    /// Finish the login after Google redirects back with an authorization code.
    pub async fn handle_callback(
        &self,
        request: &RequestContext,
        session: &Session,
    ) -> FlowRedirect {
        let Some(credentials) = &self.config.credentials else {
            return self.landing(&[]);
        };

        match self.try_callback(credentials, request, session).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Google login succeeded");
                self.landing(&[("auth_success", "true")])
            }
            Err(AuthError::EmailNotVerified) => {
                tracing::warn!("Google login rejected: email not verified");
                self.landing(&[("error", AuthError::EmailNotVerified.to_string().as_str())])
            }
            Err(e) => {
                tracing::error!("Error in Google callback: {}", e);
                self.landing(&[("auth_error", e.to_string().as_str())])
            }
        }
    }

    async fn try_callback(
        &self,
        credentials: &ClientCredentials,
        request: &RequestContext,
        session: &Session,
    ) -> Result<User, AuthError> {
        let discovery = DiscoveryDocument::fetch(&self.http, &self.config.discovery_url).await?;
        let redirect_url = resolve_redirect_url(&self.config, request)?;
        tracing::info!("Using redirect URI for token: {}", redirect_url.as_str());

        let code = authorization_code(request)?;
        let tokens = google::exchange_code(
            &self.http,
            credentials,
            &discovery.token_endpoint,
            &redirect_url,
            &code,
        )
        .await?;

        let userinfo =
            google::fetch_userinfo(&self.http, &discovery.userinfo_endpoint, &tokens.access_token)
                .await?;
        let email = userinfo.verified_email()?;
        let name = userinfo.display_name();

        let user = match self.users.find_by_email(email).await? {
            Some(user) => user,
            None => {
                tracing::info!(email, "Creating user on first Google login");
                self.users.create(name, email).await?
            }
        };

        session::bind_user(session, &user).await?;
        if let Err(e) =
            session::store_credentials(session, &self.stored_credentials(credentials, tokens)).await
        {
            // Do not leave a login behind without its credentials
            session::unbind_user(session).await.ok();
            return Err(e);
        }

        Ok(user)
    }

    fn stored_credentials(
        &self,
        credentials: &ClientCredentials,
        tokens: GoogleTokens,
    ) -> StoredCredentials {
        StoredCredentials {
            token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_uri: GOOGLE_TOKEN_URI.to_string(),
            client_id: credentials.client_id.as_str().to_string(),
            client_secret: credentials.client_secret.secret().clone(),
            scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Log out: forget the stored credentials and the user binding.
    pub async fn terminate_session(&self, session: &Session) -> FlowRedirect {
        if let Err(e) = session::remove_credentials(session).await {
            tracing::error!("Failed to remove stored credentials: {}", e);
        }
        if let Err(e) = session::unbind_user(session).await {
            tracing::error!("Failed to clear session user: {}", e);
        }
        self.landing(&[])
    }
}

/// Read the authorization code from the callback URL, normalised to https.
fn authorization_code(request: &RequestContext) -> Result<String, AuthError> {
    let response = url::Url::parse(&request.secure_url()?)
        .map_err(|e| AuthError::ProviderMalformedResponse(format!("callback URL: {e}")))?;

    let mut code = None;
    for (key, value) in response.query_pairs() {
        match key.as_ref() {
            "error" => return Err(AuthError::AuthorizationDenied(value.into_owned())),
            "code" if !value.is_empty() => code = Some(value.into_owned()),
            _ => {}
        }
    }
    code.ok_or(AuthError::MissingCode)
}
