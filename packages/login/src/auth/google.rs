//! # Google OAuth 2.0 provider calls
//!
//! The three HTTP interactions with Google that sit behind the login flow, each a plain
//! function returning `Result<_, AuthError>`:
//!
//! - [`authorization_url`] builds the URL the browser is sent to. It carries
//!   `response_type=code`, the client id, the callback URI and the scope list, and
//!   nothing else: no `state`, no PKCE challenge.
//! - [`exchange_code`] trades the authorization code for tokens at the token endpoint,
//!   authenticating with the client id and secret as HTTP Basic credentials.
//! - [`fetch_userinfo`] reads the profile claims with the access token.
//!
//! [`GoogleUserInfo`] holds the claims and the policy applied to them: the email must be
//! verified, and the display name falls back from `name` to `given_name` to `"User"`.

use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, EndpointNotSet, EndpointSet, RedirectUrl, RequestTokenError,
    TokenResponse, TokenUrl,
};
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use url::Url;

use super::config::ClientCredentials;
use crate::error::AuthError;

/// Display name used when Google reports neither `name` nor `given_name`.
pub const DEFAULT_DISPLAY_NAME: &str = "User";

/// OAuth client type with only the token URL set.
type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// Tokens returned by the code exchange.
#[derive(Debug, Clone)]
pub struct GoogleTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Google userinfo claims. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleUserInfo {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub email_verified: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
}

impl GoogleUserInfo {
    /// The email address, provided Google has verified it.
    pub fn verified_email(&self) -> Result<&str, AuthError> {
        if !self.email_verified {
            return Err(AuthError::EmailNotVerified);
        }
        self.email
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AuthError::ProviderMalformedResponse("userinfo has no email".into()))
    }

    /// `name`, else `given_name`, else [`DEFAULT_DISPLAY_NAME`].
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.given_name.as_deref())
            .unwrap_or(DEFAULT_DISPLAY_NAME)
    }
}

/// Google sends `email_verified` as a JSON bool, but some endpoints use `"true"`.
fn flexible_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        Str(String),
    }

    Ok(match Option::<BoolOrString>::deserialize(deserializer)? {
        Some(BoolOrString::Bool(b)) => b,
        Some(BoolOrString::Str(s)) => s.eq_ignore_ascii_case("true"),
        None => false,
    })
}

/// Build the authorization request URL.
pub fn authorization_url(
    authorization_endpoint: &str,
    credentials: &ClientCredentials,
    redirect_url: &RedirectUrl,
    scopes: &[&str],
) -> Result<Url, AuthError> {
    let auth_url = AuthUrl::new(authorization_endpoint.to_string()).map_err(|e| {
        AuthError::ProviderMalformedResponse(format!("authorization endpoint: {e}"))
    })?;

    let mut url = auth_url.url().clone();
    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", credentials.client_id.as_str())
        .append_pair("redirect_uri", redirect_url.as_str())
        .append_pair("scope", &scopes.join(" "));
    Ok(url)
}

fn create_client(
    credentials: &ClientCredentials,
    token_endpoint: &str,
    redirect_url: &RedirectUrl,
) -> Result<ConfiguredClient, AuthError> {
    let token_url = TokenUrl::new(token_endpoint.to_string())
        .map_err(|e| AuthError::ProviderMalformedResponse(format!("token endpoint: {e}")))?;

    Ok(BasicClient::new(credentials.client_id.clone())
        .set_client_secret(credentials.client_secret.clone())
        .set_token_uri(token_url)
        .set_redirect_uri(redirect_url.clone()))
}

/// Exchange an authorization code for tokens.
///
/// `http` must not follow redirects.
pub async fn exchange_code(
    http: &Client,
    credentials: &ClientCredentials,
    token_endpoint: &str,
    redirect_url: &RedirectUrl,
    code: &str,
) -> Result<GoogleTokens, AuthError> {
    let client = create_client(credentials, token_endpoint, redirect_url)?;

    let token_result = client
        .exchange_code(AuthorizationCode::new(code.to_string()))
        .request_async(http)
        .await
        .map_err(|e| match e {
            RequestTokenError::ServerResponse(resp) => {
                AuthError::ProviderUnreachable(format!("token exchange rejected: {resp}"))
            }
            RequestTokenError::Request(err) => {
                AuthError::ProviderUnreachable(format!("token exchange failed: {err}"))
            }
            RequestTokenError::Parse(err, _) => {
                AuthError::ProviderMalformedResponse(format!("token response: {err}"))
            }
            RequestTokenError::Other(msg) => {
                AuthError::ProviderMalformedResponse(format!("token response: {msg}"))
            }
        })?;

    Ok(GoogleTokens {
        access_token: token_result.access_token().secret().clone(),
        refresh_token: token_result.refresh_token().map(|t| t.secret().clone()),
    })
}

/// Fetch the profile claims for the holder of `access_token`.
pub async fn fetch_userinfo(
    http: &Client,
    userinfo_endpoint: &str,
    access_token: &str,
) -> Result<GoogleUserInfo, AuthError> {
    http.get(userinfo_endpoint)
        .bearer_auth(access_token)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| AuthError::ProviderUnreachable(format!("userinfo: {e}")))?
        .json()
        .await
        .map_err(|e| AuthError::ProviderMalformedResponse(format!("userinfo: {e}")))
}
