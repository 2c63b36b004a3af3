//! OAuth configuration from environment variables.
//!
//! The configuration is read once at process start and then shared read-only. Missing
//! client credentials are not an error: the flow runs in a degraded "not configured"
//! mode where every login attempt bounces back to the landing route.

use oauth2::{ClientId, ClientSecret, RedirectUrl};

/// Google's published OpenID discovery document.
pub const GOOGLE_DISCOVERY_URL: &str =
    "https://accounts.google.com/.well-known/openid-configuration";

/// Canonical token endpoint recorded in stored session credentials.
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Path the provider redirects back to. Must match the URI registered with Google.
pub const CALLBACK_PATH: &str = "/google_login/callback";

/// Scopes requested on every login. Drive and YouTube access is requested up front so the
/// stored credentials can be used for API calls on the user's behalf later.
pub const SCOPES: [&str; 7] = [
    "https://www.googleapis.com/auth/drive",
    "https://www.googleapis.com/auth/drive.file",
    "https://www.googleapis.com/auth/youtube",
    "https://www.googleapis.com/auth/youtube.upload",
    "openid",
    "email",
    "profile",
];

/// Client id and secret. Both must be present for the flow to be active.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
}

/// OAuth provider configuration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub credentials: Option<ClientCredentials>,
    pub discovery_url: String,
    /// Fixed callback URI, known only when a deployment host is configured.
    pub redirect_url: Option<RedirectUrl>,
    /// Route every outcome of the flow redirects to.
    pub landing_path: String,
}

impl OAuthConfig {
    /// Create the Google config from environment variables (and `.env`, if present).
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Create the Google config from an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let credentials = match (
            non_empty("GOOGLE_OAUTH_CLIENT_ID"),
            non_empty("GOOGLE_OAUTH_CLIENT_SECRET"),
        ) {
            (Some(id), Some(secret)) => Some(ClientCredentials {
                client_id: ClientId::new(id),
                client_secret: ClientSecret::new(secret),
            }),
            _ => None,
        };

        let redirect_url = non_empty("DEPLOYMENT_HOST")
            .map(|host| callback_url_for_host(&host))
            .transpose()?;

        let landing_path = non_empty("LANDING_PATH").unwrap_or_else(|| "/".to_string());
        if !landing_path.starts_with('/') || landing_path.contains('?') {
            return Err(format!(
                "LANDING_PATH must be an absolute path without a query: {landing_path}"
            ));
        }

        Ok(Self {
            credentials,
            discovery_url: non_empty("GOOGLE_DISCOVERY_URL")
                .unwrap_or_else(|| GOOGLE_DISCOVERY_URL.to_string()),
            redirect_url,
            landing_path,
        })
    }

    /// Config with credentials and an optional deployment host, pointed at `discovery_url`.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        discovery_url: impl Into<String>,
        deployment_host: Option<&str>,
    ) -> Result<Self, String> {
        Ok(Self {
            credentials: Some(ClientCredentials {
                client_id: ClientId::new(client_id.into()),
                client_secret: ClientSecret::new(client_secret.into()),
            }),
            discovery_url: discovery_url.into(),
            redirect_url: deployment_host.map(callback_url_for_host).transpose()?,
            landing_path: "/".to_string(),
        })
    }

    /// Config without client credentials.
    pub fn unconfigured(discovery_url: impl Into<String>) -> Self {
        Self {
            credentials: None,
            discovery_url: discovery_url.into(),
            redirect_url: None,
            landing_path: "/".to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    /// Log what the operator has to register in the Google Cloud Console.
    pub fn log_setup(&self) {
        match &self.redirect_url {
            Some(url) => tracing::info!("Using redirect URI: {}", url.as_str()),
            None => tracing::warn!(
                "No deployment host set; the redirect URI will be derived from each request's Host header"
            ),
        }

        if self.is_configured() {
            tracing::info!(
                "Google Auth is configured. Add this redirect URI to the Google Cloud Console: {}",
                self.redirect_url
                    .as_ref()
                    .map(|u| u.as_str().to_string())
                    .unwrap_or_else(|| format!("https://YOUR_DOMAIN{CALLBACK_PATH}"))
            );
        } else {
            tracing::warn!(
                "Google OAuth credentials are not set. Set GOOGLE_OAUTH_CLIENT_ID and GOOGLE_OAUTH_CLIENT_SECRET."
            );
        }
    }
}

/// `https://<host>/google_login/callback`.
fn callback_url_for_host(host: &str) -> Result<RedirectUrl, String> {
    let host = host
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');
    RedirectUrl::new(format!("https://{host}{CALLBACK_PATH}")).map_err(|e| e.to_string())
}
