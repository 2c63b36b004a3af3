//! Authentication module for the Google login flow.

mod config;
mod discovery;
mod flow;
mod google;
mod redirect;
mod session;

pub use config::{
    ClientCredentials, OAuthConfig, CALLBACK_PATH, GOOGLE_DISCOVERY_URL, GOOGLE_TOKEN_URI, SCOPES,
};
pub use discovery::DiscoveryDocument;
pub use flow::GoogleLogin;
pub use google::{GoogleTokens, GoogleUserInfo, DEFAULT_DISPLAY_NAME};
pub use redirect::{force_https, resolve_redirect_url, FlowRedirect, RequestContext};
pub use session::{
    bind_user, current_user_id, remove_credentials, store_credentials, stored_credentials,
    unbind_user, StoredCredentials, SESSION_CREDENTIALS_KEY, SESSION_USER_ID_KEY,
};
