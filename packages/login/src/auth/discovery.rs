//! OpenID discovery document.

use reqwest::Client;
use serde::Deserialize;

use crate::error::AuthError;

/// The endpoints we need from Google's discovery document. Other fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryDocument {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
}

impl DiscoveryDocument {
    /// Fetch the document. Fetched fresh on every flow step; nothing is cached.
    pub async fn fetch(http: &Client, url: &str) -> Result<Self, AuthError> {
        http.get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::ProviderUnreachable(format!("discovery document: {e}")))?
            .json()
            .await
            .map_err(|e| AuthError::ProviderMalformedResponse(format!("discovery document: {e}")))
    }
}
