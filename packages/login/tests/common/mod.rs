//! A fake Google built on wiremock, shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use login::{GoogleLogin, MemoryUserStore, OAuthConfig};
use serde_json::{json, Value};
use tower_sessions::{MemoryStore, Session};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

pub const CLIENT_ID: &str = "my-client";
pub const CLIENT_SECRET: &str = "my-secret";
pub const ACCESS_TOKEN: &str = "ya29.access";
pub const REFRESH_TOKEN: &str = "1//refresh";
/// `base64("my-client:my-secret")`
pub const BASIC_AUTH: &str = "Basic bXktY2xpZW50Om15LXNlY3JldA==";

pub const DISCOVERY_PATH: &str = "/.well-known/openid-configuration";
pub const AUTH_PATH: &str = "/o/oauth2/v2/auth";
pub const TOKEN_PATH: &str = "/token";
pub const USERINFO_PATH: &str = "/v1/userinfo";

/// A mock server answering the discovery document.
pub async fn fake_google() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issuer": "https://accounts.google.com",
            "authorization_endpoint": format!("{}{AUTH_PATH}", server.uri()),
            "token_endpoint": format!("{}{TOKEN_PATH}", server.uri()),
            "userinfo_endpoint": format!("{}{USERINFO_PATH}", server.uri()),
            "jwks_uri": "https://www.googleapis.com/oauth2/v3/certs",
        })))
        .mount(&server)
        .await;
    server
}

pub fn discovery_url(server: &MockServer) -> String {
    format!("{}{DISCOVERY_PATH}", server.uri())
}

/// Token endpoint response carrying [`ACCESS_TOKEN`] and [`REFRESH_TOKEN`].
pub fn token_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": ACCESS_TOKEN,
        "refresh_token": REFRESH_TOKEN,
        "expires_in": 3599,
        "token_type": "Bearer",
        "scope": "openid email",
    }))
}

/// Matches token exchange requests; add matchers before responding.
pub fn token_request() -> MockBuilder {
    Mock::given(method("POST")).and(path(TOKEN_PATH))
}

/// Token endpoint answering any code with [`token_response`].
pub fn token_mock() -> Mock {
    token_request().respond_with(token_response())
}

/// Userinfo endpoint returning `claims` to holders of [`ACCESS_TOKEN`].
pub fn userinfo_mock(claims: Value) -> Mock {
    Mock::given(method("GET"))
        .and(path(USERINFO_PATH))
        .and(header("authorization", format!("Bearer {ACCESS_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(claims))
}

/// Mount token and userinfo mocks for a successful login as `claims`.
pub async fn mount_login(server: &MockServer, claims: Value) {
    token_mock().mount(server).await;
    userinfo_mock(claims).mount(server).await;
}

pub fn configured(server: &MockServer, deployment_host: Option<&str>) -> OAuthConfig {
    OAuthConfig::new(CLIENT_ID, CLIENT_SECRET, discovery_url(server), deployment_host).unwrap()
}

pub fn login_with(config: OAuthConfig) -> (GoogleLogin, MemoryUserStore) {
    let users = MemoryUserStore::new();
    let login = GoogleLogin::new(config, Arc::new(users.clone())).unwrap();
    (login, users)
}

pub fn session() -> Session {
    Session::new(None, Arc::new(MemoryStore::default()), None)
}
