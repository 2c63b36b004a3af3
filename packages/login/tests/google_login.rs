mod common;

use common::*;
use login::auth::{
    current_user_id, store_credentials, stored_credentials, RequestContext, StoredCredentials,
    GOOGLE_TOKEN_URI, SCOPES,
};
use login::{OAuthConfig, UserStore};
use serde_json::json;
use url::Url;
use wiremock::matchers::{any, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn callback_request(host: &str, code: &str) -> RequestContext {
    RequestContext::new(Some(host), format!("/google_login/callback?code={code}&scope=openid"))
}

fn query_param(url: &str, key: &str) -> Option<String> {
    Url::parse(url)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

#[tokio::test]
async fn test_not_configured_never_calls_google() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let (login, users) = login_with(OAuthConfig::unconfigured(discovery_url(&server)));
    let session = session();

    let redirect = login
        .initiate(&RequestContext::new(Some("app.test"), "/google_login"))
        .await;
    assert_eq!(
        redirect.location(),
        "/?error=Google+OAuth+credentials+are+not+configured"
    );

    let redirect = login
        .handle_callback(&callback_request("app.test", "abc"), &session)
        .await;
    assert_eq!(redirect.location(), "/");

    assert!(users.is_empty());
    assert_eq!(current_user_id(&session).await.unwrap(), None);
    server.verify().await;
}

#[tokio::test]
async fn test_initiate_requests_all_scopes() {
    let server = fake_google().await;

    for deployment_host in [Some("app.example.com"), None] {
        let (login, _) = login_with(configured(&server, deployment_host));
        let redirect = login
            .initiate(&RequestContext::new(Some("local.test:5000"), "/google_login"))
            .await;

        let location = redirect.location();
        assert!(
            location.starts_with(&format!("{}{AUTH_PATH}?", server.uri())),
            "{location}"
        );
        assert_eq!(query_param(location, "response_type").as_deref(), Some("code"));
        assert_eq!(query_param(location, "client_id").as_deref(), Some(CLIENT_ID));
        assert_eq!(query_param(location, "state"), None);

        let scope = query_param(location, "scope").unwrap();
        let scopes: Vec<&str> = scope.split(' ').collect();
        assert_eq!(scopes, SCOPES.to_vec());
    }
}

#[tokio::test]
async fn test_configured_redirect_uri_used_by_both_legs() {
    let server = fake_google().await;
    token_request()
        .and(body_string_contains(
            "redirect_uri=https%3A%2F%2Fapp.example.com%2Fgoogle_login%2Fcallback",
        ))
        .and(body_string_contains("code=abc"))
        .and(header("authorization", BASIC_AUTH))
        .respond_with(token_response())
        .expect(1)
        .mount(&server)
        .await;
    userinfo_mock(json!({"email": "a@b.com", "email_verified": true}))
        .mount(&server)
        .await;

    let (login, _) = login_with(configured(&server, Some("app.example.com")));

    let redirect = login
        .initiate(&RequestContext::new(Some("other.test"), "/google_login"))
        .await;
    assert_eq!(
        query_param(redirect.location(), "redirect_uri").as_deref(),
        Some("https://app.example.com/google_login/callback")
    );

    let redirect = login
        .handle_callback(&callback_request("other.test", "abc"), &session())
        .await;
    assert_eq!(redirect.param("auth_success").as_deref(), Some("true"));
    server.verify().await;
}

#[tokio::test]
async fn test_derived_redirect_uri_forces_https() {
    let server = fake_google().await;
    token_request()
        .and(body_string_contains(
            "redirect_uri=https%3A%2F%2Flocal.test%3A5000%2Fgoogle_login%2Fcallback",
        ))
        .respond_with(token_response())
        .expect(1)
        .mount(&server)
        .await;
    userinfo_mock(json!({"email": "a@b.com", "email_verified": true}))
        .mount(&server)
        .await;

    let (login, _) = login_with(configured(&server, None));

    let redirect = login
        .initiate(&RequestContext::new(Some("local.test:5000"), "/google_login"))
        .await;
    assert_eq!(
        query_param(redirect.location(), "redirect_uri").as_deref(),
        Some("https://local.test:5000/google_login/callback")
    );

    let redirect = login
        .handle_callback(&callback_request("local.test:5000", "abc"), &session())
        .await;
    assert_eq!(redirect.location(), "/?auth_success=true");
    server.verify().await;
}

#[tokio::test]
async fn test_unverified_email_rejected() {
    let server = fake_google().await;
    mount_login(
        &server,
        json!({"email": "a@b.com", "email_verified": false, "name": "Sam Smith"}),
    )
    .await;

    let (login, users) = login_with(configured(&server, None));
    let session = session();

    let redirect = login
        .handle_callback(&callback_request("app.test", "abc"), &session)
        .await;
    assert_eq!(
        redirect.param("error").as_deref(),
        Some("User email not verified by Google")
    );
    assert_eq!(redirect.param("auth_success"), None);

    assert!(users.is_empty());
    assert_eq!(current_user_id(&session).await.unwrap(), None);
    assert!(stored_credentials(&session).await.unwrap().is_none());
}

#[tokio::test]
async fn test_second_login_reuses_user() {
    let server = fake_google().await;
    token_mock().mount(&server).await;
    userinfo_mock(json!({"email": "a@b.com", "email_verified": true, "name": "Sam Smith"}))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    userinfo_mock(json!({"email": "a@b.com", "email_verified": true, "name": "Samantha"}))
        .mount(&server)
        .await;

    let (login, users) = login_with(configured(&server, None));

    let first = session();
    login
        .handle_callback(&callback_request("app.test", "one"), &first)
        .await;
    let second = session();
    let redirect = login
        .handle_callback(&callback_request("app.test", "two"), &second)
        .await;
    assert_eq!(redirect.param("auth_success").as_deref(), Some("true"));

    assert_eq!(users.len(), 1);
    let user = users.find_by_email("a@b.com").await.unwrap().unwrap();
    assert_eq!(user.name, "Sam Smith");
    assert_eq!(current_user_id(&first).await.unwrap(), Some(user.id));
    assert_eq!(current_user_id(&second).await.unwrap(), Some(user.id));
}

#[tokio::test]
async fn test_display_name_fallback_on_create() {
    let cases = [
        (json!({"email": "a@b.com", "email_verified": true}), "User"),
        (
            json!({"email": "a@b.com", "email_verified": true, "given_name": "Sam"}),
            "Sam",
        ),
        (
            json!({
                "email": "a@b.com",
                "email_verified": true,
                "name": "Sam Smith",
                "given_name": "Sam"
            }),
            "Sam Smith",
        ),
    ];

    for (claims, expected) in cases {
        let server = fake_google().await;
        mount_login(&server, claims).await;
        let (login, users) = login_with(configured(&server, None));

        login
            .handle_callback(&callback_request("app.test", "abc"), &session())
            .await;

        let user = users.find_by_email("a@b.com").await.unwrap().unwrap();
        assert_eq!(user.name, expected);
    }
}

#[tokio::test]
async fn test_stored_credentials_shape() {
    let server = fake_google().await;
    mount_login(&server, json!({"email": "a@b.com", "email_verified": true})).await;
    let (login, _) = login_with(configured(&server, None));
    let session = session();

    login
        .handle_callback(&callback_request("app.test", "abc"), &session)
        .await;

    let credentials = stored_credentials(&session).await.unwrap().unwrap();
    assert_eq!(credentials.token, ACCESS_TOKEN);
    assert_eq!(credentials.refresh_token.as_deref(), Some(REFRESH_TOKEN));
    assert_eq!(credentials.token_uri, GOOGLE_TOKEN_URI);
    assert_eq!(credentials.client_id, CLIENT_ID);
    assert_eq!(credentials.client_secret, CLIENT_SECRET);
    // The granted scopes in the token response are ignored
    assert_eq!(credentials.scopes, SCOPES.to_vec());
}

#[tokio::test]
async fn test_terminate_session() {
    let server = fake_google().await;
    mount_login(&server, json!({"email": "a@b.com", "email_verified": true})).await;
    let (login, _) = login_with(configured(&server, None));

    // Nothing stored yet
    let empty = session();
    assert_eq!(login.terminate_session(&empty).await.location(), "/");
    assert!(stored_credentials(&empty).await.unwrap().is_none());

    let session = session();
    login
        .handle_callback(&callback_request("app.test", "abc"), &session)
        .await;
    assert!(current_user_id(&session).await.unwrap().is_some());

    assert_eq!(login.terminate_session(&session).await.location(), "/");
    assert!(stored_credentials(&session).await.unwrap().is_none());
    assert_eq!(current_user_id(&session).await.unwrap(), None);
}

#[tokio::test]
async fn test_terminate_session_clears_credentials_without_user() {
    let server = MockServer::start().await;
    let (login, _) = login_with(configured(&server, None));
    let session = session();
    store_credentials(
        &session,
        &StoredCredentials {
            token: "t".to_string(),
            refresh_token: None,
            token_uri: GOOGLE_TOKEN_URI.to_string(),
            client_id: CLIENT_ID.to_string(),
            client_secret: CLIENT_SECRET.to_string(),
            scopes: vec![],
        },
    )
    .await
    .unwrap();

    assert_eq!(login.terminate_session(&session).await.location(), "/");
    assert!(stored_credentials(&session).await.unwrap().is_none());
}

/// Runs a callback against `server` and checks nothing was committed.
async fn assert_callback_fails(server: &MockServer, request: RequestContext) -> String {
    let (login, users) = login_with(configured(server, None));
    let session = session();

    let redirect = login.handle_callback(&request, &session).await;
    assert!(redirect.location().starts_with("/?"), "{}", redirect.location());
    assert_eq!(redirect.param("auth_success"), None);

    assert!(users.is_empty());
    assert_eq!(current_user_id(&session).await.unwrap(), None);
    assert!(stored_credentials(&session).await.unwrap().is_none());

    redirect
        .param("auth_error")
        .expect("failure redirect carries auth_error")
}

#[tokio::test]
async fn test_discovery_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let error = assert_callback_fails(&server, callback_request("app.test", "abc")).await;
    assert!(error.contains("discovery document"), "{error}");

    let (login, _) = login_with(configured(&server, None));
    let redirect = login
        .initiate(&RequestContext::new(Some("app.test"), "/google_login"))
        .await;
    assert!(redirect.param("error").is_some());
}

#[tokio::test]
async fn test_discovery_garbage() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let error = assert_callback_fails(&server, callback_request("app.test", "abc")).await;
    assert!(error.starts_with("Unexpected response from Google"), "{error}");
}

#[tokio::test]
async fn test_token_exchange_failure() {
    let server = fake_google().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Bad Request",
        })))
        .mount(&server)
        .await;
    userinfo_mock(json!({"email": "a@b.com", "email_verified": true}))
        .expect(0)
        .mount(&server)
        .await;

    let error = assert_callback_fails(&server, callback_request("app.test", "abc")).await;
    assert!(error.contains("invalid_grant"), "{error}");
    server.verify().await;
}

#[tokio::test]
async fn test_userinfo_failure() {
    let server = fake_google().await;
    token_mock().mount(&server).await;
    Mock::given(method("GET"))
        .and(path(USERINFO_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let error = assert_callback_fails(&server, callback_request("app.test", "abc")).await;
    assert!(error.contains("userinfo"), "{error}");
}

#[tokio::test]
async fn test_provider_error_param_skips_exchange() {
    let server = fake_google().await;
    token_mock().expect(0).mount(&server).await;

    let request =
        RequestContext::new(Some("app.test"), "/google_login/callback?error=access_denied");
    let error = assert_callback_fails(&server, request).await;
    assert!(error.contains("access_denied"), "{error}");
    server.verify().await;
}
