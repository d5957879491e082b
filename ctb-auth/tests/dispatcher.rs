use std::sync::Arc;

use ctb_auth::AuthenticatedDispatcher;
use ctb_core::{
    ApiConfig, CredentialStore, MemoryCredentialStore, RequestError, APP_TOKEN_KEY, LOGIN_STATUS,
    USER_TOKEN_KEY,
};
use ctb_transport::mock::{MockResponse, MockTransport};
use ctb_transport::{Authorization, CancellationToken, HttpMethod, HttpTransport, Request};
use tokio::sync::Notify;
use tracing_test::traced_test;

const TOKEN_BODY: &str = r#"{"access_token":"app-token","token_type":"bearer","expires_in":7200}"#;

/// Creates a dispatcher over a shared mock transport and store.
fn dispatcher_with(
    transport: &Arc<MockTransport>,
    store: &Arc<MemoryCredentialStore>,
) -> AuthenticatedDispatcher {
    let config = ApiConfig::new("app-id", "app-secret")
        .with_base_url("https://api.test")
        .with_locale("en");
    AuthenticatedDispatcher::from_shared(
        Arc::new(config),
        Arc::clone(transport) as Arc<dyn HttpTransport>,
        Arc::clone(store) as Arc<dyn CredentialStore>,
    )
}

fn landing_urls() -> Request {
    Request::get("/landing_urls").with_authorization(Authorization::AppLevel)
}

#[tokio::test]
async fn app_level_request_fetches_and_caches_token_once() {
    // Arrange
    let transport = Arc::new(MockTransport::new());
    let store = Arc::new(MemoryCredentialStore::new());
    let exchange = transport.on(HttpMethod::Post, "/oauth/token", MockResponse::json(200, TOKEN_BODY));
    transport.on(HttpMethod::Get, "/landing_urls", MockResponse::json(200, r#"{"data":[]}"#));
    let dispatcher = dispatcher_with(&transport, &store);

    // Act
    let first = dispatcher.send(landing_urls(), &CancellationToken::new()).await;
    let second = dispatcher.send(landing_urls(), &CancellationToken::new()).await;

    // Assert
    assert_eq!(first.status(), Some(200));
    assert_eq!(second.status(), Some(200));
    assert_eq!(exchange.hits(), 1);
    assert_eq!(store.get(APP_TOKEN_KEY).as_deref(), Some("app-token"));

    let token_request = &transport.requests_to(HttpMethod::Post, "/oauth/token")[0];
    assert_eq!(token_request.url, "https://api.test/v2/oauth/token");
    assert_eq!(token_request.field("grant_type"), Some("client_credentials"));
    assert_eq!(token_request.field("client_secret"), Some("app-secret"));
    assert_eq!(token_request.bearer_token(), None);

    for request in transport.requests_to(HttpMethod::Get, "/landing_urls") {
        assert_eq!(request.bearer_token(), Some("app-token"));
        assert_eq!(request.header("accept"), Some("application/vnd.api+json"));
        assert_eq!(request.header("accept-language"), Some("en"));
    }
}

#[tokio::test]
async fn concurrent_app_level_requests_share_one_exchange() {
    // Arrange
    let transport = Arc::new(MockTransport::new());
    let store = Arc::new(MemoryCredentialStore::new());
    let gate = Arc::new(Notify::new());
    let exchange = transport.on(
        HttpMethod::Post,
        "/oauth/token",
        MockResponse::json(200, TOKEN_BODY).after(Arc::clone(&gate)),
    );
    transport.on(HttpMethod::Get, "/landing_urls", MockResponse::json(200, r#"{"data":[]}"#));
    let dispatcher = dispatcher_with(&transport, &store);
    let started = exchange.started();

    let (first_cancel, second_cancel) = (CancellationToken::new(), CancellationToken::new());

    // Act
    let (a, b, ()) = tokio::join!(
        dispatcher.send(landing_urls(), &first_cancel),
        dispatcher.send(landing_urls(), &second_cancel),
        async {
            started.notified().await;
            gate.notify_one();
        }
    );

    // Assert
    assert_eq!(a.status(), Some(200));
    assert_eq!(b.status(), Some(200));
    assert_eq!(exchange.hits(), 1);
}

#[tokio::test]
#[traced_test]
async fn failed_exchange_still_sends_original_request() {
    // Arrange
    let transport = Arc::new(MockTransport::new());
    let store = Arc::new(MemoryCredentialStore::new());
    transport.on(
        HttpMethod::Post,
        "/oauth/token",
        MockResponse::json(401, r#"{"errors":[{"status":"401","title":"invalid_client"}]}"#),
    );
    transport.on(
        HttpMethod::Get,
        "/landing_urls",
        MockResponse::json(401, r#"{"errors":[{"status":"401","title":"Not authenticated"}]}"#),
    );
    let dispatcher = dispatcher_with(&transport, &store);

    // Act
    let outcome = dispatcher.send(landing_urls(), &CancellationToken::new()).await;

    // Assert
    let sent = transport.requests_to(HttpMethod::Get, "/landing_urls");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].bearer_token(), None);
    assert!(!store.has(APP_TOKEN_KEY));
    match outcome.into_result() {
        Err(RequestError::Http { status, errors }) => {
            assert_eq!(status, 401);
            assert_eq!(errors[0].title, "Not authenticated");
        }
        other => panic!("expected backend 401, got {other:?}"),
    }
    assert!(logs_contain("application token exchange failed"));
}

#[tokio::test]
async fn cached_app_token_skips_exchange() {
    let transport = Arc::new(MockTransport::new());
    let store = Arc::new(MemoryCredentialStore::new());
    store.set(APP_TOKEN_KEY, "cached");
    transport.on(HttpMethod::Get, "/landing_urls", MockResponse::json(200, r#"{"data":[]}"#));
    let dispatcher = dispatcher_with(&transport, &store);

    dispatcher.send(landing_urls(), &CancellationToken::new()).await;

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].bearer_token(), Some("cached"));
}

#[tokio::test]
async fn user_level_attaches_user_token_only_when_present() {
    let transport = Arc::new(MockTransport::new());
    let store = Arc::new(MemoryCredentialStore::new());
    transport.on(HttpMethod::Get, "/users/me", MockResponse::json(401, "{}"));
    let dispatcher = dispatcher_with(&transport, &store);
    let me = || Request::get("/users/me").with_authorization(Authorization::UserLevel);

    let anonymous = dispatcher.send(me(), &CancellationToken::new()).await;
    store.set(USER_TOKEN_KEY, "user-token");
    dispatcher.send(me(), &CancellationToken::new()).await;

    assert!(anonymous.is_http_error());
    let requests = transport.requests();
    assert_eq!(requests[0].bearer_token(), None);
    assert_eq!(requests[1].bearer_token(), Some("user-token"));
}

#[tokio::test]
async fn foreign_host_requests_skip_default_headers() {
    let transport = Arc::new(MockTransport::new());
    let store = Arc::new(MemoryCredentialStore::new());
    transport.on(HttpMethod::Get, "cdn.example.com", MockResponse::bytes(200, vec![1u8, 2, 3]));
    let dispatcher = dispatcher_with(&transport, &store);

    let outcome = dispatcher
        .send(
            Request::absolute(HttpMethod::Get, "https://cdn.example.com/a.png").without_default_headers(),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(outcome.body_bytes(), &[1, 2, 3]);
    let request = &transport.requests()[0];
    assert_eq!(request.url, "https://cdn.example.com/a.png");
    assert!(request.headers.is_empty());
}

#[tokio::test]
async fn login_stores_user_token_and_logout_removes_it() {
    let transport = Arc::new(MockTransport::new());
    let store = Arc::new(MemoryCredentialStore::new());
    transport.on(
        HttpMethod::Post,
        "/oauth/token",
        MockResponse::json(200, r#"{"access_token":"user-token","token_type":"bearer"}"#),
    );
    let dispatcher = dispatcher_with(&transport, &store);

    let token = dispatcher
        .login("kid@example.com", "hunter2", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(token.access_token, "user-token");
    assert!(dispatcher.is_user_logged_in());
    assert_eq!(transport.requests()[0].field("grant_type"), Some("password"));

    dispatcher.logout();
    assert!(!dispatcher.is_user_logged_in());
}

#[tokio::test]
async fn rejected_login_leaves_store_untouched() {
    let transport = Arc::new(MockTransport::new());
    let store = Arc::new(MemoryCredentialStore::new());
    transport.on(
        HttpMethod::Post,
        "/oauth/token",
        MockResponse::json(400, r#"{"error":"invalid_grant"}"#),
    );
    let dispatcher = dispatcher_with(&transport, &store);

    let err = dispatcher
        .login("kid@example.com", "wrong", &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        RequestError::Http { status, errors } => {
            assert_eq!(status, 400);
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].status, LOGIN_STATUS);
            assert_eq!(errors[0].code, "invalid_grant");
        }
        other => panic!("expected login rejection, got {other:?}"),
    }
    assert!(!dispatcher.is_user_logged_in());
}
