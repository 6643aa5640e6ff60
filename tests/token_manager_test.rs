mod common;

use chrono::Utc;
use common::{FakeAuthorizer, FakeEndpoint, test_config, token_response};
use podqueue::{
    error::AuthError,
    management::{CredentialStore, EXPIRY_MARGIN_SECS, TokenManager},
    types::{CallbackOutcome, TokenRecord},
};
use tempfile::TempDir;

struct Harness {
    _dir: TempDir,
    store: CredentialStore,
    endpoint: FakeEndpoint,
    authorizer: FakeAuthorizer,
    manager: TokenManager<FakeEndpoint, FakeAuthorizer>,
}

fn harness(endpoint: FakeEndpoint, outcome: CallbackOutcome) -> Harness {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let store = CredentialStore::from_config(&config);
    let authorizer = FakeAuthorizer::new(outcome);
    let manager = TokenManager::new(
        &config,
        store.clone(),
        endpoint.clone(),
        authorizer.clone(),
    );

    Harness {
        _dir: dir,
        store,
        endpoint,
        authorizer,
        manager,
    }
}

fn cached(access: &str, refresh: Option<&str>, expiry: i64) -> TokenRecord {
    TokenRecord {
        access_token: access.to_string(),
        refresh_token: refresh.map(String::from),
        expiry,
    }
}

#[tokio::test]
async fn test_valid_cached_token_needs_no_network() {
    let mut h = harness(FakeEndpoint::default(), CallbackOutcome::Missing);
    let now = Utc::now().timestamp();
    h.store
        .save_token(&cached("cached-access", Some("r"), now + 3600))
        .await
        .unwrap();

    let access = h.manager.ensure_authenticated().await.unwrap();

    assert_eq!(access, "cached-access");
    assert_eq!(h.authorizer.calls(), 0);
    assert!(h.endpoint.refreshed_with().is_empty());
    assert!(h.endpoint.exchanged_codes().is_empty());
}

#[tokio::test]
async fn test_expired_token_is_refreshed_without_browser() {
    let endpoint = FakeEndpoint::new(None, Some(token_response("fresh", None, 3600)));
    let mut h = harness(endpoint, CallbackOutcome::Missing);
    let now = Utc::now().timestamp();
    h.store
        .save_token(&cached("stale", Some("refresh-1"), now - 10))
        .await
        .unwrap();

    let access = h.manager.ensure_authenticated().await.unwrap();

    assert_eq!(access, "fresh");
    assert_eq!(h.endpoint.refreshed_with(), vec!["refresh-1".to_string()]);
    assert_eq!(h.authorizer.calls(), 0);

    // Should keep the previous refresh token when none was reissued
    let stored = h.store.load_token().await.unwrap();
    assert_eq!(stored.access_token, "fresh");
    assert_eq!(stored.refresh_token.as_deref(), Some("refresh-1"));
    assert_eq!(h.manager.current_token(), Some(&stored));
}

#[tokio::test]
async fn test_reissued_refresh_token_replaces_the_old_one() {
    let endpoint = FakeEndpoint::new(None, Some(token_response("fresh", Some("refresh-2"), 3600)));
    let mut h = harness(endpoint, CallbackOutcome::Missing);
    h.store
        .save_token(&cached("stale", Some("refresh-1"), 0))
        .await
        .unwrap();

    h.manager.ensure_authenticated().await.unwrap();

    let stored = h.store.load_token().await.unwrap();
    assert_eq!(stored.refresh_token.as_deref(), Some("refresh-2"));
}

#[tokio::test]
async fn test_failed_refresh_falls_back_to_interactive_flow() {
    let endpoint = FakeEndpoint::new(Some(token_response("new", Some("refresh-new"), 3600)), None);
    let mut h = harness(endpoint, CallbackOutcome::Code("the-code".to_string()));
    h.store
        .save_token(&cached("stale", Some("refresh-1"), 0))
        .await
        .unwrap();

    let access = h.manager.ensure_authenticated().await.unwrap();

    assert_eq!(access, "new");
    assert_eq!(h.endpoint.refreshed_with().len(), 1);
    assert_eq!(h.authorizer.calls(), 1);
    assert_eq!(h.endpoint.exchanged_codes(), vec!["the-code".to_string()]);
}

#[tokio::test]
async fn test_expired_token_without_refresh_token_goes_interactive() {
    let endpoint = FakeEndpoint::new(Some(token_response("new", Some("r"), 3600)), None);
    let mut h = harness(endpoint, CallbackOutcome::Code("c".to_string()));
    h.store.save_token(&cached("stale", None, 0)).await.unwrap();

    h.manager.ensure_authenticated().await.unwrap();

    assert!(h.endpoint.refreshed_with().is_empty());
    assert_eq!(h.authorizer.calls(), 1);
}

#[tokio::test]
async fn test_exchanged_token_is_persisted_with_margin() {
    let endpoint = FakeEndpoint::new(Some(token_response("new", Some("r"), 3600)), None);
    let mut h = harness(endpoint, CallbackOutcome::Code("c".to_string()));

    let before = Utc::now().timestamp();
    h.manager.ensure_authenticated().await.unwrap();
    let after = Utc::now().timestamp();

    let stored = h.store.load_token().await.unwrap();
    assert_eq!(stored.access_token, "new");
    assert_eq!(stored.refresh_token.as_deref(), Some("r"));
    assert!(stored.expiry >= before + 3600 - EXPIRY_MARGIN_SECS);
    assert!(stored.expiry <= after + 3600 - EXPIRY_MARGIN_SECS);
}

#[tokio::test]
async fn test_consent_url_carries_state_and_redirect() {
    let endpoint = FakeEndpoint::new(Some(token_response("new", None, 3600)), None);
    let mut h = harness(endpoint, CallbackOutcome::Code("c".to_string()));

    h.manager.ensure_authenticated().await.unwrap();

    let requests = h.authorizer.requests();
    assert_eq!(requests.len(), 1);
    let (url, state) = &requests[0];
    assert_eq!(state.len(), 16);
    assert!(url.starts_with("https://accounts.spotify.com/authorize?"));
    assert!(url.contains(&format!("state={}", state)));
    assert!(url.contains("client_id=test-client"));
    assert!(url.contains("response_type=code"));
    assert!(url.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A8888%2Fcallback"));
}

#[tokio::test]
async fn test_missing_code_fails_authorization() {
    let mut h = harness(FakeEndpoint::default(), CallbackOutcome::Missing);

    let err = h.manager.ensure_authenticated().await.unwrap_err();

    assert!(matches!(err, AuthError::NoCode));
    assert!(h.endpoint.exchanged_codes().is_empty());
    assert_eq!(h.store.load_token().await, None);
}

#[tokio::test]
async fn test_timed_out_redirect_fails_authorization() {
    let mut h = harness(FakeEndpoint::default(), CallbackOutcome::TimedOut);

    let err = h.manager.ensure_authenticated().await.unwrap_err();

    assert!(matches!(err, AuthError::Timeout));
}

#[tokio::test]
async fn test_rejected_exchange_fails_authorization() {
    let mut h = harness(FakeEndpoint::new(None, None), CallbackOutcome::Code("bad".to_string()));

    let err = h.manager.ensure_authenticated().await.unwrap_err();

    assert!(matches!(err, AuthError::Rejected { status: 400 }));
    assert_eq!(h.store.load_token().await, None);
    assert!(h.manager.current_token().is_none());
}
