//! End-to-end refresh coordination over real HTTP
//!
//! Drives [`SessionRuntime`] with the reqwest transport against a wiremock
//! server, so every request crosses a socket.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use jobhub_core::{Dispatcher, MemorySecretStorage};
use jobhub_domain::{
    AccountDomain, ApiError, ApiSettings, Config, CredentialPair, SessionEvent,
};
use jobhub_infra::{ReqwestTransport, SessionRuntime};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn runtime(server: &MockServer) -> anyhow::Result<SessionRuntime> {
    let config = Config {
        api: ApiSettings {
            base_url: format!("{}/api", server.uri()),
            request_timeout_secs: 5,
            refresh_timeout_secs: 5,
        },
        ..Config::default()
    };
    let transport = Arc::new(ReqwestTransport::new()?);
    Ok(SessionRuntime::with_parts(&config, Arc::new(MemorySecretStorage::new()), transport)?)
}

/// `GET {route}` answers 200 for the fresh token and 401 for anything else
async fn mount_protected(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn concurrent_401s_share_one_refresh() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_protected(&server, "/api/me").await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(header("x-refresh-token", "r1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "accessToken": "fresh", "refreshToken": "r2" }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut runtime = runtime(&server).await?;
    let mut events = runtime.take_events().expect("events available");
    let client = runtime.client(AccountDomain::User).clone();
    client.sign_in(CredentialPair::new("stale", "r1"))?;

    let results = join_all((0..5).map(|_| {
        let client = client.clone();
        async move { client.get_json::<Value>("/me").await }
    }))
    .await;

    for result in results {
        assert_eq!(result?["ok"], true);
    }
    assert_eq!(
        runtime.store().get(AccountDomain::User)?,
        Some(CredentialPair::new("fresh", "r2"))
    );
    assert!(events.try_recv().is_err());
    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn rejected_refresh_signs_out_once() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_protected(&server, "/api/applications").await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;

    let mut runtime = runtime(&server).await?;
    let mut events = runtime.take_events().expect("events available");
    let client = runtime.client(AccountDomain::User).clone();
    client.sign_in(CredentialPair::new("stale", "r1"))?;

    let results = join_all((0..3).map(|_| {
        let client = client.clone();
        async move { client.get_json::<Value>("/applications").await }
    }))
    .await;

    for result in results {
        assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
    }
    assert!(!runtime.store().is_authenticated(AccountDomain::User));
    assert_eq!(
        events.try_recv()?,
        SessionEvent::SignInRequired { domain: AccountDomain::User, route: "/login".into() }
    );
    assert!(matches!(events.try_recv()?, SessionEvent::Notice { domain: AccountDomain::User, .. }));
    assert!(events.try_recv().is_err());
    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn failed_sign_in_is_returned_without_refresh() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let mut runtime = runtime(&server).await?;
    let mut events = runtime.take_events().expect("events available");
    let client = runtime.client(AccountDomain::User).clone();
    client.sign_in(CredentialPair::new("stale", "r1"))?;

    let result = client
        .post_json::<_, Value>("/auth/login", &json!({ "email": "a@b.c", "password": "x" }))
        .await;

    match result {
        Err(ApiError::Unauthorized { body, .. }) => assert_eq!(body, "bad credentials"),
        other => panic!("expected unauthorized, got {other:?}"),
    }
    assert!(runtime.store().is_authenticated(AccountDomain::User));
    assert!(events.try_recv().is_err());
    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn employer_refresh_uses_employer_endpoint() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_protected(&server, "/api/employer/jobs").await;
    Mock::given(method("POST"))
        .and(path("/api/employer/auth/refresh"))
        .and(header("x-employer-refresh-token", "e1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "accessToken": "fresh", "refreshToken": "e2" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let runtime = runtime(&server).await?;
    let employer = runtime.client(AccountDomain::Employer);
    runtime.client(AccountDomain::User).sign_in(CredentialPair::new("user-a", "user-r"))?;
    employer.sign_in(CredentialPair::new("stale", "e1"))?;

    let jobs: Value = employer.get_json("/jobs").await?;

    assert_eq!(jobs["ok"], true);
    assert_eq!(
        runtime.store().get(AccountDomain::Employer)?,
        Some(CredentialPair::new("fresh", "e2"))
    );
    assert_eq!(
        runtime.store().get(AccountDomain::User)?,
        Some(CredentialPair::new("user-a", "user-r"))
    );
    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn public_client_sends_no_credentials() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/public"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }])))
        .expect(1)
        .mount(&server)
        .await;

    let runtime = runtime(&server).await?;
    runtime.client(AccountDomain::User).sign_in(CredentialPair::new("a1", "r1"))?;

    let jobs: Vec<Value> = runtime.public().get_json("/jobs/public").await?;

    assert_eq!(jobs.len(), 1);
    let received = server.received_requests().await.unwrap_or_default();
    assert!(received[0].headers.get("authorization").is_none());
    Ok(())
}
