//! Refresh storm scenarios against a scripted transport
//!
//! Tokio time is paused, so scripted delays line requests up exactly: every
//! request in a storm sees its 401 at the same instant.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use jobhub_domain::{
    AccountDomain, ApiError, CoordinatorPhase, CredentialPair, HttpRequest, MultipartPart,
    OutboundRequest, TransportError,
};
use serde_json::{json, Value};

use super::{Dispatcher, SessionClient};
use crate::credentials::{CredentialStore, MemorySecretStorage};
use crate::testing::{RecordingNavigator, Reply, ScriptedTransport};

const BASE_URL: &str = "https://api.jobhub.test/api";
const USER_REFRESH: &str = "/api/auth/refresh";
const EMPLOYER_REFRESH: &str = "/api/employer/auth/refresh";

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

fn bearer(request: &OutboundRequest) -> Option<&str> {
    request.headers.get("authorization")
}

fn is_refresh(request: &OutboundRequest) -> bool {
    request.url.ends_with("/auth/refresh")
}

/// Accepts only `Bearer fresh`; the refresh endpoint answers with `refresh`.
fn api(refresh: impl Fn() -> Reply + Send + Sync + 'static) -> ScriptedTransport {
    ScriptedTransport::new(move |request| {
        if is_refresh(request) {
            return refresh();
        }
        match bearer(request) {
            Some("Bearer fresh") => Reply::json(200, &json!({ "ok": true })).after(secs(1)),
            _ => Reply::status(401).after(secs(1)),
        }
    })
}

fn fresh_pair() -> Reply {
    Reply::json(200, &json!({ "accessToken": "fresh", "refreshToken": "r2" })).after(secs(1))
}

struct Harness {
    store: Arc<CredentialStore>,
    transport: Arc<ScriptedTransport>,
    navigator: Arc<RecordingNavigator>,
    user: SessionClient,
    employer: SessionClient,
}

impl Harness {
    fn new(transport: ScriptedTransport) -> Self {
        let store = Arc::new(CredentialStore::new(Arc::new(MemorySecretStorage::new())));
        let transport = Arc::new(transport);
        let navigator = Arc::new(RecordingNavigator::new());

        let client = |domain| {
            SessionClient::builder(domain)
                .base_url(BASE_URL)
                .store(store.clone())
                .transport(transport.clone())
                .navigator(navigator.clone())
                .request_timeout(secs(30))
                .refresh_timeout(secs(10))
                .build()
                .unwrap()
        };

        let user = client(AccountDomain::User);
        let employer = client(AccountDomain::Employer);
        Self { store, transport, navigator, user, employer }
    }

    fn signed_in(self, domain: AccountDomain, access: &str, refresh: &str) -> Self {
        self.store.set(domain, CredentialPair::new(access, refresh)).unwrap();
        self
    }

    async fn storm(&self, client: &SessionClient, size: usize) -> Vec<Result<Value, ApiError>> {
        join_all((0..size).map(|i| async move { client.get_json::<Value>(&format!("/jobs/{i}")).await }))
            .await
    }
}

#[tokio::test(start_paused = true)]
async fn concurrent_stale_requests_share_one_refresh() {
    let h = Harness::new(api(fresh_pair)).signed_in(AccountDomain::User, "stale", "r1");

    let results = h.storm(&h.user, 5).await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 5);
    assert_eq!(h.transport.calls_to(USER_REFRESH), 1);
    assert_eq!(h.user.coordinator().storms(), 1);
    assert_eq!(
        h.store.get(AccountDomain::User).unwrap(),
        Some(CredentialPair::new("fresh", "r2"))
    );
    assert_eq!(h.user.phase(), CoordinatorPhase::Idle);
    assert_eq!(h.navigator.redirect_count(), 0);

    // Each original went out twice: once stale, once replayed with the new token.
    for i in 0..5 {
        let sent = h.transport.requests_to(&format!("/jobs/{i}"));
        assert_eq!(sent.len(), 2);
        assert_eq!(bearer(&sent[0]), Some("Bearer stale"));
        assert_eq!(bearer(&sent[1]), Some("Bearer fresh"));
    }
}

#[tokio::test(start_paused = true)]
async fn refresh_carries_refresh_token_in_custom_header() {
    let h = Harness::new(api(fresh_pair)).signed_in(AccountDomain::User, "stale", "r1");

    h.user.get_json::<Value>("/profile").await.unwrap();

    let refresh = &h.transport.requests_to(USER_REFRESH)[0];
    assert_eq!(refresh.url, format!("{BASE_URL}/auth/refresh"));
    assert_eq!(refresh.headers.get("x-refresh-token"), Some("r1"));
    assert_eq!(bearer(refresh), None);
    assert_eq!(refresh.timeout, secs(10));
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_tears_down_once_and_rejects_all() {
    let h = Harness::new(api(|| Reply::status(500))).signed_in(AccountDomain::User, "stale", "r1");

    let results = h.storm(&h.user, 5).await;

    for result in &results {
        assert!(matches!(result, Err(ApiError::Unauthorized { .. })), "got {result:?}");
    }
    assert_eq!(h.transport.calls_to(USER_REFRESH), 1);
    assert_eq!(h.store.get(AccountDomain::User).unwrap(), None);
    assert!(h.user.coordinator().is_failed());
    assert_eq!(h.user.phase(), CoordinatorPhase::Failed);
    assert_eq!(h.navigator.redirects(), vec![(AccountDomain::User, "/login".to_string())]);
    assert_eq!(h.navigator.notice_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn exempt_path_401_is_returned_unchanged() {
    let transport = ScriptedTransport::new(|request| {
        if request.url.ends_with("/auth/login") {
            Reply::text(401, "bad credentials")
        } else {
            Reply::status(200)
        }
    });
    let h = Harness::new(transport).signed_in(AccountDomain::User, "a1", "r1");

    let request = HttpRequest::post("/auth/login")
        .json(&json!({ "email": "x@jobhub.test", "password": "nope" }))
        .unwrap();
    let err = h.user.execute(request).await.unwrap_err();

    assert!(matches!(&err, ApiError::Unauthorized { path, .. } if path == "/auth/login"));
    assert_eq!(err.body(), Some("bad credentials"));
    assert_eq!(h.transport.calls_to(USER_REFRESH), 0);
    assert!(h.user.is_authenticated());
    assert_eq!(h.navigator.redirect_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn replayed_request_is_not_retried_again() {
    let transport = ScriptedTransport::new(|request| {
        if is_refresh(request) {
            fresh_pair()
        } else {
            Reply::status(401)
        }
    });
    let h = Harness::new(transport).signed_in(AccountDomain::User, "stale", "r1");

    let err = h.user.get_json::<Value>("/jobs/1").await.unwrap_err();

    assert!(err.is_stale_credential());
    assert_eq!(h.transport.calls_to("/jobs/1"), 2);
    assert_eq!(h.transport.calls_to(USER_REFRESH), 1);
    // A second 401 after a good refresh is terminal for the request only.
    assert!(!h.user.coordinator().is_failed());
    assert_eq!(h.navigator.redirect_count(), 0);
    assert!(h.user.is_authenticated());
}

#[tokio::test(start_paused = true)]
async fn failure_stays_sticky_until_a_new_sign_in() {
    let h = Harness::new(api(|| Reply::status(401))).signed_in(AccountDomain::User, "stale", "r1");

    h.user.get_json::<Value>("/jobs/1").await.unwrap_err();
    assert_eq!(h.transport.calls_to(USER_REFRESH), 1);

    // Later, unrelated failure: straight to sign-in, no refresh, no second notice.
    let err = h.user.get_json::<Value>("/applications").await.unwrap_err();
    assert!(err.is_stale_credential());
    assert_eq!(h.transport.calls_to(USER_REFRESH), 1);
    assert_eq!(h.navigator.redirect_count(), 2);
    assert_eq!(h.navigator.notice_count(), 1);
    assert_eq!(h.user.phase(), CoordinatorPhase::Failed);

    h.user.sign_in(CredentialPair::new("fresh", "r3")).unwrap();
    assert_eq!(h.user.phase(), CoordinatorPhase::Idle);
    assert!(h.user.get_json::<Value>("/applications").await.is_ok());

    // Recovery is armed again after the new write.
    h.user.sign_in(CredentialPair::new("stale", "r4")).unwrap();
    h.user.get_json::<Value>("/jobs/2").await.unwrap_err();
    assert_eq!(h.transport.calls_to(USER_REFRESH), 2);
    assert_eq!(h.transport.requests_to(USER_REFRESH)[1].headers.get("x-refresh-token"), Some("r4"));
}

#[tokio::test(start_paused = true)]
async fn exempt_paths_ignore_the_failure_flag() {
    let h = Harness::new(api(|| Reply::status(500))).signed_in(AccountDomain::User, "stale", "r1");
    h.user.get_json::<Value>("/jobs/1").await.unwrap_err();
    assert!(h.user.coordinator().is_failed());
    let redirects = h.navigator.redirect_count();

    let err = h.user.execute(HttpRequest::post("/auth/login")).await.unwrap_err();

    assert!(err.is_stale_credential());
    assert_eq!(h.navigator.redirect_count(), redirects);
    assert_eq!(h.transport.calls_to(USER_REFRESH), 1);
}

#[tokio::test(start_paused = true)]
async fn storms_never_cross_account_domains() {
    let transport = ScriptedTransport::new(|request| {
        if request.url.ends_with(USER_REFRESH) {
            return Reply::status(500).after(secs(1));
        }
        match bearer(request) {
            Some("Bearer employer-access") => Reply::json(200, &json!([])).after(secs(1)),
            _ => Reply::status(401).after(secs(1)),
        }
    });
    let h = Harness::new(transport)
        .signed_in(AccountDomain::User, "stale", "r1")
        .signed_in(AccountDomain::Employer, "employer-access", "employer-refresh");
    let employer_revision = h.store.revision(AccountDomain::Employer);

    let (user_results, employer_result) =
        tokio::join!(h.storm(&h.user, 3), h.employer.get_json::<Value>("/jobs"));

    assert!(user_results.iter().all(|r| r.is_err()));
    assert!(employer_result.is_ok());
    assert_eq!(h.transport.calls_to(EMPLOYER_REFRESH), 0);
    assert_eq!(h.store.get(AccountDomain::User).unwrap(), None);
    assert_eq!(
        h.store.get(AccountDomain::Employer).unwrap(),
        Some(CredentialPair::new("employer-access", "employer-refresh"))
    );
    assert_eq!(h.store.revision(AccountDomain::Employer), employer_revision);
    assert_eq!(h.employer.phase(), CoordinatorPhase::Idle);
    assert_eq!(h.navigator.redirects(), vec![(AccountDomain::User, "/login".to_string())]);
}

#[tokio::test(start_paused = true)]
async fn employer_refresh_uses_its_own_endpoint_and_header() {
    let h = Harness::new(api(fresh_pair)).signed_in(AccountDomain::Employer, "stale", "er1");

    h.employer.get_json::<Value>("/jobs").await.unwrap();

    let refresh = &h.transport.requests_to(EMPLOYER_REFRESH)[0];
    assert_eq!(refresh.url, format!("{BASE_URL}/employer/auth/refresh"));
    assert_eq!(refresh.headers.get("x-employer-refresh-token"), Some("er1"));
    assert_eq!(h.transport.requests_to("/employer/jobs").len(), 2);
    assert_eq!(h.store.get(AccountDomain::User).unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn phase_reports_refreshing_while_ticket_is_open() {
    let h = Harness::new(api(fresh_pair)).signed_in(AccountDomain::User, "stale", "r1");
    let client = h.user.clone();

    let pending = tokio::spawn(async move { client.get_json::<Value>("/jobs/1").await });
    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert_eq!(h.user.phase(), CoordinatorPhase::Refreshing);
    assert!(pending.await.unwrap().is_ok());
    assert_eq!(h.user.phase(), CoordinatorPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn multipart_uploads_drop_explicit_content_type() {
    let h = Harness::new(ScriptedTransport::new(|_| Reply::json(201, &json!({ "id": 7 }))))
        .signed_in(AccountDomain::User, "a1", "r1");

    let request = HttpRequest::post("/resumes")
        .header("Content-Type", "multipart/form-data")
        .multipart(vec![
            MultipartPart::text("title", "CV"),
            MultipartPart::file("file", "cv.pdf", Some("application/pdf".into()), vec![1, 2]),
        ]);
    h.user.execute(request).await.unwrap();

    let sent = &h.transport.requests()[0];
    assert!(!sent.headers.contains("content-type"));
    assert_eq!(bearer(sent), Some("Bearer a1"));
    assert!(sent.body.is_multipart());
}

#[tokio::test(start_paused = true)]
async fn requests_target_the_domain_base_url() {
    let h = Harness::new(ScriptedTransport::new(|_| Reply::json(200, &json!({}))))
        .signed_in(AccountDomain::User, "a1", "r1");

    let _: Value = h.user.post_json("/jobs/1/apply", &json!({ "note": "hi" })).await.unwrap();

    let sent = &h.transport.requests()[0];
    assert_eq!(sent.url, format!("{BASE_URL}/jobs/1/apply"));
    assert_eq!(bearer(sent), Some("Bearer a1"));
}

#[tokio::test(start_paused = true)]
async fn sign_out_success_clears_local_credentials() {
    let h = Harness::new(ScriptedTransport::new(|_| Reply::status(204)))
        .signed_in(AccountDomain::Employer, "a1", "r1");
    let mut changes = h.store.subscribe();

    h.employer.sign_out().await.unwrap();

    assert!(!h.employer.is_authenticated());
    assert_eq!(h.transport.requests()[0].url, format!("{BASE_URL}/employer/auth/logout"));
    let change = changes.try_recv().unwrap();
    assert_eq!(change.domain, AccountDomain::Employer);
    assert!(change.is_sign_out());
}

#[tokio::test(start_paused = true)]
async fn sign_out_clears_locally_even_when_server_fails() {
    let h = Harness::new(ScriptedTransport::new(|_| Reply::status(503)))
        .signed_in(AccountDomain::User, "a1", "r1");

    let err = h.user.sign_out().await.unwrap_err();

    assert!(matches!(err, ApiError::Server { status: 503, .. }));
    assert!(!h.user.is_authenticated());
}

#[tokio::test(start_paused = true)]
async fn non_auth_failures_pass_through() {
    let transport = ScriptedTransport::new(|request| {
        if request.url.ends_with("/forbidden") {
            Reply::status(403)
        } else if request.url.ends_with("/broken") {
            Reply::status(500)
        } else {
            Reply::error(TransportError::Network("connection reset".into()))
        }
    });
    let h = Harness::new(transport).signed_in(AccountDomain::User, "a1", "r1");

    let forbidden = h.user.get_json::<Value>("/forbidden").await.unwrap_err();
    let broken = h.user.get_json::<Value>("/broken").await.unwrap_err();
    let offline = h.user.get_json::<Value>("/offline").await.unwrap_err();

    assert!(matches!(forbidden, ApiError::Forbidden { .. }));
    assert!(matches!(broken, ApiError::Server { status: 500, .. }));
    assert!(matches!(offline, ApiError::Network(_)));
    assert_eq!(h.transport.calls_to(USER_REFRESH), 0);
    assert_eq!(h.transport.total_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn request_timeout_is_not_a_stale_credential() {
    let h = Harness::new(ScriptedTransport::new(|_| Reply::status(200).after(secs(60))))
        .signed_in(AccountDomain::User, "a1", "r1");

    let request = HttpRequest::get("/reports/export").timeout(secs(5));
    let err = h.user.execute(request).await.unwrap_err();

    assert!(matches!(err, ApiError::Timeout(after) if after == secs(5)));
    assert_eq!(h.transport.calls_to(USER_REFRESH), 0);
    assert!(h.user.is_authenticated());
}

#[tokio::test(start_paused = true)]
async fn slow_refresh_times_out_and_fails_closed() {
    let h = Harness::new(api(|| fresh_pair().after(secs(30))))
        .signed_in(AccountDomain::User, "stale", "r1");

    let results = h.storm(&h.user, 2).await;

    assert!(results.iter().all(|r| matches!(r, Err(ApiError::Unauthorized { .. }))));
    assert_eq!(h.transport.calls_to(USER_REFRESH), 1);
    assert!(h.user.coordinator().is_failed());
    assert_eq!(h.navigator.redirect_count(), 1);
    assert_eq!(h.store.get(AccountDomain::User).unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn missing_refresh_token_fails_without_a_refresh_call() {
    let h = Harness::new(api(fresh_pair));

    let err = h.user.get_json::<Value>("/jobs/1").await.unwrap_err();

    assert!(err.is_stale_credential());
    assert_eq!(h.transport.calls_to(USER_REFRESH), 0);
    assert_eq!(bearer(&h.transport.requests()[0]), None);
    assert_eq!(h.navigator.redirect_count(), 1);
    assert_eq!(h.navigator.notice_count(), 1);
    assert!(h.user.coordinator().is_failed());
}

#[tokio::test(start_paused = true)]
async fn malformed_refresh_body_counts_as_failure() {
    let h = Harness::new(api(|| Reply::json(200, &json!({ "token": "x" }))))
        .signed_in(AccountDomain::User, "stale", "r1");

    h.user.get_json::<Value>("/jobs/1").await.unwrap_err();

    assert!(h.user.coordinator().is_failed());
    assert_eq!(h.store.get(AccountDomain::User).unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn late_401_joins_the_open_refresh() {
    let h = Harness::new(api(fresh_pair)).signed_in(AccountDomain::User, "stale", "r1");

    // First 401 lands at t=1s and opens a 1s refresh; the second lands at t=1.5s.
    let first = h.user.get_json::<Value>("/jobs/1");
    let second = async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        h.user.get_json::<Value>("/jobs/2").await
    };
    let (first, second) = tokio::join!(first, second);

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(h.transport.calls_to(USER_REFRESH), 1);
    assert_eq!(h.user.coordinator().storms(), 1);
    assert_eq!(bearer(&h.transport.requests_to("/jobs/2")[1]), Some("Bearer fresh"));
}

#[tokio::test(start_paused = true)]
async fn crashed_refresh_task_releases_the_ticket() {
    let transport = ScriptedTransport::new(|request| {
        if is_refresh(request) {
            panic!("refresh handler crashed");
        }
        match bearer(request) {
            Some("Bearer fresh") => Reply::status(200),
            _ => Reply::status(401),
        }
    });
    let h = Harness::new(transport).signed_in(AccountDomain::User, "stale", "r1");

    let err = h.user.get_json::<Value>("/jobs/1").await.unwrap_err();

    assert!(err.is_stale_credential());
    assert_eq!(h.user.phase(), CoordinatorPhase::Failed);
    assert_eq!(h.navigator.redirect_count(), 1);
    assert_eq!(h.navigator.notice_count(), 1);
    assert!(!h.user.is_authenticated());

    h.user.sign_in(CredentialPair::new("fresh", "r2")).unwrap();
    assert_eq!(h.user.phase(), CoordinatorPhase::Idle);
    h.user.execute(HttpRequest::get("/jobs/1")).await.unwrap();
}
