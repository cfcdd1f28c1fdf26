//! HTTP-level tests: the router driven with `tower::ServiceExt::oneshot`
//! over the in-memory store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use tradepost_crypto::{SigningKey, TokenSigner};
use tradepost_exchange::StaticCatalog;
use tradepost_nullables::{NullClock, NullNotifier, NullStore};
use tradepost_rpc::{router, AppState, RpcMetrics};
use tradepost_types::ExchangeParams;

const BERLIN: (f64, f64) = (52.520008, 13.404954);
const BERLIN_NEARBY: (f64, f64) = (52.520108, 13.404954);
const MUNICH: (f64, f64) = (48.137154, 11.576124);

#[derive(Default)]
struct CountingMetrics {
    issued: AtomicU64,
    completed: AtomicU64,
    verified: AtomicU64,
    rejected: Mutex<Vec<String>>,
}

impl RpcMetrics for CountingMetrics {
    fn token_issued(&self) {
        self.issued.fetch_add(1, Ordering::Relaxed);
    }
    fn trade_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }
    fn redemption_rejected(&self, code: &str) {
        self.rejected.lock().unwrap().push(code.to_string());
    }
    fn identity_verified(&self) {
        self.verified.fetch_add(1, Ordering::Relaxed);
    }
    fn render(&self) -> String {
        format!(
            "tradepost_tokens_issued_total {}\n",
            self.issued.load(Ordering::Relaxed)
        )
    }
}

fn state() -> AppState {
    AppState::new(
        Arc::new(NullStore::new()),
        Arc::new(TokenSigner::new(SigningKey::from_bytes(&[5; 32]).unwrap())),
        Arc::new(NullClock::new(1_700_000_000_000)),
        ExchangeParams::default(),
        Arc::new(StaticCatalog::numbered(50)),
        Arc::new(NullNotifier::new()),
    )
}

fn app() -> Router {
    router(state())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn loc((lat, lon): (f64, f64)) -> Value {
    json!({ "lat": lat, "lon": lon })
}

async fn register(app: &Router, handle: &str) -> u64 {
    let (status, body) = send(app, "POST", "/identities", Some(json!({ "handle": handle }))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["identity"]["asset_index"].as_u64().unwrap()
}

async fn issue(app: &Router, handle: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/tokens",
        Some(json!({ "handle": handle, "location": loc(BERLIN) })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_ok() {
    let (status, body) = send(&app(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn register_is_idempotent() {
    let app = app();
    let asset = register(&app, "alice").await;

    let (status, body) = send(&app, "POST", "/identities", Some(json!({ "handle": "alice" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["identity"]["asset_index"].as_u64(), Some(asset));
    assert_eq!(body["asset"]["index"].as_u64(), Some(asset));

    let (status, body) = send(&app, "GET", "/identities/alice", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["identity"]["handle"], "alice");
}

#[tokio::test]
async fn bad_handles_and_bodies_are_400() {
    let app = app();
    let (status, body) =
        send(&app, "POST", "/identities", Some(json!({ "handle": "has space" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidHandle");

    let (status, body) = send(&app, "POST", "/identities", Some(json!({ "nope": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidRequest");
}

#[tokio::test]
async fn unknown_identity_is_404() {
    let (status, body) = send(&app(), "GET", "/identities/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "IdentityNotFound");
}

#[tokio::test]
async fn issue_requires_location() {
    let app = app();
    register(&app, "alice").await;
    let (status, body) = send(&app, "POST", "/tokens", Some(json!({ "handle": "alice" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "LocationRequired");
}

#[tokio::test]
async fn redeem_swaps_then_replay_conflicts() {
    let app = app();
    let asset_a = register(&app, "alice").await;
    let asset_b = register(&app, "bob").await;
    let token = issue(&app, "alice").await;

    let redeem = json!({ "token": token, "handle": "bob", "location": loc(BERLIN_NEARBY) });
    let (status, body) = send(&app, "POST", "/tokens/redeem", Some(redeem.clone())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["trade"]["participant_a"], "alice");
    assert_eq!(body["trade"]["asset_a"].as_u64(), Some(asset_a));
    assert_eq!(body["trade"]["asset_b"].as_u64(), Some(asset_b));
    assert_eq!(body["asset"]["index"].as_u64(), Some(asset_a));

    let (_, body) = send(&app, "GET", "/identities/bob", None).await;
    assert_eq!(body["identity"]["asset_index"].as_u64(), Some(asset_a));

    let (status, body) = send(&app, "POST", "/tokens/redeem", Some(redeem)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ReplayOrInvalid");

    let (_, body) = send(&app, "GET", "/identities/alice/trades", None).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["trades"][0]["participant_b"], "bob");
}

#[tokio::test]
async fn out_of_range_reports_distance() {
    let app = app();
    register(&app, "alice").await;
    register(&app, "bob").await;
    let token = issue(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/tokens/redeem",
        Some(json!({ "token": token, "handle": "bob", "location": loc(MUNICH) })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "OutOfRange");
    assert!(body["distance_m"].as_f64().unwrap() > 100_000.0);
}

#[tokio::test]
async fn garbage_token_is_invalid_payload() {
    let app = app();
    register(&app, "bob").await;
    let (status, body) = send(
        &app,
        "POST",
        "/tokens/redeem",
        Some(json!({ "token": "!!!", "handle": "bob", "location": loc(BERLIN) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidPayload");
    assert!(body.get("distance_m").is_none());
}

#[tokio::test]
async fn undecodable_token_is_reported_before_bad_handle() {
    let metrics = Arc::new(CountingMetrics::default());
    let app = router(state().with_metrics(metrics.clone()));
    let (status, body) = send(
        &app,
        "POST",
        "/tokens/redeem",
        Some(json!({ "token": "!!!", "handle": "has space", "location": loc(BERLIN) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidPayload");
    assert_eq!(*metrics.rejected.lock().unwrap(), vec!["InvalidPayload".to_string()]);
}

#[tokio::test]
async fn verify_checks_trusted_list() {
    let app = router(state().with_trusted_verifiers(vec!["city-hall".into()]));
    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/identities/alice/verify",
        Some(json!({ "verifier": "mallory" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "UnauthorizedVerifier");

    let (status, body) = send(
        &app,
        "POST",
        "/identities/alice/verify",
        Some(json!({ "verifier": "  city-hall " })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["newly_verified"], true);
    assert_eq!(body["identity"]["verified_by"], "city-hall");
}

#[tokio::test]
async fn points_rank_and_leaderboard() {
    let app = app();
    register(&app, "alice").await;
    register(&app, "bob").await;
    let token = issue(&app, "alice").await;
    let (status, _) = send(
        &app,
        "POST",
        "/tokens/redeem",
        Some(json!({ "token": token, "handle": "bob", "location": loc(BERLIN) })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    for handle in ["alice", "bob"] {
        let uri = format!("/identities/{handle}/verify");
        send(&app, "POST", &uri, Some(json!({ "verifier": "desk" }))).await;
    }

    let (_, body) = send(&app, "GET", "/identities/alice/points", None).await;
    assert_eq!(body["points"], 1);
    let (_, body) = send(&app, "GET", "/identities/bob/rank", None).await;
    assert_eq!(body["rank"], 1);

    let (status, body) = send(&app, "GET", "/leaderboard?limit=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["entries"].as_array().unwrap().len(), 1);
    assert_eq!(body["entries"][0]["handle"], "alice");
    assert_eq!(body["page"]["next_offset"], 1);
}

#[tokio::test]
async fn metrics_route_counts_outcomes() {
    let metrics = Arc::new(CountingMetrics::default());
    let app = router(state().with_metrics(metrics.clone()));
    register(&app, "alice").await;
    register(&app, "bob").await;
    let token = issue(&app, "alice").await;
    let redeem = json!({ "token": token, "handle": "bob", "location": loc(BERLIN) });
    send(&app, "POST", "/tokens/redeem", Some(redeem.clone())).await;
    send(&app, "POST", "/tokens/redeem", Some(redeem)).await;

    assert_eq!(metrics.issued.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.completed.load(Ordering::Relaxed), 1);
    assert_eq!(*metrics.rejected.lock().unwrap(), vec!["ReplayOrInvalid".to_string()]);

    let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let text = resp.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&text).contains("tradepost_tokens_issued_total 1"));
}

#[tokio::test]
async fn metrics_route_absent_without_registry() {
    let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
