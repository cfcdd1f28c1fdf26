//! Request handlers and their request/response bodies.
//!
//! Protocol operations are synchronous storage work, so every handler
//! moves them onto the blocking pool.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use tradepost_exchange::{codec, AssetMetadata, ExchangeError};
use tradepost_store::{Identity, TradeEntry};
use tradepost_types::{GeoPoint, Handle, Timestamp};
use tradepost_verification::Leaderboard;

use crate::error::RpcError;
use crate::pagination::{PageMeta, PageParams};
use crate::state::AppState;

// ── Request/response bodies ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub handle: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IdentityResponse {
    pub identity: Identity,
    pub asset: Option<AssetMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub verifier: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub identity: Identity,
    pub newly_verified: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PointsResponse {
    pub handle: Handle,
    pub points: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RankResponse {
    pub handle: Handle,
    pub points: u64,
    pub rank: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TradesResponse {
    pub handle: Handle,
    pub trades: Vec<TradeEntry>,
    pub total: u64,
    pub page: PageMeta,
}

#[derive(Debug, Deserialize)]
pub struct IssueRequest {
    pub handle: String,
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IssueResponse {
    pub token: String,
    pub expiry: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub token: String,
    /// The confirming identity.
    pub handle: String,
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RedeemResponse {
    pub trade: TradeEntry,
    /// The confirmer's newly received asset.
    pub asset: Option<AssetMetadata>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    #[serde(flatten)]
    pub leaderboard: Leaderboard,
    pub page: PageMeta,
}

// ── Helpers ─────────────────────────────────────────────────────────────

async fn blocking<T, E, F>(f: F) -> Result<T, RpcError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<RpcError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| RpcError::Internal(e.to_string()))?
        .map_err(Into::into)
}

fn parse_handle(raw: &str) -> Result<Handle, RpcError> {
    Handle::parse(raw).map_err(|e| RpcError::Exchange(e.into()))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, RpcError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| RpcError::InvalidRequest(e.body_text()))
}

// ── Handlers ────────────────────────────────────────────────────────────

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let text = state.metrics.as_ref().map(|m| m.render()).unwrap_or_default();
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        text,
    )
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, RpcError> {
    let req = body(payload)?;
    let registry = state.registry.clone();
    let registration = blocking(move || registry.register(&req.handle)).await?;
    let status = if registration.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(IdentityResponse {
            identity: registration.identity,
            asset: registration.asset,
        }),
    ))
}

pub async fn get_identity(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<IdentityResponse>, RpcError> {
    let handle = parse_handle(&handle)?;
    let registry = state.registry.clone();
    let (identity, asset) = blocking(move || registry.get(&handle)).await?;
    Ok(Json(IdentityResponse { identity, asset }))
}

pub async fn verify(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, RpcError> {
    let handle = parse_handle(&handle)?;
    let req = body(payload)?;
    let verifier = req.verifier.trim().to_string();
    if !state.is_trusted_verifier(&verifier) {
        tracing::warn!(handle = %handle, verifier = %verifier, "untrusted verifier rejected");
        return Err(RpcError::UnauthorizedVerifier(verifier));
    }
    let engine = state.verification.clone();
    let outcome = blocking(move || engine.verify(&handle, &verifier)).await?;
    if outcome.newly_verified {
        state.record(|m| m.identity_verified());
    }
    Ok(Json(VerifyResponse {
        identity: outcome.identity,
        newly_verified: outcome.newly_verified,
    }))
}

pub async fn points(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<PointsResponse>, RpcError> {
    let handle = parse_handle(&handle)?;
    let scoring = state.scoring.clone();
    let h = handle.clone();
    let points = blocking(move || scoring.points(&h)).await?;
    Ok(Json(PointsResponse { handle, points }))
}

pub async fn rank(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<RankResponse>, RpcError> {
    let handle = parse_handle(&handle)?;
    let scoring = state.scoring.clone();
    let h = handle.clone();
    let (points, rank) = blocking(move || {
        let points = scoring.points(&h)?;
        scoring.rank(points).map(|rank| (points, rank))
    })
    .await?;
    Ok(Json(RankResponse {
        handle,
        points,
        rank,
    }))
}

pub async fn trades(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    Query(page): Query<PageParams>,
) -> Result<Json<TradesResponse>, RpcError> {
    let handle = parse_handle(&handle)?;
    let scoring = state.scoring.clone();
    let h = handle.clone();
    let (limit, offset) = (page.effective_limit(), page.effective_offset());
    let (trades, total) = blocking(move || {
        let trades = scoring.history(&h, limit, offset)?;
        scoring.trade_count(&h).map(|total| (trades, total))
    })
    .await?;
    let meta = page.meta(trades.len(), total);
    Ok(Json(TradesResponse {
        handle,
        trades,
        total,
        page: meta,
    }))
}

pub async fn issue_token(
    State(state): State<AppState>,
    payload: Result<Json<IssueRequest>, JsonRejection>,
) -> Result<Json<IssueResponse>, RpcError> {
    let req = body(payload)?;
    let handle = parse_handle(&req.handle)?;
    let issuer = state.issuer.clone();
    let issued = blocking(move || issuer.issue(&handle, req.location)).await?;
    state.record(|m| m.token_issued());
    Ok(Json(IssueResponse {
        token: issued.token,
        expiry: issued.expiry,
    }))
}

pub async fn redeem_token(
    State(state): State<AppState>,
    payload: Result<Json<RedeemRequest>, JsonRejection>,
) -> Result<Json<RedeemResponse>, RpcError> {
    let req = body(payload)?;
    // An undecodable token is reported ahead of a bad handle.
    if let Err(e) = codec::decode(&req.token) {
        let e = ExchangeError::from(e);
        state.record(|m| m.redemption_rejected(e.code()));
        return Err(e.into());
    }
    let confirmer = parse_handle(&req.handle)?;
    let executor = state.executor.clone();
    let result = blocking(move || executor.redeem(&req.token, &confirmer, req.location)).await;
    match result {
        Ok(outcome) => {
            state.record(|m| m.trade_completed());
            Ok(Json(RedeemResponse {
                trade: outcome.entry,
                asset: outcome.confirmer_asset,
            }))
        }
        Err(e) => {
            if let RpcError::Exchange(inner) = &e {
                state.record(|m| m.redemption_rejected(inner.code()));
            }
            Err(e)
        }
    }
}

pub async fn leaderboard(
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
) -> Result<Json<LeaderboardResponse>, RpcError> {
    let scoring = state.scoring.clone();
    let (limit, offset) = (page.effective_limit(), page.effective_offset());
    let leaderboard = blocking(move || scoring.leaderboard(limit, offset)).await?;
    let meta = page.meta(leaderboard.entries.len(), leaderboard.total);
    Ok(Json(LeaderboardResponse {
        leaderboard,
        page: meta,
    }))
}
