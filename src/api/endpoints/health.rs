//! Service banner and health check.

use axum::extract::State;
use axum::Json;

use crate::api::types::{ApiContext, BannerResponse, HealthResponse};

/// `GET /` — service banner.
pub async fn banner() -> Json<BannerResponse> {
    Json(BannerResponse {
        message: "DermSight Backend Running",
    })
}

/// `GET /health` — liveness plus the active scoring policy.
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        risk_policy: ctx.engine.policy_kind().as_str(),
    })
}
