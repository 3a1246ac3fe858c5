//! HTTP router.
//!
//! Returns a composable `Router`; `serve()` mounts it on a listener and
//! tests drive it directly with `oneshot`.
//!
//! Routes:
//! - `GET  /`           service banner
//! - `GET  /health`     liveness + active policy
//! - `POST /analyze`    triage one case (multipart)
//! - `GET  /cases`      all cases, newest first
//! - `GET  /cases/:id`  one case

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the API router.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(ctx: ApiContext) -> Router {
    let body_limit = ctx.body_limit();

    Router::new()
        .route("/", get(endpoints::health::banner))
        .route("/health", get(endpoints::health::check))
        .route("/analyze", post(endpoints::analyze::analyze))
        .route("/cases", get(endpoints::cases::list))
        .route("/cases/:id", get(endpoints::cases::detail))
        .with_state(ctx)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
}
