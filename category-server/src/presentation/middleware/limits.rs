use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use axum::{BoxError, Json, Router};
use serde::Serialize;
use tower::ServiceBuilder;
use tower::timeout::TimeoutLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::warn;

use crate::infrastructure::settings::Settings;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Caps body size and total request time. The timeout also bounds how long a
/// request can keep a database transaction open.
pub(crate) fn apply_limits(router: Router, settings: &Settings) -> Router {
    with_limits(
        router,
        settings.http_request_body_limit_bytes,
        Duration::from_secs(settings.http_request_timeout_secs),
    )
}

fn with_limits(router: Router, body_limit_bytes: usize, timeout: Duration) -> Router {
    router
        .layer(RequestBodyLimitLayer::new(body_limit_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .layer(TimeoutLayer::new(timeout)),
        )
}

async fn handle_middleware_error(err: BoxError) -> (StatusCode, Json<ErrorBody>) {
    if err.is::<tower::timeout::error::Elapsed>() {
        warn!("request timed out");
        return (
            StatusCode::REQUEST_TIMEOUT,
            Json(ErrorBody {
                error: "request timed out".to_string(),
            }),
        );
    }

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: format!("unhandled middleware error: {err}"),
        }),
    )
}
