use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

use crate::infrastructure::settings::Settings;

const ALLOWED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(600);

/// `*` on its own opens the API to any origin; otherwise every entry must be a
/// valid origin. Mixing the two is a configuration error.
fn allowed_origins(cors_origins: &[String]) -> Result<AllowOrigin> {
    if cors_origins.is_empty() {
        bail!("CORS_ORIGINS must list at least one origin");
    }

    if cors_origins.iter().any(|origin| origin == "*") {
        if cors_origins.len() > 1 {
            bail!("CORS_ORIGINS cannot mix `*` with explicit origins");
        }
        return Ok(AllowOrigin::any());
    }

    let mut origins = Vec::with_capacity(cors_origins.len());
    for origin in cors_origins {
        let value = HeaderValue::from_str(origin)
            .map_err(|err| anyhow!("invalid CORS origin {origin:?}: {err}"))?;
        if !origins.contains(&value) {
            origins.push(value);
        }
    }

    Ok(AllowOrigin::list(origins))
}

pub(crate) fn build_cors_layer(cors_origins: &[String]) -> Result<CorsLayer> {
    let origins = allowed_origins(cors_origins)?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(PREFLIGHT_MAX_AGE))
}

pub(crate) fn apply_cors(router: Router, settings: &Settings) -> Result<Router> {
    let cors = build_cors_layer(&settings.cors_origins)?;
    info!(origins = ?settings.cors_origins, "CORS configured");
    Ok(router.layer(cors))
}
