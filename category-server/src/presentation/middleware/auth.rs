use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::application::access_control::{AccessPolicy, authorize};
use crate::domain::error::DomainError;
use crate::domain::identity::Role;
use crate::presentation::AppState;
use crate::presentation::app_error::AppError;

/// Identity attached to the request by the access-control middleware.
#[derive(Debug, Clone)]
pub(crate) struct AuthenticatedUser {
    pub(crate) subject_id: i64,
    pub(crate) role: Role,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::Domain(DomainError::Unauthenticated(
                "missing identity",
            )))
    }
}

pub(crate) async fn require_authenticated(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(&state, AccessPolicy::Authenticated, request, next).await
}

pub(crate) async fn require_admin_or_author(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(&state, AccessPolicy::AdminOrAuthor, request, next).await
}

async fn enforce(
    state: &AppState,
    policy: AccessPolicy,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let authorization = match request.headers().get(header::AUTHORIZATION) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| DomainError::Unauthenticated("malformed bearer token"))?
                .to_string(),
        ),
        None => None,
    };

    let identity = authorize(state.auth_gateway.as_ref(), authorization.as_deref(), policy)
        .await
        .inspect_err(|err| debug!(error = %err, ?policy, uri = %request.uri(), "access rejected"))?;

    request.extensions_mut().insert(AuthenticatedUser {
        subject_id: identity.subject_id,
        role: identity.role,
    });

    Ok(next.run(request).await)
}
