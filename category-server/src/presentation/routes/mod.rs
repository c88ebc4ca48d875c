use axum::Router;

use super::AppState;

pub(crate) mod categories;

pub(crate) fn router(state: AppState) -> Router<AppState> {
    Router::new().nest("/api/v1/categories", categories::router(state))
}
