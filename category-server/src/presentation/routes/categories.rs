use axum::Router;
use axum::middleware;
use axum::routing::{get, post, put};

use crate::presentation::AppState;
use crate::presentation::handlers::categories::{
    add_book_category, create_category, delete_category, get_category, list_categories,
    list_categories_for_book, update_category,
};
use crate::presentation::middleware::auth::{require_admin_or_author, require_authenticated};

pub(crate) fn router(state: AppState) -> Router<AppState> {
    let readers = Router::new()
        .route("/", get(list_categories))
        .route("/{id}", get(get_category))
        .route("/books/{id}", get(list_categories_for_book))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_authenticated,
        ));

    let editors = Router::new()
        .route("/", post(create_category))
        .route("/{id}", put(update_category).delete(delete_category))
        .route("/books", post(add_book_category))
        .layer(middleware::from_fn_with_state(
            state,
            require_admin_or_author,
        ));

    readers.merge(editors)
}
