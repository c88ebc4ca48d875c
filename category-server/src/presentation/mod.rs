use std::sync::Arc;

use crate::application::auth_gateway::AuthGateway;
use crate::application::category_service::CategoryService;
use crate::data::repositories::postgres::category_store::PostgresCategoryStore;

pub(crate) mod app_error;
pub(crate) mod handlers;
pub(crate) mod http_handlers;
pub(crate) mod middleware;
pub(crate) mod openapi;
pub(crate) mod routes;

#[cfg(test)]
pub(crate) mod test_support;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) category_service: Arc<CategoryService<PostgresCategoryStore>>,
    pub(crate) auth_gateway: Arc<dyn AuthGateway>,
}

impl AppState {
    pub(crate) fn new(
        category_service: Arc<CategoryService<PostgresCategoryStore>>,
        auth_gateway: Arc<dyn AuthGateway>,
    ) -> Self {
        Self {
            category_service,
            auth_gateway,
        }
    }
}
