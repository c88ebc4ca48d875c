pub(crate) mod access_control;
pub(crate) mod auth_gateway;
pub(crate) mod category_service;
