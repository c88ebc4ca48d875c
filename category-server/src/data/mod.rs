pub(crate) mod category_store;
pub(crate) mod repositories;
