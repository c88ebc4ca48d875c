pub(crate) mod category_store;
