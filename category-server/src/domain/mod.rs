pub(crate) mod category;
pub(crate) mod error;
pub(crate) mod identity;
pub(crate) mod pagination;
