pub(crate) mod categories;
