pub(crate) mod database;
pub(crate) mod identity_client;
pub(crate) mod logging;
pub(crate) mod settings;
