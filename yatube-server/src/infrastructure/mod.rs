pub(crate) mod database;
pub(crate) mod logging;
pub(crate) mod session_token;
pub(crate) mod settings;
