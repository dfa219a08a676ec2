pub(crate) mod auth_service;
pub(crate) mod blog_service;
pub(crate) mod group_service;
