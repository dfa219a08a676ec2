pub(crate) mod group_repository;
pub(crate) mod post_repository;
pub(crate) mod user_repository;
