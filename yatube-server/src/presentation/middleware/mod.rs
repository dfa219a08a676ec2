pub(crate) mod limits;
pub(crate) mod session;
pub(crate) mod trace;
