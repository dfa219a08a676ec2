use std::sync::Arc;

use crate::application::auth_service::AuthService;
use crate::application::blog_service::BlogService;
use crate::infrastructure::session_token::SessionTokens;

pub(crate) mod app_error;
pub(crate) mod forms;
pub(crate) mod handlers;
pub(crate) mod http_handlers;
pub(crate) mod middleware;
pub(crate) mod routes;
pub(crate) mod templates;
pub(crate) mod urls;
pub(crate) mod views;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) auth_service: Arc<AuthService>,
    pub(crate) blog_service: Arc<BlogService>,
    pub(crate) sessions: Arc<SessionTokens>,
    pub(crate) cookie_secure: bool,
}

impl AppState {
    pub(crate) fn new(
        auth_service: Arc<AuthService>,
        blog_service: Arc<BlogService>,
        sessions: Arc<SessionTokens>,
        cookie_secure: bool,
    ) -> Self {
        Self {
            auth_service,
            blog_service,
            sessions,
            cookie_secure,
        }
    }
}
