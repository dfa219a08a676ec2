use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, Uri, header, request::Parts},
    middleware::Next,
    response::Response,
};
use cookie::{Cookie, SameSite, time::Duration};
use serde::Serialize;
use tracing::debug;

use crate::presentation::AppState;
use crate::presentation::app_error::AppError;

pub(crate) const SESSION_COOKIE: &str = "yatube_session";

#[derive(Debug, Clone, Serialize)]
pub(crate) struct AuthenticatedUser {
    #[serde(rename = "id")]
    pub(crate) user_id: i64,
    pub(crate) username: String,
}

/// The session user, if any. Always available once `session_middleware` ran.
#[derive(Debug, Clone, Default)]
pub(crate) struct CurrentUser(pub(crate) Option<AuthenticatedUser>);

impl CurrentUser {
    pub(crate) fn user(&self) -> Option<&AuthenticatedUser> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .unwrap_or_default())
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .and_then(|current| current.0.clone())
            .ok_or_else(|| AppError::LoginRequired {
                next: original_path(&parts.uri),
            })
    }
}

/// Resolves the session cookie into a `CurrentUser`; bad or expired tokens mean anonymous.
pub(crate) async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = session_token(request.headers()).and_then(|token| {
        match state.sessions.verify(&token) {
            Ok(claims) => Some(AuthenticatedUser {
                user_id: claims.user_id,
                username: claims.username,
            }),
            Err(err) => {
                debug!(error = %err, "ignoring invalid session cookie");
                None
            }
        }
    });

    request.extensions_mut().insert(CurrentUser(user));
    next.run(request).await
}

/// Sends anonymous requests to the login page, remembering where they were going.
pub(crate) async fn login_required(request: Request, next: Next) -> Result<Response, AppError> {
    let logged_in = request
        .extensions()
        .get::<CurrentUser>()
        .is_some_and(|current| current.0.is_some());
    if !logged_in {
        return Err(AppError::LoginRequired {
            next: original_path(request.uri()),
        });
    }

    Ok(next.run(request).await)
}

pub(crate) fn session_cookie(
    token: &str,
    ttl_seconds: i64,
    secure: bool,
) -> Result<HeaderValue, AppError> {
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::seconds(ttl_seconds))
        .build();
    header_value(&cookie)
}

pub(crate) fn cleared_session_cookie(secure: bool) -> Result<HeaderValue, AppError> {
    let mut cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build();
    cookie.make_removal();
    header_value(&cookie)
}

fn header_value(cookie: &Cookie<'_>) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(&cookie.to_string())
        .map_err(|err| AppError::Internal(anyhow::anyhow!("invalid cookie header: {err}")))
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

fn original_path(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}
