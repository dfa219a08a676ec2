use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tera::Context;
use thiserror::Error;
use tracing::error;

use crate::domain::error::DomainError;
use crate::presentation::templates::{self, TemplateError};
use crate::presentation::urls;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Anonymous access to a page that needs a session; `next` is where to come back to.
    #[error("login required for {next}")]
    LoginRequired { next: String },

    #[error("not found")]
    NotFound,

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

pub(crate) type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::LoginRequired { next } => Redirect::to(&urls::login(&next)).into_response(),
            AppError::NotFound => error_page(StatusCode::NOT_FOUND, "core/404.html"),
            AppError::Domain(err) => match &err {
                DomainError::NotFound(_) => error_page(StatusCode::NOT_FOUND, "core/404.html"),
                DomainError::Forbidden => error_page(StatusCode::FORBIDDEN, "core/403.html"),
                DomainError::Validation { .. } => {
                    (StatusCode::BAD_REQUEST, err.to_string()).into_response()
                }
                DomainError::AlreadyExists(_) => {
                    (StatusCode::CONFLICT, err.to_string()).into_response()
                }
                DomainError::InvalidCredentials => {
                    (StatusCode::UNAUTHORIZED, err.to_string()).into_response()
                }
                DomainError::Unexpected(_) => {
                    error!(error = %err, "unexpected domain error");
                    internal_error()
                }
            },
            AppError::Template(err) => {
                error!(error = %err, "template error");
                internal_error()
            }
            AppError::Internal(err) => {
                error!(error = ?err, "internal error");
                internal_error()
            }
        }
    }
}

fn error_page(status: StatusCode, template: &str) -> Response {
    let mut context = Context::new();
    context.insert("user", &Option::<()>::None);

    match templates::render(template, &context) {
        Ok(html) => (status, html).into_response(),
        Err(err) => {
            error!(error = %err, "failed to render error page");
            (status, status.canonical_reason().unwrap_or("error")).into_response()
        }
    }
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
}

#[cfg(test)]
mod tests {
    use axum::{
        http::{StatusCode, header},
        response::IntoResponse,
    };

    use super::AppError;
    use crate::domain::error::DomainError;

    #[test]
    fn login_required_redirects_with_next() {
        let response = AppError::LoginRequired {
            next: "/posts/1/edit/".to_string(),
        }
        .into_response();

        assert!(response.status().is_redirection());
        assert_eq!(
            response.headers()[header::LOCATION],
            "/auth/login/?next=/posts/1/edit/"
        );
    }

    #[test]
    fn domain_errors_map_to_statuses() {
        let cases = [
            (DomainError::not_found("post"), StatusCode::NOT_FOUND),
            (DomainError::Forbidden, StatusCode::FORBIDDEN),
            (
                DomainError::AlreadyExists("group slug".to_string()),
                StatusCode::CONFLICT,
            ),
            (
                DomainError::Unexpected("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }
}
