//! HTML templates, compiled into the binary and parsed once on first use.

use axum::response::Html;
use once_cell::sync::Lazy;
use tera::{Context, Tera};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum TemplateError {
    #[error("templates failed to load: {0}")]
    Load(String),

    #[error("failed to render template '{name}': {message}")]
    Render { name: String, message: String },
}

macro_rules! template {
    ($name:literal) => {
        ($name, include_str!(concat!("../../templates/", $name)))
    };
}

static TEMPLATES: Lazy<Result<Tera, String>> = Lazy::new(|| load().map_err(|err| error_chain(&err)));

fn load() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        template!("base.html"),
        template!("includes/header.html"),
        template!("includes/footer.html"),
        template!("includes/post_card.html"),
        template!("includes/post_list.html"),
        template!("includes/paginator.html"),
        template!("posts/index.html"),
        template!("posts/group_list.html"),
        template!("posts/profile.html"),
        template!("posts/post_detail.html"),
        template!("posts/create_post.html"),
        template!("users/login.html"),
        template!("users/signup.html"),
        template!("users/logged_out.html"),
        template!("core/404.html"),
        template!("core/403.html"),
    ])?;
    Ok(tera)
}

// tera keeps the useful part of a failure (which variable, which line) in `source()`.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn engine() -> Result<&'static Tera, TemplateError> {
    TEMPLATES
        .as_ref()
        .map_err(|message| TemplateError::Load(message.clone()))
}

/// Forces template parsing so that a broken template fails at startup, not on first request.
pub(crate) fn ensure_loaded() -> Result<(), TemplateError> {
    engine().map(|_| ())
}

pub(crate) fn render(name: &str, context: &Context) -> Result<Html<String>, TemplateError> {
    engine()?
        .render(name, context)
        .map(Html)
        .map_err(|err| TemplateError::Render {
            name: name.to_string(),
            message: error_chain(&err),
        })
}
