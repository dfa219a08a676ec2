use axum::{
    Form,
    extract::{Query, State},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::debug;

use crate::application::auth_service::AuthResult;
use crate::presentation::AppState;
use crate::presentation::app_error::AppResult;
use crate::presentation::forms::{FormErrors, LoginDto, LoginFormView, SignupDto, SignupFormView};
use crate::presentation::handlers::posts::render;
use crate::presentation::middleware::session::{CurrentUser, cleared_session_cookie, session_cookie};
use crate::presentation::urls;
use crate::presentation::views::page_context;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NextQuery {
    pub(crate) next: Option<String>,
}

pub(crate) async fn signup_form(current: CurrentUser) -> AppResult<Html<String>> {
    render_signup(&current, SignupFormView::default())
}

pub(crate) async fn signup(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(dto): Form<SignupDto>,
) -> AppResult<Response> {
    let request = match dto.to_request() {
        Ok(request) => request,
        Err(errors) => return signup_again(&current, &dto, errors),
    };

    match state.auth_service.register(request).await {
        Ok(auth) => logged_in(&state, auth, "/"),
        Err(err) => match FormErrors::from_domain(&err) {
            Some(errors) => signup_again(&current, &dto, errors),
            None => Err(err.into()),
        },
    }
}

pub(crate) async fn login_form(
    current: CurrentUser,
    Query(query): Query<NextQuery>,
) -> AppResult<Html<String>> {
    let form = LoginFormView {
        next: query.next.unwrap_or_default(),
        ..LoginFormView::default()
    };
    render_login(&current, form)
}

pub(crate) async fn login(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(dto): Form<LoginDto>,
) -> AppResult<Response> {
    let request = match dto.to_request() {
        Ok(request) => request,
        Err(errors) => return login_again(&current, &dto, errors),
    };

    match state.auth_service.login(request).await {
        Ok(auth) => logged_in(&state, auth, urls::safe_next(dto.next.as_deref())),
        Err(err) => match FormErrors::from_domain(&err) {
            Some(errors) => login_again(&current, &dto, errors),
            None => Err(err.into()),
        },
    }
}

pub(crate) async fn logout(State(state): State<AppState>) -> AppResult<Response> {
    let cookie = cleared_session_cookie(state.cookie_secure)?;
    let html = render("users/logged_out.html", &page_context(None))?;
    Ok(([(header::SET_COOKIE, cookie)], html).into_response())
}

fn logged_in(state: &AppState, auth: AuthResult, target: &str) -> AppResult<Response> {
    let cookie = session_cookie(
        &auth.session_token,
        state.sessions.ttl_seconds(),
        state.cookie_secure,
    )?;
    debug!(user_id = auth.user.id, "session cookie issued");
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(target)).into_response())
}

fn signup_again(current: &CurrentUser, dto: &SignupDto, errors: FormErrors) -> AppResult<Response> {
    let form = SignupFormView {
        username: dto.username.clone(),
        email: dto.email.clone(),
        errors,
    };
    Ok(render_signup(current, form)?.into_response())
}

fn login_again(current: &CurrentUser, dto: &LoginDto, errors: FormErrors) -> AppResult<Response> {
    let form = LoginFormView {
        username: dto.username.clone(),
        next: dto.next.clone().unwrap_or_default(),
        errors,
    };
    Ok(render_login(current, form)?.into_response())
}

fn render_signup(current: &CurrentUser, form: SignupFormView) -> AppResult<Html<String>> {
    let mut context = page_context(current.user());
    context.insert("form", &form);
    render("users/signup.html", &context)
}

fn render_login(current: &CurrentUser, form: LoginFormView) -> AppResult<Html<String>> {
    let mut context = page_context(current.user());
    context.insert("form", &form);
    render("users/login.html", &context)
}
