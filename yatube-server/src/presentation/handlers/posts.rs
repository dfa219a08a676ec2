use axum::{
    Form,
    extract::{FromRequestParts, Path, Query, State, rejection::FormRejection},
    http::request::Parts,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tera::Context;
use tracing::debug;

use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostInput};
use crate::presentation::AppState;
use crate::presentation::app_error::{AppError, AppResult};
use crate::presentation::forms::{FormErrors, PostFormDto, PostFormView};
use crate::presentation::middleware::session::{AuthenticatedUser, CurrentUser};
use crate::presentation::templates;
use crate::presentation::urls;
use crate::presentation::views::{AuthorView, GroupView, PageView, PostView, page_context};

const UNREADABLE_FORM: &str = "The submitted form could not be read.";

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PageQuery {
    pub(crate) page: Option<String>,
}

/// `{id}` path segment of post routes. Anything but a positive integer is a 404,
/// checked before the session so that bad ids never bounce through the login page.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PostId(pub(crate) i64);

impl<S> FromRequestParts<S> for PostId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::NotFound)?;
        raw.parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .map(PostId)
            .ok_or(AppError::NotFound)
    }
}

pub(crate) async fn index(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<String>> {
    let page = state.blog_service.index_page(query.page.as_deref()).await?;

    let mut context = page_context(current.user());
    context.insert("page", &PageView::from(page));
    render("posts/index.html", &context)
}

pub(crate) async fn group_list(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<String>> {
    let group_page = state
        .blog_service
        .group_page(&slug, query.page.as_deref())
        .await?;

    let mut context = page_context(current.user());
    context.insert("group", &GroupView::from(group_page.group));
    context.insert("page", &PageView::from(group_page.page));
    render("posts/group_list.html", &context)
}

pub(crate) async fn profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<String>> {
    let profile = state
        .blog_service
        .profile_page(&username, query.page.as_deref())
        .await?;

    let mut context = page_context(current.user());
    context.insert("author", &AuthorView::from(profile.author));
    context.insert("posts_count", &profile.posts_count);
    context.insert("page", &PageView::from(profile.page));
    render("posts/profile.html", &context)
}

pub(crate) async fn post_detail(
    State(state): State<AppState>,
    PostId(post_id): PostId,
    current: CurrentUser,
) -> AppResult<Html<String>> {
    let detail = state.blog_service.post_detail(post_id).await?;
    let can_edit = current
        .user()
        .is_some_and(|user| detail.post.is_authored_by(user.user_id));

    let mut context = page_context(current.user());
    context.insert("post", &PostView::from(detail.post));
    context.insert("posts_count", &detail.author_posts_count);
    context.insert("can_edit", &can_edit);
    render("posts/post_detail.html", &context)
}

pub(crate) async fn post_create_form(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Html<String>> {
    render_post_form(&state, &user, PostFormView::default(), None).await
}

pub(crate) async fn post_create(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    form: Result<Form<PostFormDto>, FormRejection>,
) -> AppResult<Response> {
    let (dto, input) = read_post_form(form);
    let input = match input {
        Ok(input) => input,
        Err(errors) => return form_again(&state, &user, &dto, errors, None).await,
    };

    match state.blog_service.create_post(user.user_id, input).await {
        Ok(_) => Ok(Redirect::to(&urls::profile(&user.username)).into_response()),
        Err(err) => match FormErrors::from_domain(&err) {
            Some(errors) => form_again(&state, &user, &dto, errors, None).await,
            None => Err(err.into()),
        },
    }
}

pub(crate) async fn post_edit_form(
    State(state): State<AppState>,
    PostId(post_id): PostId,
    user: AuthenticatedUser,
) -> AppResult<Response> {
    let post = match editable(&state, &user, post_id).await? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect),
    };

    let form = PostFormView::from_post(&post);
    Ok(render_post_form(&state, &user, form, Some(post_id))
        .await?
        .into_response())
}

pub(crate) async fn post_edit(
    State(state): State<AppState>,
    PostId(post_id): PostId,
    user: AuthenticatedUser,
    form: Result<Form<PostFormDto>, FormRejection>,
) -> AppResult<Response> {
    if let Err(redirect) = editable(&state, &user, post_id).await? {
        return Ok(redirect);
    }

    let (dto, input) = read_post_form(form);
    let input = match input {
        Ok(input) => input,
        Err(errors) => return form_again(&state, &user, &dto, errors, Some(post_id)).await,
    };

    match state
        .blog_service
        .update_post(user.user_id, post_id, input)
        .await
    {
        Ok(post) => Ok(Redirect::to(&urls::post_detail(post.id)).into_response()),
        Err(DomainError::Forbidden) => Ok(Redirect::to(&urls::post_detail(post_id)).into_response()),
        Err(err) => match FormErrors::from_domain(&err) {
            Some(errors) => form_again(&state, &user, &dto, errors, Some(post_id)).await,
            None => Err(err.into()),
        },
    }
}

/// A body axum cannot decode (repeated fields, wrong content type) is shown as a form error.
fn read_post_form(
    form: Result<Form<PostFormDto>, FormRejection>,
) -> (PostFormDto, Result<PostInput, FormErrors>) {
    match form {
        Ok(Form(dto)) => {
            let input = dto.to_input();
            (dto, input)
        }
        Err(rejection) => {
            debug!(error = %rejection, "unreadable post form");
            let mut errors = FormErrors::default();
            errors.add("non_field", UNREADABLE_FORM);
            (PostFormDto::default(), Err(errors))
        }
    }
}

/// Someone else's post bounces back to its detail page instead of failing.
async fn editable(
    state: &AppState,
    user: &AuthenticatedUser,
    post_id: i64,
) -> AppResult<Result<Post, Response>> {
    match state.blog_service.editable_post(user.user_id, post_id).await {
        Ok(post) => Ok(Ok(post)),
        Err(DomainError::Forbidden) => {
            Ok(Err(Redirect::to(&urls::post_detail(post_id)).into_response()))
        }
        Err(err) => Err(err.into()),
    }
}

async fn form_again(
    state: &AppState,
    user: &AuthenticatedUser,
    dto: &PostFormDto,
    errors: FormErrors,
    post_id: Option<i64>,
) -> AppResult<Response> {
    let form = PostFormView::from_dto(dto, errors);
    Ok(render_post_form(state, user, form, post_id)
        .await?
        .into_response())
}

async fn render_post_form(
    state: &AppState,
    user: &AuthenticatedUser,
    form: PostFormView,
    post_id: Option<i64>,
) -> AppResult<Html<String>> {
    let groups: Vec<GroupView> = state
        .blog_service
        .list_groups()
        .await?
        .into_iter()
        .map(GroupView::from)
        .collect();

    let mut context = page_context(Some(user));
    context.insert("form", &form);
    context.insert("groups", &groups);
    context.insert("is_edit", &post_id.is_some());
    context.insert("post_id", &post_id);
    render("posts/create_post.html", &context)
}

pub(super) fn render(name: &str, context: &Context) -> AppResult<Html<String>> {
    Ok(templates::render(name, context)?)
}
