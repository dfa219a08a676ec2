use axum::Router;
use axum::middleware;
use axum::routing::get;

use crate::presentation::AppState;
use crate::presentation::handlers::posts::{
    group_list, index, post_create, post_create_form, post_detail, post_edit, post_edit_form,
    profile,
};
use crate::presentation::middleware::session::login_required;

pub(crate) fn router() -> Router<AppState> {
    let public = Router::new()
        .route("/", get(index))
        .route("/group/{slug}/", get(group_list))
        .route("/profile/{username}/", get(profile))
        .route("/posts/{id}/", get(post_detail))
        // The id is validated before the session; `AuthenticatedUser` does the login redirect.
        .route("/posts/{id}/edit/", get(post_edit_form).post(post_edit));

    let protected = Router::new()
        .route("/create/", get(post_create_form).post(post_create))
        .route_layer(middleware::from_fn(login_required));

    public.merge(protected)
}
