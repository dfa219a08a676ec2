//! Template-facing shapes. Everything a template prints is computed here, so templates need no filters.

use serde::Serialize;
use tera::Context;

use crate::domain::group::Group;
use crate::domain::pagination::Page;
use crate::domain::post::Post;
use crate::domain::user::User;
use crate::presentation::middleware::session::AuthenticatedUser;

const DATE_FORMAT: &str = "%d %b %Y %H:%M";

#[derive(Debug, Serialize)]
pub(crate) struct PostAuthorView {
    pub(crate) id: i64,
    pub(crate) username: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct PostGroupView {
    pub(crate) title: String,
    pub(crate) slug: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct PostView {
    pub(crate) id: i64,
    pub(crate) text: String,
    pub(crate) preview: String,
    pub(crate) pub_date: String,
    pub(crate) author: PostAuthorView,
    pub(crate) group: Option<PostGroupView>,
}

impl From<Post> for PostView {
    fn from(post: Post) -> Self {
        let preview = post.preview();
        Self {
            id: post.id,
            preview,
            pub_date: post.pub_date.format(DATE_FORMAT).to_string(),
            author: PostAuthorView {
                id: post.author.id,
                username: post.author.username,
            },
            group: post.group.map(|group| PostGroupView {
                title: group.title,
                slug: group.slug,
            }),
            text: post.text,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PageView<T> {
    pub(crate) items: Vec<T>,
    pub(crate) number: u32,
    pub(crate) num_pages: u32,
    pub(crate) has_previous: bool,
    pub(crate) has_next: bool,
    pub(crate) previous_page_number: Option<u32>,
    pub(crate) next_page_number: Option<u32>,
}

impl From<Page<Post>> for PageView<PostView> {
    fn from(page: Page<Post>) -> Self {
        let has_previous = page.has_previous();
        let has_next = page.has_next();
        let previous_page_number = page.previous_page_number();
        let next_page_number = page.next_page_number();
        let page = page.map(PostView::from);

        Self {
            items: page.items,
            number: page.number,
            num_pages: page.num_pages,
            has_previous,
            has_next,
            previous_page_number,
            next_page_number,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GroupView {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) slug: String,
    pub(crate) description: String,
}

impl From<Group> for GroupView {
    fn from(group: Group) -> Self {
        Self {
            id: group.id,
            title: group.title,
            slug: group.slug,
            description: group.description,
        }
    }
}

/// Public part of a profile; the e-mail address never reaches a template.
#[derive(Debug, Serialize)]
pub(crate) struct AuthorView {
    pub(crate) username: String,
    pub(crate) joined: String,
}

impl From<User> for AuthorView {
    fn from(user: User) -> Self {
        Self {
            joined: user.created_at.format("%d %b %Y").to_string(),
            username: user.username,
        }
    }
}

/// Base context shared by every page: the header needs to know who is logged in.
pub(crate) fn page_context(user: Option<&AuthenticatedUser>) -> Context {
    let mut context = Context::new();
    context.insert("user", &user);
    context
}
