use std::sync::Arc;

use tracing::info;

use crate::data::group_repository::GroupRepository;
use crate::data::post_repository::{NewPost, Pagination, PostFilter, PostPatch, PostRepository};
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::group::Group;
use crate::domain::pagination::{Page, Paginator};
use crate::domain::post::{Post, PostInput};
use crate::domain::user::User;

#[derive(Debug, Clone)]
pub(crate) struct GroupPage {
    pub(crate) group: Group,
    pub(crate) page: Page<Post>,
}

#[derive(Debug, Clone)]
pub(crate) struct ProfilePage {
    pub(crate) author: User,
    pub(crate) posts_count: i64,
    pub(crate) page: Page<Post>,
}

#[derive(Debug, Clone)]
pub(crate) struct PostDetail {
    pub(crate) post: Post,
    pub(crate) author_posts_count: i64,
}

pub(crate) struct BlogService {
    posts: Arc<dyn PostRepository>,
    groups: Arc<dyn GroupRepository>,
    users: Arc<dyn UserRepository>,
    posts_per_page: u32,
}

impl BlogService {
    pub(crate) fn new(
        posts: Arc<dyn PostRepository>,
        groups: Arc<dyn GroupRepository>,
        users: Arc<dyn UserRepository>,
        posts_per_page: u32,
    ) -> Self {
        Self {
            posts,
            groups,
            users,
            posts_per_page,
        }
    }

    pub(crate) async fn index_page(&self, raw_page: Option<&str>) -> Result<Page<Post>, DomainError> {
        self.paginate(PostFilter::All, raw_page).await
    }

    pub(crate) async fn group_page(
        &self,
        slug: &str,
        raw_page: Option<&str>,
    ) -> Result<GroupPage, DomainError> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found(format_args!("group slug: {slug}")))?;
        let page = self.paginate(PostFilter::Group(group.id), raw_page).await?;

        Ok(GroupPage { group, page })
    }

    pub(crate) async fn profile_page(
        &self,
        username: &str,
        raw_page: Option<&str>,
    ) -> Result<ProfilePage, DomainError> {
        let author = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found(format_args!("user: {username}")))?;
        let page = self.paginate(PostFilter::Author(author.id), raw_page).await?;

        Ok(ProfilePage {
            author,
            posts_count: page.total,
            page,
        })
    }

    pub(crate) async fn post_detail(&self, id: i64) -> Result<PostDetail, DomainError> {
        let post = self.get_post(id).await?;
        let author_posts_count = self
            .posts
            .count_posts(PostFilter::Author(post.author.id))
            .await?;

        Ok(PostDetail {
            post,
            author_posts_count,
        })
    }

    pub(crate) async fn get_post(&self, id: i64) -> Result<Post, DomainError> {
        self.posts
            .get_post(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format_args!("post id: {id}")))
    }

    pub(crate) async fn list_groups(&self) -> Result<Vec<Group>, DomainError> {
        self.groups.list_groups().await
    }

    pub(crate) async fn create_post(
        &self,
        author_id: i64,
        input: PostInput,
    ) -> Result<Post, DomainError> {
        let input = input.validate()?;
        self.ensure_group_exists(input.group_id).await?;

        let new_post = NewPost {
            text: input.text,
            author_id,
            group_id: input.group_id,
        };
        let post = self.posts.create_post(new_post).await?;
        info!(post_id = post.id, author_id, "post created");
        Ok(post)
    }

    /// The post as its author may edit it; `Forbidden` for anybody else.
    pub(crate) async fn editable_post(
        &self,
        actor_user_id: i64,
        post_id: i64,
    ) -> Result<Post, DomainError> {
        let post = self.get_post(post_id).await?;
        if !post.is_authored_by(actor_user_id) {
            return Err(DomainError::Forbidden);
        }
        Ok(post)
    }

    pub(crate) async fn update_post(
        &self,
        actor_user_id: i64,
        post_id: i64,
        input: PostInput,
    ) -> Result<Post, DomainError> {
        self.editable_post(actor_user_id, post_id).await?;
        let input = input.validate()?;
        self.ensure_group_exists(input.group_id).await?;

        let patch = PostPatch {
            text: input.text,
            group_id: input.group_id,
        };
        let post = self
            .posts
            .update_post_owned(post_id, actor_user_id, patch)
            .await?
            .ok_or_else(|| DomainError::not_found(format_args!("post id: {post_id}")))?;
        info!(post_id, author_id = actor_user_id, "post updated");
        Ok(post)
    }

    async fn ensure_group_exists(&self, group_id: Option<i64>) -> Result<(), DomainError> {
        let Some(group_id) = group_id else {
            return Ok(());
        };
        if self.groups.get_group(group_id).await?.is_none() {
            return Err(DomainError::Validation {
                field: "group",
                message: "Select a valid choice.",
            });
        }
        Ok(())
    }

    async fn paginate(
        &self,
        filter: PostFilter,
        raw_page: Option<&str>,
    ) -> Result<Page<Post>, DomainError> {
        let total = self.posts.count_posts(filter).await?;
        let paginator = Paginator::new(total, self.posts_per_page);
        let number = paginator.page_number(raw_page);

        let pagination = Pagination {
            page: number,
            page_size: paginator.per_page(),
        };
        let posts = self.posts.list_posts(filter, pagination).await?;

        Ok(Page::new(posts, number, &paginator))
    }
}
