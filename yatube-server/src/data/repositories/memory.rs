//! In-process store behind the repository traits, used by service and HTTP tests.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::data::group_repository::{GroupRepository, NewGroup};
use crate::data::post_repository::{NewPost, Pagination, PostFilter, PostPatch, PostRepository};
use crate::data::user_repository::{NewUser, UserCredentials, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::group::Group;
use crate::domain::post::{AuthorRef, GroupRef, Post};
use crate::domain::user::User;

#[derive(Debug, Clone)]
struct PostRecord {
    id: i64,
    text: String,
    pub_date: DateTime<Utc>,
    author_id: i64,
    group_id: Option<i64>,
}

#[derive(Debug, Default)]
struct Store {
    users: Vec<UserCredentials>,
    groups: Vec<Group>,
    posts: Vec<PostRecord>,
    next_id: i64,
    clock: Option<DateTime<Utc>>,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    // Strictly increasing timestamps keep "newest first" deterministic.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = match self.clock {
            Some(last) => last + Duration::seconds(1),
            None => Utc::now(),
        };
        self.clock = Some(now);
        now
    }

    fn user(&self, id: i64) -> Option<&User> {
        self.users
            .iter()
            .map(|creds| &creds.user)
            .find(|user| user.id == id)
    }

    fn hydrate(&self, record: &PostRecord) -> Result<Post, DomainError> {
        let author = self
            .user(record.author_id)
            .ok_or_else(|| DomainError::not_found("author"))?;
        let group = record
            .group_id
            .and_then(|id| self.groups.iter().find(|group| group.id == id))
            .map(|group| GroupRef {
                id: group.id,
                title: group.title.clone(),
                slug: group.slug.clone(),
            });

        Post::new(
            record.id,
            record.text.clone(),
            record.pub_date,
            AuthorRef {
                id: author.id,
                username: author.username.clone(),
            },
            group,
        )
    }

    fn check_group(&self, group_id: Option<i64>) -> Result<(), DomainError> {
        match group_id {
            Some(id) if !self.groups.iter().any(|group| group.id == id) => {
                Err(DomainError::Validation {
                    field: "group",
                    message: "Select a valid choice.",
                })
            }
            _ => Ok(()),
        }
    }

    fn filtered(&self, filter: PostFilter) -> Vec<&PostRecord> {
        let mut posts: Vec<&PostRecord> = self
            .posts
            .iter()
            .filter(|post| match filter {
                PostFilter::All => true,
                PostFilter::Group(id) => post.group_id == Some(id),
                PostFilter::Author(id) => post.author_id == id,
            })
            .collect();
        posts.sort_by(|a, b| (b.pub_date, b.id).cmp(&(a.pub_date, a.id)));
        posts
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryRepository {
    store: Arc<Mutex<Store>>,
}

impl MemoryRepository {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().expect("memory store mutex poisoned")
    }
}

#[async_trait]
impl PostRepository for MemoryRepository {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let mut store = self.lock();
        if store.user(input.author_id).is_none() {
            return Err(DomainError::not_found("author"));
        }
        store.check_group(input.group_id)?;

        let record = PostRecord {
            id: store.next_id(),
            text: input.text,
            pub_date: store.tick(),
            author_id: input.author_id,
            group_id: input.group_id,
        };
        let post = store.hydrate(&record)?;
        store.posts.push(record);
        Ok(post)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let store = self.lock();
        store
            .posts
            .iter()
            .find(|post| post.id == id)
            .map(|record| store.hydrate(record))
            .transpose()
    }

    async fn update_post_owned(
        &self,
        post_id: i64,
        owner_id: i64,
        patch: PostPatch,
    ) -> Result<Option<Post>, DomainError> {
        let mut store = self.lock();
        store.check_group(patch.group_id)?;

        let Some(record) = store
            .posts
            .iter_mut()
            .find(|post| post.id == post_id && post.author_id == owner_id)
        else {
            return Ok(None);
        };
        record.text = patch.text;
        record.group_id = patch.group_id;

        let record = record.clone();
        store.hydrate(&record).map(Some)
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        pagination: Pagination,
    ) -> Result<Vec<Post>, DomainError> {
        let store = self.lock();
        let offset = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(pagination.limit()).unwrap_or(usize::MAX);

        store
            .filtered(filter)
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|record| store.hydrate(record))
            .collect()
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<i64, DomainError> {
        let count = self.lock().filtered(filter).len();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl GroupRepository for MemoryRepository {
    async fn create_group(&self, input: NewGroup) -> Result<Group, DomainError> {
        let mut store = self.lock();
        if store.groups.iter().any(|group| group.slug == input.slug) {
            return Err(DomainError::AlreadyExists("group slug".to_string()));
        }
        let group = Group::new(store.next_id(), input.title, input.slug, input.description)?;
        store.groups.push(group.clone());
        Ok(group)
    }

    async fn get_group(&self, id: i64) -> Result<Option<Group>, DomainError> {
        Ok(self.lock().groups.iter().find(|group| group.id == id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, DomainError> {
        Ok(self
            .lock()
            .groups
            .iter()
            .find(|group| group.slug == slug)
            .cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>, DomainError> {
        let mut groups = self.lock().groups.clone();
        groups.sort_by(|a, b| (&a.title, a.id).cmp(&(&b.title, b.id)));
        Ok(groups)
    }

    async fn delete_by_slug(&self, slug: &str) -> Result<bool, DomainError> {
        let mut store = self.lock();
        let Some(index) = store.groups.iter().position(|group| group.slug == slug) else {
            return Ok(false);
        };
        let group = store.groups.remove(index);
        for post in store
            .posts
            .iter_mut()
            .filter(|post| post.group_id == Some(group.id))
        {
            post.group_id = None;
        }
        Ok(true)
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError> {
        let mut store = self.lock();
        if store
            .users
            .iter()
            .any(|creds| creds.user.username == input.username)
        {
            return Err(DomainError::AlreadyExists("username".to_string()));
        }
        if store.users.iter().any(|creds| creds.user.email == input.email) {
            return Err(DomainError::AlreadyExists("email".to_string()));
        }

        let user = User::new(store.next_id(), input.username, input.email, Utc::now())?;
        store.users.push(UserCredentials {
            user: user.clone(),
            password_hash: input.password_hash,
        });
        Ok(user)
    }

    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, DomainError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|creds| creds.user.username == username)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .lock()
            .users
            .iter()
            .map(|creds| &creds.user)
            .find(|user| user.username == username)
            .cloned())
    }
}
