use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::data::post_repository::{NewPost, Pagination, PostFilter, PostPatch, PostRepository};
use crate::domain::error::DomainError;
use crate::domain::post::{AuthorRef, GroupRef, Post};

#[derive(Debug, Clone)]
pub(crate) struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    text: String,
    pub_date: DateTime<Utc>,
    author_id: i64,
    author_username: String,
    group_id: Option<i64>,
    group_title: Option<String>,
    group_slug: Option<String>,
}

// Shared projection; `p` is either `posts` or a CTE with the same columns.
const POST_COLUMNS: &str = r#"
    SELECT
        p.id,
        p.text,
        p.pub_date,
        p.author_id,
        u.username AS author_username,
        g.id AS group_id,
        g.title AS group_title,
        g.slug AS group_slug
"#;

const POST_JOINS: &str = r#"
    JOIN users u ON u.id = p.author_id
    LEFT JOIN post_groups g ON g.id = p.group_id
"#;

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let sql = format!(
            r#"
            WITH p AS (
                INSERT INTO posts (text, author_id, group_id)
                VALUES ($1, $2, $3)
                RETURNING id, text, pub_date, author_id, group_id
            )
            {POST_COLUMNS}
            FROM p
            {POST_JOINS}
            "#
        );

        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(&input.text)
            .bind(input.author_id)
            .bind(input.group_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        map_row_to_post(row)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let sql = format!("{POST_COLUMNS} FROM posts p {POST_JOINS} WHERE p.id = $1");

        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        row.map(map_row_to_post).transpose()
    }

    async fn update_post_owned(
        &self,
        post_id: i64,
        owner_id: i64,
        patch: PostPatch,
    ) -> Result<Option<Post>, DomainError> {
        let sql = format!(
            r#"
            WITH p AS (
                UPDATE posts
                SET text = $3,
                    group_id = $4
                WHERE id = $1 AND author_id = $2
                RETURNING id, text, pub_date, author_id, group_id
            )
            {POST_COLUMNS}
            FROM p
            {POST_JOINS}
            "#
        );

        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(post_id)
            .bind(owner_id)
            .bind(&patch.text)
            .bind(patch.group_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        row.map(map_row_to_post).transpose()
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        pagination: Pagination,
    ) -> Result<Vec<Post>, DomainError> {
        let mut query = QueryBuilder::<Postgres>::new(POST_COLUMNS);
        query.push(" FROM posts p ").push(POST_JOINS);
        push_filter(&mut query, filter);
        query
            .push(" ORDER BY p.pub_date DESC, p.id DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows = query
            .build_query_as::<PostRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        rows.into_iter().map(map_row_to_post).collect()
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<i64, DomainError> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts p");
        push_filter(&mut query, filter);

        query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(map_post_db_error)
    }
}

fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: PostFilter) {
    match filter {
        PostFilter::All => {}
        PostFilter::Group(group_id) => {
            query.push(" WHERE p.group_id = ").push_bind(group_id);
        }
        PostFilter::Author(author_id) => {
            query.push(" WHERE p.author_id = ").push_bind(author_id);
        }
    }
}

fn map_row_to_post(row: PostRow) -> Result<Post, DomainError> {
    let author = AuthorRef {
        id: row.author_id,
        username: row.author_username,
    };
    let group = match (row.group_id, row.group_title, row.group_slug) {
        (Some(id), Some(title), Some(slug)) => Some(GroupRef { id, title, slug }),
        _ => None,
    };

    Post::new(row.id, row.text, row.pub_date, author, group)
        .map_err(|err| DomainError::Unexpected(err.to_string()))
}

fn map_post_db_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23503") {
            return match db_err.constraint() {
                Some("posts_group_id_fkey") => DomainError::Validation {
                    field: "group",
                    message: "Select a valid choice.",
                },
                _ => DomainError::not_found("author"),
            };
        }
    }
    DomainError::Unexpected(err.to_string())
}

#[cfg(test)]
mod tests {
    use crate::data::group_repository::{GroupRepository, NewGroup};
    use crate::data::post_repository::{NewPost, PostFilter, PostRepository};
    use crate::data::repositories::postgres::group_repository::PostgresGroupRepository;
    use crate::data::repositories::postgres::user_repository::PostgresUserRepository;
    use crate::data::user_repository::{NewUser, UserRepository};
    use crate::infrastructure::database::{create_pool, run_migrations};

    use super::PostgresPostRepository;

    #[tokio::test]
    #[ignore = "requires a PostgreSQL database in DATABASE_URL"]
    async fn deleting_group_clears_post_group() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = create_pool(&url, 2).await.expect("pool must connect");
        run_migrations(&pool).await.expect("migrations must apply");

        let suffix = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let users = PostgresUserRepository::new(pool.clone());
        let groups = PostgresGroupRepository::new(pool.clone());
        let posts = PostgresPostRepository::new(pool);

        let user = users
            .create_user(NewUser {
                username: format!("pg_user_{suffix}"),
                email: format!("pg_{suffix}@example.com"),
                password_hash: "hash".to_string(),
            })
            .await
            .expect("user must be created");
        let group = groups
            .create_group(NewGroup {
                title: "Temporary".to_string(),
                slug: format!("tmp-{suffix}"),
                description: String::new(),
            })
            .await
            .expect("group must be created");
        let post = posts
            .create_post(NewPost {
                text: "post in a group".to_string(),
                author_id: user.id,
                group_id: Some(group.id),
            })
            .await
            .expect("post must be created");
        assert_eq!(post.group_id(), Some(group.id));
        assert_eq!(
            posts
                .count_posts(PostFilter::Group(group.id))
                .await
                .expect("count must succeed"),
            1
        );

        assert!(
            groups
                .delete_by_slug(&group.slug)
                .await
                .expect("delete must succeed")
        );

        let reloaded = posts
            .get_post(post.id)
            .await
            .expect("get must succeed")
            .expect("post must survive group deletion");
        assert_eq!(reloaded.group, None);
        assert_eq!(reloaded.pub_date, post.pub_date);
    }
}
