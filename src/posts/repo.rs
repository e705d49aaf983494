use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::posts::repo_types::{PageRequest, Paginator, Post, PostUserRow, PostWithUser};
use crate::store::StoreError;

/// Fields written on create; on update a `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[async_trait]
pub trait PostStore: Send + Sync {
    /// Newest first.
    async fn list(&self, page: PageRequest) -> Result<(Vec<PostWithUser>, Paginator), StoreError>;
    async fn find(&self, id: Uuid) -> Result<Option<PostWithUser>, StoreError>;
    async fn create(&self, owner: Uuid, title: String, description: String) -> Result<Post, StoreError>;
    async fn update(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<Option<Post>, StoreError>;
}

const POST_WITH_USER: &str = r#"
    SELECT p.id, p.title, p.description, p.user_id, p.created_at, p.updated_at,
           u.email AS user_email, u.password_hash AS user_password_hash, u.name AS user_name,
           u.created_at AS user_created_at, u.updated_at AS user_updated_at
    FROM posts p
    JOIN users u ON u.id = p.user_id
"#;

#[derive(Clone)]
pub struct PgPostStore {
    db: PgPool,
}

impl PgPostStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn list(&self, page: PageRequest) -> Result<(Vec<PostWithUser>, Paginator), StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.db)
            .await?;
        let rows = sqlx::query_as::<_, PostUserRow>(&format!(
            "{POST_WITH_USER} ORDER BY p.created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(page.per_page)
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;
        let posts: Vec<PostWithUser> = rows.into_iter().map(Into::into).collect();
        let meta = Paginator::new(page, total, posts.len() as i64);
        Ok((posts, meta))
    }

    async fn find(&self, id: Uuid) -> Result<Option<PostWithUser>, StoreError> {
        let row = sqlx::query_as::<_, PostUserRow>(&format!("{POST_WITH_USER} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn create(&self, owner: Uuid, title: String, description: String) -> Result<Post, StoreError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, title, description, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, user_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(description)
        .bind(owner)
        .fetch_one(&self.db)
        .await
        .map_err(StoreError::from_write)?;
        Ok(post)
    }

    async fn update(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>, StoreError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                updated_at = now()
            WHERE id = $1
            RETURNING id, title, description, user_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.title)
        .bind(changes.description)
        .fetch_optional(&self.db)
        .await
        .map_err(StoreError::from_write)?;
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            DELETE FROM posts
            WHERE id = $1
            RETURNING id, title, description, user_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(post)
    }
}
