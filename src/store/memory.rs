//! In-memory stores used by unit and router tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo::UserStore;
use crate::auth::repo_types::{NewUser, User};
use crate::posts::repo::{PostChanges, PostStore};
use crate::posts::repo_types::{PageRequest, Paginator, Post, PostWithUser};
use crate::store::StoreError;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    posts: Vec<Post>,
}

/// Backs both stores with one table set so posts can load their owners.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_writes: AtomicBool,
    skip_email_check: AtomicBool,
}

impl MemoryStore {
    /// Makes every subsequent insert fail with a database error.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Makes `find_by_email` miss, as a concurrent registration would.
    pub fn hide_emails(&self) {
        self.skip_email_check.store(true, Ordering::SeqCst);
    }

    pub fn remove_user(&self, id: Uuid) {
        let mut tables = self.tables.lock().unwrap();
        tables.users.remove(&id);
        tables.posts.retain(|p| p.user_id != id);
    }

    pub fn user_count(&self) -> usize {
        self.tables.lock().unwrap().users.len()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        if self.skip_email_check.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables.lock().unwrap().users.get(&id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict);
        }
        let now = OffsetDateTime::now_utc();
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn list(&self, page: PageRequest) -> Result<(Vec<PostWithUser>, Paginator), StoreError> {
        let tables = self.tables.lock().unwrap();
        // newest first: posts are appended in creation order
        let posts: Vec<PostWithUser> = tables
            .posts
            .iter()
            .rev()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.per_page).unwrap_or(0))
            .filter_map(|p| {
                tables.users.get(&p.user_id).map(|u| PostWithUser {
                    post: p.clone(),
                    user: u.clone(),
                })
            })
            .collect();
        let meta = Paginator::new(page, tables.posts.len() as i64, posts.len() as i64);
        Ok((posts, meta))
    }

    async fn find(&self, id: Uuid) -> Result<Option<PostWithUser>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.posts.iter().find(|p| p.id == id).and_then(|p| {
            tables.users.get(&p.user_id).map(|u| PostWithUser {
                post: p.clone(),
                user: u.clone(),
            })
        }))
    }

    async fn create(&self, owner: Uuid, title: String, description: String) -> Result<Post, StoreError> {
        self.check_writable()?;
        let now = OffsetDateTime::now_utc();
        let post = Post {
            id: Uuid::new_v4(),
            title,
            description,
            user_id: owner,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().unwrap().posts.push(post.clone());
        Ok(post)
    }

    async fn update(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>, StoreError> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.posts.iter_mut().find(|p| p.id == id).map(|p| {
            if let Some(title) = changes.title {
                p.title = title;
            }
            if let Some(description) = changes.description {
                p.description = description;
            }
            p.updated_at = OffsetDateTime::now_utc();
            p.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        let idx = tables.posts.iter().position(|p| p.id == id);
        Ok(idx.map(|i| tables.posts.remove(i)))
    }
}
