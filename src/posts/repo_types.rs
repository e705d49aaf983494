use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::User;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub user_id: Uuid, // owner
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A post together with its eagerly loaded owner.
#[derive(Debug, Clone, Serialize)]
pub struct PostWithUser {
    #[serde(flatten)]
    pub post: Post,
    pub user: User,
}

/// Flat row produced by the posts/users join.
#[derive(Debug, FromRow)]
pub(crate) struct PostUserRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub user_email: String,
    pub user_password_hash: String,
    pub user_name: String,
    pub user_created_at: OffsetDateTime,
    pub user_updated_at: OffsetDateTime,
}

impl From<PostUserRow> for PostWithUser {
    fn from(r: PostUserRow) -> Self {
        Self {
            post: Post {
                id: r.id,
                title: r.title,
                description: r.description,
                user_id: r.user_id,
                created_at: r.created_at,
                updated_at: r.updated_at,
            },
            user: User {
                id: r.user_id,
                email: r.user_email,
                password_hash: r.user_password_hash,
                name: r.user_name,
                created_at: r.user_created_at,
                updated_at: r.user_updated_at,
            },
        }
    }
}

/// Requested page; values below 1 fall back to the defaults and `per_page`
/// is capped at [`MAX_PER_PAGE`].
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;

impl PageRequest {
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self {
            page: page.filter(|p| *p >= 1).unwrap_or(1),
            per_page: per_page
                .filter(|p| *p >= 1)
                .map(|p| p.min(MAX_PER_PAGE))
                .unwrap_or(DEFAULT_PER_PAGE),
        }
    }

    /// Saturates instead of overflowing; a huge page simply lands past the last row.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Paginator {
    pub page: i64,
    pub per_page: i64,
    pub offset: i64,
    pub total_entries_size: i64,
    pub current_entries_size: i64,
    pub total_pages: i64,
}

impl Paginator {
    pub fn new(req: PageRequest, total: i64, current: i64) -> Self {
        Self {
            page: req.page,
            per_page: req.per_page,
            offset: req.offset(),
            total_entries_size: total,
            current_entries_size: current,
            total_pages: total / req.per_page + i64::from(total % req.per_page != 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_defaults() {
        let req = PageRequest::new(None, None);
        assert_eq!((req.page, req.per_page, req.offset()), (1, 20, 0));
        let req = PageRequest::new(Some(0), Some(-5));
        assert_eq!((req.page, req.per_page), (1, 20));
        let req = PageRequest::new(Some(3), Some(10));
        assert_eq!(req.offset(), 20);
    }

    #[test]
    fn paginator_counts_pages() {
        let p = Paginator::new(PageRequest::new(Some(2), Some(10)), 25, 10);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.offset, 10);
        let empty = Paginator::new(PageRequest::new(None, None), 0, 0);
        assert_eq!(empty.total_pages, 0);
        let exact = Paginator::new(PageRequest::new(None, Some(5)), 10, 5);
        assert_eq!(exact.total_pages, 2);
    }

    #[test]
    fn per_page_is_capped() {
        let req = PageRequest::new(None, Some(i64::MAX));
        assert_eq!(req.per_page, MAX_PER_PAGE);
        assert_eq!(PageRequest::new(None, Some(MAX_PER_PAGE)).per_page, MAX_PER_PAGE);
    }

    #[test]
    fn extreme_page_numbers_do_not_overflow() {
        let req = PageRequest::new(Some(i64::MAX), Some(2));
        assert_eq!(req.offset(), i64::MAX);

        let p = Paginator::new(PageRequest::new(Some(i64::MAX), Some(MAX_PER_PAGE)), i64::MAX, 0);
        assert_eq!(p.offset, i64::MAX);
        assert_eq!(p.total_pages, i64::MAX / MAX_PER_PAGE + 1);
    }
}
