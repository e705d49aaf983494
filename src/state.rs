use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::auth::{
    jwt::TokenCodec,
    repo::{PgUserStore, UserStore},
    services::AuthService,
};
use crate::config::AppConfig;
use crate::posts::repo::{PgPostStore, PostStore};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub posts: Arc<dyn PostStore>,
    pub tokens: Arc<TokenCodec>,
    pub auth: AuthService,
}

impl AppState {
    /// Loads the signing key and connects to Postgres; either failing aborts startup.
    pub async fn init(config: &AppConfig) -> anyhow::Result<(Self, PgPool)> {
        let tokens = Arc::new(TokenCodec::from_config(&config.jwt).context("load jwt signing key")?);

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let state = Self::from_parts(
            Arc::new(PgUserStore::new(db.clone())),
            Arc::new(PgPostStore::new(db.clone())),
            tokens,
        );
        Ok((state, db))
    }

    pub fn from_parts(users: Arc<dyn UserStore>, posts: Arc<dyn PostStore>, tokens: Arc<TokenCodec>) -> Self {
        let auth = AuthService::new(users.clone(), tokens.clone());
        Self {
            users,
            posts,
            tokens,
            auth,
        }
    }

    #[cfg(test)]
    pub fn fake() -> (Self, Arc<crate::store::memory::MemoryStore>) {
        let store = Arc::new(crate::store::memory::MemoryStore::default());
        let tokens = Arc::new(TokenCodec::from_secret(
            b"test-secret",
            "test",
            time::Duration::minutes(crate::config::DEFAULT_TOKEN_TTL_MINUTES),
        ));
        (Self::from_parts(store.clone(), store.clone(), tokens), store)
    }
}
