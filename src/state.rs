use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

#[cfg(test)]
impl AppState {
    /// Single-connection in-memory database with migrations and the admin seed.
    pub async fn for_tests() -> Self {
        use sqlx::sqlite::SqlitePoolOptions;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        crate::db::run_migrations(&pool).await.expect("migrations");

        let state = Self::new(pool, Config::default());
        crate::db::seed_defaults(&state.db, &state.config)
            .await
            .expect("seed");
        state
    }
}
