use std::sync::Arc;

use coffeehaus_db::Database;
use coffeehaus_search::SearchService;

use crate::error::ApiResult;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub jwt_secret: String,
    /// Absent when the Places or Claude keys are not configured.
    pub search: Option<SearchService>,
}

impl AppStateInner {
    /// Runs a database call on the blocking pool.
    pub async fn db<F, T>(&self, f: F) -> ApiResult<T>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        let value = tokio::task::spawn_blocking(move || f(&db)).await??;
        Ok(value)
    }
}
