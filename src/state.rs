use std::sync::Arc;

use crate::config::AppConfig;
use crate::db;
use crate::users::repo::{PgUserStore, UserStore};
use crate::users::services::AccountService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub accounts: AccountService,
}

impl AppState {
    /// Connects the pool, bootstraps the schema and wires the Postgres store.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let pool = db::connect(&config.database).await?;
        db::bootstrap_schema(&pool).await?;

        let store = Arc::new(PgUserStore::new(pool)) as Arc<dyn UserStore>;
        Ok(Self::from_parts(Arc::new(config), store))
    }

    pub fn from_parts(config: Arc<AppConfig>, store: Arc<dyn UserStore>) -> Self {
        Self {
            config,
            accounts: AccountService::new(store),
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::users::memory::InMemoryUserStore;

        let config = AppConfig::from_lookup(|_| None).expect("default config");
        let store = Arc::new(InMemoryUserStore::new()) as Arc<dyn UserStore>;
        Self::from_parts(Arc::new(config), store)
    }
}
