use crate::auth::repo::UserStore;
use crate::config::{AppConfig, JwtConfig};
use crate::db::PgStore;
use crate::memory::MemoryStore;
use crate::todos::repo::TodoStore;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub todos: Arc<dyn TodoStore>,
    pub config: Arc<AppConfig>,
    pg: Option<PgStore>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        match config.database_url.as_deref() {
            Some(url) => {
                let pg = PgStore::connect(url).await?;
                pg.migrate().await?;
                Ok(Self {
                    users: Arc::new(pg.clone()) as Arc<dyn UserStore>,
                    todos: Arc::new(pg.clone()) as Arc<dyn TodoStore>,
                    config,
                    pg: Some(pg),
                })
            }
            None => {
                warn!("DATABASE_URL not set; using in-memory store, data is lost on exit");
                Ok(Self::in_memory(config))
            }
        }
    }

    pub fn in_memory(config: Arc<AppConfig>) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone() as Arc<dyn UserStore>,
            todos: store as Arc<dyn TodoStore>,
            config,
            pg: None,
        }
    }

    pub fn from_parts(
        users: Arc<dyn UserStore>,
        todos: Arc<dyn TodoStore>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            users,
            todos,
            config,
            pg: None,
        }
    }

    /// In-memory state with a fixed signing config, for tests.
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
            },
        });
        Self::in_memory(config)
    }

    pub async fn close(&self) {
        if let Some(pg) = &self.pg {
            pg.close().await;
        }
    }
}
