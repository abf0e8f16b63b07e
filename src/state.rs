use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::warn;

use crate::config::AppConfig;
use crate::storage::{FileStorage, FileSystemStorage};
use crate::users::repo::{MemoryUserStore, PgUserStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub files: Arc<dyn FileStorage>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store: Arc<dyn UserStore> = match &config.database_url {
            Some(url) => {
                let db = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;
                if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                    warn!(error = %e, "migration failed; continuing");
                }
                Arc::new(PgUserStore::new(db))
            }
            None => {
                warn!("DATABASE_URL not set; using in-memory user store");
                Arc::new(MemoryUserStore::new())
            }
        };

        let files = Arc::new(FileSystemStorage::new(&config.upload_dir)) as Arc<dyn FileStorage>;
        if !files.exists().await {
            // Not fatal: the upload handler reports it per request.
            warn!(dir = %config.upload_dir, "upload directory not provisioned");
        }

        Ok(Self {
            store,
            files,
            config,
        })
    }

    pub fn from_parts(
        store: Arc<dyn UserStore>,
        files: Arc<dyn FileStorage>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            files,
            config,
        }
    }

    /// In-memory store plus file storage rooted at the system temp dir,
    /// for tests that need wired-up state without Postgres.
    pub fn fake() -> Self {
        let upload_dir = std::env::temp_dir();
        let config = Arc::new(AppConfig {
            upload_dir: upload_dir.to_string_lossy().into_owned(),
            database_url: None,
            host: "127.0.0.1".into(),
            port: 0,
        });
        Self {
            store: Arc::new(MemoryUserStore::new()),
            files: Arc::new(FileSystemStorage::new(upload_dir)),
            config,
        }
    }
}
