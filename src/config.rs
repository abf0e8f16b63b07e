use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Absolute path of the directory uploads are written into.
    /// The service never creates it; a missing directory is surfaced
    /// to clients as a precondition error.
    pub upload_dir: String,
    /// Postgres connection string. Unset selects the in-memory store.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let upload_dir =
            std::env::var("UPLOAD_DIR").map_err(|_| anyhow::anyhow!("UPLOAD_DIR is not set"))?;
        let database_url = std::env::var("DATABASE_URL").ok();
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = std::env::var("APP_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8080);
        Ok(Self {
            upload_dir,
            database_url,
            host,
            port,
        })
    }
}
