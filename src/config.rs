use std::net::SocketAddr;
use std::path::PathBuf;

/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the API server binds to (`BIND_ADDR`, default 127.0.0.1:5000).
    pub bind_addr: SocketAddr,
    /// sqlx SQLite URL (`DATABASE_URL`, default `sqlite://data/seoaudit.db?mode=rwc`).
    pub database_url: String,
    /// Directory for file-backed stores: leads, white-label config (`DATA_DIR`, default `data`).
    pub data_dir: PathBuf,
    /// Directory generated reports are written to (`REPORTS_DIR`, default `data/reports`).
    pub reports_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = match std::env::var("BIND_ADDR") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid BIND_ADDR {raw:?}: {e}"))?,
            Err(_) => SocketAddr::from(([127, 0, 0, 1], 5000)),
        };

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://data/seoaudit.db?mode=rwc".to_string());

        let data_dir = std::env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        let reports_dir = std::env::var("REPORTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("reports"));

        Ok(Self {
            bind_addr,
            database_url,
            data_dir,
            reports_dir,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            database_url: "sqlite://data/seoaudit.db?mode=rwc".to_string(),
            data_dir: PathBuf::from("data"),
            reports_dir: PathBuf::from("data/reports"),
        }
    }
}
