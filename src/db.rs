use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;

/// Configure SQLite pragmas for optimal performance.
/// These are set per-connection via the after_connect callback.
async fn configure_sqlite_pragmas(conn: &mut sqlx::SqliteConnection) -> Result<(), sqlx::Error> {
    use sqlx::Executor;

    // WAL mode: allows concurrent reads during writes
    conn.execute("PRAGMA journal_mode = WAL").await?;

    // NORMAL synchronous: faster writes, data still synced at critical moments
    conn.execute("PRAGMA synchronous = NORMAL").await?;

    // 64MB cache (negative value = KB)
    conn.execute("PRAGMA cache_size = -65536").await?;

    // Memory-mapped I/O for faster reads (256MB)
    conn.execute("PRAGMA mmap_size = 268435456").await?;

    // 5 second timeout prevents "database locked" errors under write contention
    conn.execute("PRAGMA busy_timeout = 5000").await?;

    // Use memory for temp tables
    conn.execute("PRAGMA temp_store = MEMORY").await?;

    conn.execute("PRAGMA foreign_keys = ON").await?;

    Ok(())
}

/// Open the pool, apply pragmas per connection and run embedded migrations.
///
/// `database_url` is an sqlx SQLite URL such as `sqlite://data/audits.db?mode=rwc`
/// or `sqlite::memory:`. A parent directory named in the URL is created first.
pub async fn init_db(database_url: &str) -> Result<SqlitePool> {
    if let Some(path) = file_path_of(database_url) {
        if let Some(parent) = Path::new(&path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create data dir: {}", parent.display()))?;
            }
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                configure_sqlite_pragmas(conn).await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await
        .with_context(|| format!("failed to connect to database at {database_url}"))?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    tracing::info!(url = %database_url, "database initialized");

    Ok(pool)
}

/// Extract the filesystem path from an sqlite URL, if it names a file.
fn file_path_of(database_url: &str) -> Option<String> {
    let rest = database_url.strip_prefix("sqlite://")?;
    if rest.starts_with(":memory:") {
        return None;
    }
    let path = rest.split('?').next().unwrap_or(rest);
    (!path.is_empty()).then(|| path.to_string())
}
