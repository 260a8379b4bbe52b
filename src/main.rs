use seoaudit::api::{self, AppState};
use seoaudit::config::AppConfig;
use seoaudit::db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let pool = db::init_db(&config.database_url).await?;
    let state = AppState::init(config.clone(), pool).await?;

    let app = api::router(state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "SEO audit service listening");
    axum::serve(listener, app).await?;

    Ok(())
}
