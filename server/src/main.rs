use anyhow::Context;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use gatherly_server::config::Config;
use gatherly_server::store::{self, seed};
use gatherly_server::{create_routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let store = store::connect(&config.database_url)
        .await
        .context("Failed to open database")?;

    if seed::seed_demo_data(store.as_ref())
        .await
        .context("Failed to seed demo data")?
    {
        tracing::info!(
            organizer = seed::DEMO_ORGANIZER_EMAIL,
            attendee = seed::DEMO_ATTENDEE_EMAIL,
            "Demo accounts created"
        );
    }

    let addr = config.server_addr();
    let app = create_routes(AppState::new(config, store));

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("🚀 Server running at http://{}", addr);

    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
