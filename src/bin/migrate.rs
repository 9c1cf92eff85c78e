use anyhow::{Context, Result};
use location_weather::{config, store};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = config::load()?;
    let database_url = config
        .database_url
        .context("no database configured, nothing to migrate")?;

    let pool = store::connect_to_db(database_url.as_str()).await?;
    tracing::info!("DB successfully initialized");
    pool.close().await;

    Ok(())
}
