use anyhow::Result;
use location_weather::{app, config};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = config::load()?;

    app::run(config).await
}
