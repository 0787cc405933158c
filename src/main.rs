mod admission;
mod bot;
mod cleaner;
mod dedup;
mod markup;
mod modes;
mod pipeline;
mod store;
mod telegram;
mod text;
mod translate;

use anyhow::Result;
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    modes::run_from_env().await
}
