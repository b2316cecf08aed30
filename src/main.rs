//! Comic poster CLI - main entry point

use clap::Parser;
use tracing_subscriber::EnvFilter;

use comic_poster::{commands, Config};

#[derive(Parser)]
#[command(name = "comic_poster")]
#[command(about = "Fetches a random xkcd comic and posts it to a VK group wall", long_about = None)]
#[command(version)]
struct Cli {}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for local development
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("comic_poster=info".parse()?))
        .init();

    let _cli = Cli::parse();

    let config = Config::from_env()?;
    commands::post::run(&config).await?;

    Ok(())
}
