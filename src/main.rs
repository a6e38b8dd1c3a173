use anyhow::Result;
use pwa_push::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
