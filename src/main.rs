use anyhow::Result;

/// Main entry point
#[tokio::main]
async fn main() -> Result<()> {
    newsdesk::cli::run().await
}
