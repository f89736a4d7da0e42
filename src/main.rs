use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    payguard::cli::app::run().await
}
