use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    absa_cli::main_entry().await
}
