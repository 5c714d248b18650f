//! gex - Options gamma exposure analytics CLI

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (access token goes here, not in gex.toml)
    dotenvy::dotenv().ok();

    let app = gex_engine::adapters::cli::init();
    gex_engine::adapters::cli::execute(app).await
}
