use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = renewd::cli::Cli::parse();
    cli.run().await
}
