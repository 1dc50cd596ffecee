use anyhow::Result;
use clap::Parser;
use minibank::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run().await
}
