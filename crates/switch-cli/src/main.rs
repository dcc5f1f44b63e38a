mod bootstrap_helpers;

use anyhow::Result;
use clap::Parser;
use switch_cli::{run_cli, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap_helpers::init_tracing();
    let cli = Cli::parse();
    let output = run_cli(&cli).await?;
    println!("{output}");
    Ok(())
}
