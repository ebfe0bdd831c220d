use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = keyrelay::cli::Cli::parse();
    cli.run()
}
