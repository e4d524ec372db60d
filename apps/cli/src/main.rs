//! Word search CLI: serve the game API or play in the terminal.
//!
//! Topics are researched against Wikipedia, turned into target and
//! distractor terms by an OpenRouter-hosted model, and laid out as a grid.

mod commands;
mod play;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
