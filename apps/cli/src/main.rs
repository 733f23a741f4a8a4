//! bookmirror CLI — mirrors an online exercise book into a local HTML tree.
//!
//! Walks book → chapters → sections → questions against the content API and
//! writes one static page per question, skipping anything already on disk.

mod commands;

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
