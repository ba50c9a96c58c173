//! Command dispatch.

pub mod extract;
pub mod serve;

use anyhow::Result;

use crate::cli::{Cli, Command};

pub async fn handle(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Extract { url, shuffle } => extract::handle(&url, shuffle).await,
        Command::Serve { addr } => serve::handle(addr).await,
    }
}
