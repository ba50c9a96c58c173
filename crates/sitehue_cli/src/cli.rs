//! CLI argument definitions using clap derive macros.

use std::net::SocketAddr;

use clap::{Parser, Subcommand, ValueEnum};

/// Extract brand colors from websites
#[derive(Parser)]
#[command(name = "sitehue", about, version, propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging for the extraction pipeline
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format: text (human-readable) or json (machine-readable)
    #[arg(short, long, global = true, default_value = "text")]
    pub output: OutputFormat,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// Colored terminal output for humans
    #[default]
    Text,
    /// Structured JSON for machine consumption
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch a website and print its title, favicon and color palette
    Extract {
        /// Website URL; https:// is assumed when no scheme is given
        url: String,
        /// Shuffle the palette slots once before printing
        #[arg(long)]
        shuffle: bool,
    },
    /// Serve the color extraction API over HTTP
    Serve {
        /// Address to listen on
        #[arg(long, env = "SITEHUE_ADDR", default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
    },
}
