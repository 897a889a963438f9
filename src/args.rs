use clap::Parser;
use std::path::PathBuf;

/// Command-line argument parser for taskexec
#[derive(Parser, Debug)]
#[command(name = "taskexec")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the config file. Defaults to $XDG_CONFIG_HOME/taskexec/config.toml.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the configured ceiling on concurrently live tasks for this run.
    #[arg(long)]
    pub max_tasks: Option<usize>,
}

impl Args {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
