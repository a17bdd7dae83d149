use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "tidy-downloads")]
#[command(about = "Sorts a downloads folder and clears out stale unknown files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Move recognised files into category folders and track unknown ones
    Organize,
    /// Delete unknown files that have outlived the retention window
    Sweep,
    /// Organize, then sweep
    Run,
    /// List tracked unknown files and when they become eligible for deletion
    Pending,
    /// Print configuration values
    PrintConfig,
}
