mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "emstitch", about = "Electron-microscopy mosaic registration tool")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register one section onto another and write a .stos transform
    Register(commands::register::RegisterArgs),
    /// Refine the tile positions of a mosaic by pairwise alignment
    Translate(commands::translate::TranslateArgs),
    /// Render a mosaic into a composite image
    Assemble(commands::assemble::AssembleArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Register(args) => commands::register::run(args),
        Commands::Translate(args) => commands::translate::run(args),
        Commands::Assemble(args) => commands::assemble::run(args),
    }
}
