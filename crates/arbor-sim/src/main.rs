use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    sample::{self, SampleArgs},
    summarize::{self, SummarizeArgs},
};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "arbor", about = "Metropolis-Hastings sampler over phylogenetic trees")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Group the trees of a tree file by topology.
    Summarize(SummarizeArgs),
    /// Run the sampler from a starting tree.
    Sample(SampleArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Summarize(args) => summarize::run(&args),
        Command::Sample(args) => sample::run(&args),
    }
}
