//! Stevedore CLI - third-party library builds for native projects

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbosity flags
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.global.verbose {
            EnvFilter::new("stevedore=debug")
        } else {
            EnvFilter::new("stevedore=warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let global = cli.global;
    match cli.command {
        Commands::Get(args) => commands::get::execute(args, &global),
        Commands::List(args) => commands::list::execute(args, &global),
        Commands::Tree(args) => commands::tree::execute(args, &global),
        Commands::Info(args) => commands::info::execute(args, &global),
        Commands::Flags(args) => commands::flags::execute(args, &global),
        Commands::Bundle(args) => commands::bundle::execute(args, &global),
        Commands::Clean(args) => commands::clean::execute(args, &global),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
