//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use stevedore::util::shell::ColorChoice;

/// Stevedore - fetch, build, stage and smoke-test third-party libraries
#[derive(Parser)]
#[command(name = "stevedore")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags accepted by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output (streams build tool output)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print nothing but errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    /// Project configuration file (defaults to ./stevedore.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base directory for the src, build and pkg roots
    #[arg(long, global = true, value_name = "DIR", env = "STEVEDORE_ROOT")]
    pub root: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch, compile, stage and verify units and their dependencies
    Get(GetArgs),

    /// List the registered units
    List(ListArgs),

    /// Display the dependency tree of a unit
    Tree(TreeArgs),

    /// Show the Info Record
    Info(InfoArgs),

    /// Print compiler and linker flags from the Info Record
    Flags(FlagsArgs),

    /// Copy staged shared libraries next to a program
    Bundle(BundleArgs),

    /// Remove build folders (and with --all, sources and staged packages)
    Clean(CleanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct GetArgs {
    /// Units to get (defaults to every top-level unit)
    pub units: Vec<String>,

    /// Use the sources already in the src root
    #[arg(long)]
    pub no_fetch: bool,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Permit commands that need sudo
    #[arg(long)]
    pub allow_elevated: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Only list units nothing else depends on
    #[arg(long)]
    pub top_level: bool,
}

#[derive(Args)]
pub struct TreeArgs {
    /// Unit to show the tree for
    pub unit: String,

    /// Maximum depth to display
    #[arg(short, long)]
    pub depth: Option<usize>,

    /// Expand units already shown
    #[arg(long)]
    pub duplicates: bool,
}

#[derive(Args)]
pub struct InfoArgs {
    /// Only show this unit
    pub unit: Option<String>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct FlagsArgs {
    /// Units to show flags for (defaults to every unit in the record)
    pub units: Vec<String>,

    /// Show compile flags only
    #[arg(long, conflicts_with = "libs")]
    pub cflags: bool,

    /// Show link flags only
    #[arg(long)]
    pub libs: bool,
}

#[derive(Args)]
pub struct BundleArgs {
    /// Units whose libraries to copy (defaults to every unit in the record)
    pub units: Vec<String>,

    /// Destination directory
    #[arg(long, value_name = "DIR")]
    pub dest: PathBuf,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Also remove the src and stage roots
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
