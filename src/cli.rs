use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use merge_versions::config::CATALOG_ENV;

#[derive(Parser)]
#[command(
    name = "merge-versions",
    about = "Merge derived version files back into their original photos",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Catalog database to operate on
    #[arg(long, global = true, env = CATALOG_ENV)]
    pub catalog: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Add every image below a folder to the catalog
    Import(ImportArgs),
    /// List version photos that would be merged
    Scan,
    /// Merge version photos into their originals
    Merge(MergeArgs),
}

#[derive(Args)]
pub struct ImportArgs {
    pub folder: PathBuf,
}

#[derive(Args)]
pub struct MergeArgs {
    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}
