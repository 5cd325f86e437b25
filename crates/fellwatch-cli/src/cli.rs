use clap::{Args, Parser, Subcommand};
use fellwatch_core::models::DedupPolicy;
use std::path::PathBuf;

/// Fellwatch - species observations versus forestry logging
#[derive(Parser, Debug)]
#[command(name = "fellwatch")]
#[command(about = "Match species observations against logging areas", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the analysis and write the detail export
    Run(RunArgs),

    /// Show the effective configuration and where each value comes from
    Config(ConfigArgs),
}

/// Where to find the data and the configuration file
#[derive(Args, Debug, Clone, Default)]
pub struct LocationArgs {
    /// Configuration file (defaults to fellwatch.toml in the base directory)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base directory holding the inputs (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub location: LocationArgs,

    /// Drop observations with a larger accuracy radius (meters)
    #[arg(long, value_name = "METERS")]
    pub accuracy_threshold: Option<f64>,

    /// Near-zone radius around each observation (meters)
    #[arg(long, value_name = "METERS")]
    pub buffer: Option<f64>,

    /// Match deduplication (per-observation or per-pair)
    #[arg(long, value_name = "POLICY")]
    pub dedup: Option<DedupPolicy>,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub location: LocationArgs,
}
