//! Command implementations

mod config;
mod run;

use crate::cli::{Cli, Commands, LocationArgs};
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use fellwatch_core::config::{CliConfigOverrides, LayeredConfig, CONFIG_FILE_NAME};

/// Execute a CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);

    match cli.command {
        Commands::Run(args) => run::execute(args, &output),
        Commands::Config(args) => config::execute(args, &output),
    }
}

/// Defaults, then the configuration file, then command-line overrides.
///
/// An explicit `--config` must exist; the implicit `fellwatch.toml` in the
/// base directory is optional.
fn load_layered_config(
    location: &LocationArgs,
    overrides: CliConfigOverrides,
) -> Result<LayeredConfig> {
    let base_dir = match &location.base_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to determine the current directory")?,
    };

    let mut layered = LayeredConfig::with_defaults(&base_dir);

    let config_file = match &location.config {
        Some(path) => Some(path.clone()),
        None => Some(base_dir.join(CONFIG_FILE_NAME)).filter(|p| p.is_file()),
    };
    if let Some(path) = config_file {
        tracing::debug!(path = %path.display(), "Loading configuration file");
        layered = layered
            .load_from_file(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    }

    layered.update_from_cli(CliConfigOverrides { base_dir: location.base_dir.clone(), ..overrides });
    Ok(layered)
}
