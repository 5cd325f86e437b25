use console::style;
use fellwatch_core::error::FellwatchError;
use std::fmt;
use std::path::Path;

/// Enhanced error type with suggestions
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), context: None, suggestions: Vec::new(), help_command: None }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Turn any command failure into a displayable error.
///
/// Known domain errors get tailored suggestions; the rest keep their
/// context chain.
pub fn from_error(error: &anyhow::Error) -> CliError {
    if let Some(domain) = error.chain().find_map(|e| e.downcast_ref::<FellwatchError>()) {
        return from_domain(domain);
    }

    let chain: Vec<String> = error.chain().skip(1).map(|e| e.to_string()).collect();
    let mut cli_error = CliError::new(error.to_string());
    if !chain.is_empty() {
        cli_error = cli_error.with_context(format!("Caused by:\n  {}", chain.join("\n  ")));
    }
    cli_error.with_help("Run: fellwatch --help")
}

fn from_domain(error: &FellwatchError) -> CliError {
    match error {
        FellwatchError::NoInputFiles { dir } => no_input_files(dir),
        FellwatchError::EmptyObservations => empty_observations(),
        FellwatchError::MissingColumn { file, column } => missing_column(file, column),
        FellwatchError::UnsupportedFormat { extension, supported } => {
            unsupported_layer_format(extension, supported)
        }
        FellwatchError::ConfigInvalid { key, reason } => invalid_config(key, reason),
        FellwatchError::OutputDirectory { path, source } => {
            output_directory(path, &source.to_string())
        }
        other => CliError::new(other.to_string()).with_help("Run: fellwatch run --help"),
    }
}

/// Create error for an input directory without spreadsheets
pub fn no_input_files(dir: &Path) -> CliError {
    CliError::new("No observation files found")
        .with_context(format!(
            "No .xlsx files were found in the input directory.\n\nDirectory: {}",
            dir.display()
        ))
        .with_suggestion("Export the observations as .xlsx into the input directory")
        .with_suggestion("Or point at another directory: fellwatch run --base-dir <DIR>")
        .with_help("Run: fellwatch config")
}

/// Create error for an empty observation set after cleaning
pub fn empty_observations() -> CliError {
    CliError::new("No usable observations")
        .with_context(
            "Every observation row was dropped during cleaning, so there is no study extent.\n\n\
             Rows are dropped when coordinates are missing or the accuracy exceeds the threshold.",
        )
        .with_suggestion("Check that the coordinate columns hold numbers")
        .with_suggestion("Or raise the limit: fellwatch run --accuracy-threshold <METERS>")
        .with_suggestion("Delete a stale observation cache in the processed directory")
        .with_help("Run: fellwatch run --help")
}

/// Create error for a spreadsheet lacking a required column
pub fn missing_column(file: &str, column: &str) -> CliError {
    CliError::new(format!("Column '{}' not found", column))
        .with_context(format!(
            "The spreadsheet has no '{}' column after the header offset.\n\nFile: {}",
            column, file
        ))
        .with_suggestion("Check that the header row sits below the configured header_offset rows")
        .with_suggestion("Or map the column in fellwatch.toml under [columns]")
        .with_help("Run: fellwatch config")
}

/// Create error for a logging layer in an unknown format
pub fn unsupported_layer_format(extension: &str, supported: &[String]) -> CliError {
    CliError::new("Unsupported logging layer format")
        .with_context(format!(
            "Layer files with extension '{}' cannot be read.\n\nSupported: {}",
            extension,
            supported.join(", ")
        ))
        .with_suggestion("Convert the layer to GeoJSON or Shapefile")
        .with_suggestion("Then update the layer file name in fellwatch.toml")
        .with_help("Run: fellwatch config")
}

/// Create error for a rejected configuration value
pub fn invalid_config(key: &str, reason: &str) -> CliError {
    CliError::new(format!("Invalid configuration: {}", key))
        .with_context(reason.to_string())
        .with_suggestion("Fix the value in fellwatch.toml or on the command line")
        .with_help("Run: fellwatch config")
}

/// Create error for an output directory that cannot be created
pub fn output_directory(path: &Path, error: &str) -> CliError {
    CliError::new("Cannot create output directory")
        .with_context(format!("Path: {}\n\nError: {}", path.display(), error))
        .with_suggestion("Check permissions on the base directory")
        .with_suggestion("Or set processed_dir in fellwatch.toml")
        .with_help("Run: fellwatch config")
}
