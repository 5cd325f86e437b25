use crate::cli::RunArgs;
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use fellwatch_analysis::{AnalysisOutcome, AnalysisPipeline, Report};
use fellwatch_core::config::CliConfigOverrides;
use fellwatch_store::{GeoJsonCache, LayerReaderRegistry, XlsxExportWriter, XlsxTableReader};
use serde::Serialize;
use tabled::Tabled;

use super::load_layered_config;

/// Output for run command
#[derive(Debug, Serialize)]
struct RunOutput<'a> {
    report: &'a Report,
    output_file: String,
    observation_cache: String,
}

#[derive(Tabled)]
struct LayerRow {
    #[tabled(rename = "Layer")]
    layer: String,
    #[tabled(rename = "Inside")]
    inside: usize,
    #[tabled(rename = "Near")]
    near: usize,
    #[tabled(rename = "Affected areas")]
    affected: usize,
    #[tabled(rename = "Relevant areas")]
    relevant: usize,
    #[tabled(rename = "Coverage")]
    coverage: String,
}

pub fn execute(args: RunArgs, output: &OutputWriter) -> Result<()> {
    let overrides = CliConfigOverrides {
        accuracy_threshold: args.accuracy_threshold,
        buffer_distance: args.buffer,
        dedup: args.dedup,
        ..Default::default()
    };
    let config = load_layered_config(&args.location, overrides)?
        .resolve()
        .context("Invalid configuration")?;

    tracing::info!(
        input = %config.input_dir.display(),
        crs = %config.crs,
        accuracy_threshold = config.accuracy_threshold,
        buffer = config.buffer_distance,
        "Starting analysis"
    );

    let pipeline = AnalysisPipeline::new(
        XlsxTableReader,
        LayerReaderRegistry::with_defaults(),
        GeoJsonCache,
        GeoJsonCache,
        XlsxExportWriter,
    );
    let outcome = pipeline.run(&config).context("Analysis failed")?;

    if output.is_json() {
        output.result(RunOutput {
            report: &outcome.report,
            output_file: outcome.output_file.display().to_string(),
            observation_cache: config.observation_cache.display().to_string(),
        })?;
    } else {
        render(&outcome, output);
    }

    Ok(())
}

fn render(outcome: &AnalysisOutcome, output: &OutputWriter) {
    output.block(&outcome.report);

    output.section("Per layer");
    let rows: Vec<LayerRow> = outcome
        .report
        .layers
        .iter()
        .map(|layer| LayerRow {
            layer: layer.kind.to_string(),
            inside: layer.inside,
            near: layer.near,
            affected: layer.affected_areas,
            relevant: layer.relevant_areas,
            coverage: format!("{:.1}%", layer.coverage_percent),
        })
        .collect();
    output.table(rows);

    if outcome.report.layers.iter().all(|l| l.relevant_areas == 0) {
        output.warning("No logging areas intersect the study extent");
    }

    println!();
    output.success(format!("Detail export saved to {}", outcome.output_file.display()));
}
