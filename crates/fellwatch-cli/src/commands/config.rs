use crate::cli::ConfigArgs;
use crate::output::OutputWriter;
use anyhow::Result;
use fellwatch_core::config::{CliConfigOverrides, ConfigSource};
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::Tabled;

use super::load_layered_config;

/// One effective setting and where it came from
#[derive(Debug, Serialize)]
struct ConfigEntry {
    value: String,
    source: ConfigSource,
}

#[derive(Tabled)]
struct ConfigRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Source")]
    source: String,
}

pub fn execute(args: ConfigArgs, output: &OutputWriter) -> Result<()> {
    let layered = load_layered_config(&args.location, CliConfigOverrides::default())?;
    let inspection_map = layered.to_inspection_map();
    let validation = layered.resolve().err();

    if output.is_json() {
        let entries: BTreeMap<String, ConfigEntry> = inspection_map
            .into_iter()
            .map(|(key, (value, source))| (key, ConfigEntry { value, source }))
            .collect();
        output.result(entries)?;
    } else {
        output.section("Configuration Values");

        // BTreeMap iteration keeps the rows sorted by key
        let rows: Vec<ConfigRow> = inspection_map
            .into_iter()
            .map(|(key, (value, source))| ConfigRow { key, value, source: format!("{:?}", source) })
            .collect();
        output.table(rows);

        output.section("Configuration Precedence");
        output.info("CLI arguments > Config file > Defaults");
    }

    if let Some(error) = validation {
        output.warning(format!("Configuration would be rejected by `fellwatch run`: {}", error));
    }

    Ok(())
}
