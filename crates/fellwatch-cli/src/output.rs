use console::{style, StyledObject};
use serde::Serialize;
use std::fmt::Display;
use tabled::{settings::Style, Table, Tabled};

/// Output format mode
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Human,
    Json,
}

pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self { format: if json { OutputFormat::Json } else { OutputFormat::Human } }
    }

    pub fn success(&self, message: impl Display) {
        self.status("success", style("✓").green().bold(), message, false);
    }

    pub fn info(&self, message: impl Display) {
        self.status("info", style("ℹ").blue().bold(), message, false);
    }

    pub fn warning(&self, message: impl Display) {
        self.status("warning", style("⚠").yellow().bold(), message, true);
    }

    /// One status line, as a marked sentence or a `{status, message}` object
    fn status(&self, status: &str, marker: StyledObject<&str>, message: impl Display, to_stderr: bool) {
        let line = match self.format {
            OutputFormat::Human => format!("{} {}", marker, message),
            OutputFormat::Json => pretty(&serde_json::json!({
                "status": status,
                "message": message.to_string(),
            })),
        };
        if to_stderr {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }

    /// Pre-formatted block, printed as is in human mode
    pub fn block(&self, text: impl Display) {
        if let OutputFormat::Human = self.format {
            println!("{}", text);
        }
    }

    pub fn table<T: Tabled>(&self, data: Vec<T>) {
        if let OutputFormat::Human = self.format {
            if data.is_empty() {
                println!("{}", style("(no data)").dim());
            } else {
                let mut table = Table::new(data);
                table.with(Style::rounded());
                println!("{}", table);
            }
        }
    }

    pub fn result<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        let output = match self.format {
            OutputFormat::Human => serde_json::to_value(&data)?,
            OutputFormat::Json => serde_json::json!({
                "status": "success",
                "data": data,
            }),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    pub fn section(&self, title: impl Display) {
        match self.format {
            OutputFormat::Human => {
                println!("\n{}", style(title).bold().underlined());
            }
            OutputFormat::Json => {}
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
