use std::path::PathBuf;

use clap::Parser;
use tracing::instrument;
use volet::{
    domain::{FlowReading, HistoryEntry},
    Store,
};

use super::{
    deviation_label,
    terminal::{paint_status, Colorize},
    OutputFormat,
};

#[derive(Debug, Parser)]
#[command(
    about = "Classify a single reading without saving it to a project",
    allow_negative_numbers = true
)]
pub struct Calc {
    /// The design airflow, in m³/h
    reference: f64,

    /// The measured airflow, in m³/h
    measured: f64,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

impl Calc {
    #[instrument(level = "debug")]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let reading = FlowReading::new(self.reference, self.measured)?;
        let result = reading.evaluate();

        let mut store = Store::open(root)?;
        store.record_calculation(reading);
        store.flush()?;

        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            OutputFormat::Table => {
                println!(
                    "{:.1} → {:.1} m³/h",
                    reading.reference_flow(),
                    reading.measured_flow()
                );
                println!(
                    "Deviation: {}  {}",
                    deviation_label(&result).strong(),
                    paint_status(result.label, result.status)
                );
            }
        }
        Ok(())
    }
}

#[derive(Debug, Parser)]
#[command(about = "List recent quick calculations, newest first")]
pub struct History {
    /// Forget every recorded calculation
    #[arg(long)]
    clear: bool,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

impl History {
    #[instrument(level = "debug")]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut store = Store::open(root)?;

        if self.clear {
            store.clear_history();
            store.flush()?;
            println!("{}", "History cleared".success());
            return Ok(());
        }

        let entries: Vec<&HistoryEntry> = store.history().entries().collect();
        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
            OutputFormat::Table if entries.is_empty() => {
                println!("No calculations yet. Run one with 'volet calc <reference> <measured>'.");
            }
            OutputFormat::Table => {
                for entry in entries {
                    println!(
                        "{}  {:>8.1} → {:>8.1}  {:>+7.1}%  {}",
                        entry.timestamp.format("%Y-%m-%d %H:%M").to_string().dim(),
                        entry.reference_flow,
                        entry.measured_flow,
                        entry.deviation,
                        paint_status(entry.status.label(), entry.status)
                    );
                }
            }
        }
        Ok(())
    }
}
