use std::path::PathBuf;

use clap::Parser;
use serde_json::json;
use tracing::instrument;
use volet::{domain::SearchHit, Store};

use super::{
    deviation_label,
    terminal::{paint_status, Colorize},
    OutputFormat,
};

#[derive(Debug, Parser)]
#[command(about = "Find shutters whose name, zone, building, project, city or remarks match")]
pub struct Search {
    /// Words that must all appear, in any order
    words: Vec<String>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

impl Search {
    #[instrument(level = "debug")]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let store = Store::open(root)?;
        let query = self.words.join(" ");
        let hits = store.search_shutters(&query);
        tracing::debug!("{} shutters match '{query}'", hits.len());

        match self.output {
            OutputFormat::Json => {
                let rows: Vec<_> = hits.iter().map(hit_json).collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            }
            OutputFormat::Table if hits.is_empty() => println!("No matching shutters"),
            OutputFormat::Table => {
                for hit in &hits {
                    print_hit(hit);
                }
            }
        }
        Ok(())
    }
}

fn print_hit(hit: &SearchHit<'_>) {
    let result = hit.shutter.compliance();
    println!(
        "{:<16} {:>7}  {}  {}",
        hit.shutter.name.strong(),
        deviation_label(&result),
        paint_status(result.label, result.status),
        hit.shutter.id.as_str().dim()
    );
    println!(
        "  {}",
        format!(
            "{} › {} › {}",
            hit.project.name, hit.building.name, hit.zone.name
        )
        .dim()
    );
}

fn hit_json(hit: &SearchHit<'_>) -> serde_json::Value {
    json!({
        "shutter": {
            "id": hit.shutter.id,
            "name": hit.shutter.name,
            "result": hit.shutter.compliance(),
        },
        "zone": { "id": hit.zone.id, "name": hit.zone.name },
        "building": { "id": hit.building.id, "name": hit.building.name },
        "project": { "id": hit.project.id, "name": hit.project.name },
    })
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::cli::testing::seed;

    #[test]
    fn search_runs_in_every_format() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        seed(&root);

        for output in [OutputFormat::Table, OutputFormat::Json] {
            Search {
                words: vec!["lyon".to_string(), "VH".to_string()],
                output,
            }
            .run(root.clone())
            .expect("search should succeed");
        }
    }

    #[test]
    fn hit_json_names_the_ancestors() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        let seeded = seed(&root);
        let store = Store::open(root).unwrap();

        let hits = store.search_shutters("encrassée");
        assert_eq!(hits.len(), 1);
        let value = hit_json(&hits[0]);
        assert_eq!(value["zone"]["id"], seeded.zone.as_str());
        assert_eq!(value["shutter"]["result"]["status"], "compliant");
    }
}
