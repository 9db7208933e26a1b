use std::path::PathBuf;

use clap::Parser;
use serde_json::json;
use tracing::instrument;
use volet::{
    domain::{
        stats::{portfolio_stats, project_stats, sort_with_favorites_first_by},
        SecondaryKey,
    },
    AggregateStats, ComplianceStatus, Project, Store,
};

use super::{
    terminal::{is_narrow, paint_status, Colorize},
    OutputFormat,
};

#[derive(Debug, Parser, Default)]
#[command(about = "Show project counts and compliance rates")]
pub struct Status {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Suppress headers and format for scripting
    #[arg(long)]
    quiet: bool,
}

/// The worst status among the counted shutters.
const fn rate_status(stats: &AggregateStats) -> ComplianceStatus {
    if stats.non_compliant_count > 0 {
        ComplianceStatus::NonCompliant
    } else if stats.acceptable_count > 0 {
        ComplianceStatus::Acceptable
    } else {
        ComplianceStatus::Compliant
    }
}

/// The compliance rate right-aligned in `width` columns, then coloured.
///
/// Padding is applied before painting so escape codes do not count
/// towards the width.
fn rate_cell(stats: &AggregateStats, width: usize) -> String {
    let rate = format!("{:.1}%", stats.compliance_rate);
    paint_status(&format!("{rate:>width$}"), rate_status(stats))
}

impl Status {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let store = Store::open(root)?;

        if store.projects().is_empty() {
            println!("No projects found yet. Create one with 'volet add project'.");
            return Ok(());
        }

        let mut projects = store.projects().to_vec();
        sort_with_favorites_first_by(
            &mut projects,
            &store.favorites().projects,
            SecondaryKey::UpdatedDesc,
        );
        let total = portfolio_stats(&projects);

        match self.output {
            OutputFormat::Json => Self::output_json(&store, &projects, &total)?,
            OutputFormat::Table if self.quiet => Self::output_quiet(&total),
            OutputFormat::Table => Self::output_table(&store, &projects, &total),
        }

        Ok(())
    }

    fn output_json(
        store: &Store,
        projects: &[Project],
        total: &AggregateStats,
    ) -> anyhow::Result<()> {
        let rows: Vec<_> = projects
            .iter()
            .map(|project| {
                json!({
                    "id": project.id,
                    "name": project.name,
                    "mode": project.mode,
                    "city": project.city,
                    "favorite": store.favorites().projects.contains(project.id.as_str()),
                    "stats": project_stats(project),
                })
            })
            .collect();

        let output = json!({
            "projects": rows,
            "total": total,
        });

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn output_quiet(total: &AggregateStats) {
        println!(
            "shutters={} compliant={} acceptable={} non_compliant={} rate={:.1}",
            total.shutter_count,
            total.compliant_count,
            total.acceptable_count,
            total.non_compliant_count,
            total.compliance_rate
        );
    }

    fn output_table(store: &Store, projects: &[Project], total: &AggregateStats) {
        let narrow = is_narrow();

        println!("Projects");
        println!("{}", "────────".dim());

        for project in projects {
            let stats = project_stats(project);
            let star = if store.favorites().projects.contains(project.id.as_str()) {
                "★"
            } else {
                " "
            };
            if narrow {
                println!("{star} {}", project.name.strong());
                println!(
                    "    {} shutters, {} compliant ({})",
                    stats.shutter_count,
                    rate_cell(&stats, 0),
                    project.id.as_str().dim()
                );
            } else {
                println!(
                    "{star} {:<28} {:<12} {:>4} bât. {:>5} volets {}  {}",
                    project.name,
                    project.mode.as_str(),
                    stats.building_count,
                    stats.shutter_count,
                    rate_cell(&stats, 8),
                    project.id.as_str().dim()
                );
            }
        }

        println!();
        println!(
            "Total: {} shutters  {} {}  {} {}  {} {}",
            total.shutter_count,
            total.compliant_count.to_string().success(),
            ComplianceStatus::Compliant.label(),
            total.acceptable_count.to_string().warning(),
            ComplianceStatus::Acceptable.label(),
            total.non_compliant_count.to_string().error(),
            ComplianceStatus::NonCompliant.label(),
        );
        println!("Compliance rate: {:.1}%", total.compliance_rate);
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn empty_workspace_reports_nothing() {
        let tmp = tempdir().unwrap();
        Status::default()
            .run(tmp.path().to_path_buf())
            .expect("status should succeed on an empty workspace");
    }

    #[test]
    fn status_runs_in_every_format() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        crate::cli::testing::seed(&root);

        for (output, quiet) in [
            (OutputFormat::Table, false),
            (OutputFormat::Table, true),
            (OutputFormat::Json, false),
        ] {
            Status { output, quiet }
                .run(root.clone())
                .expect("status should succeed");
        }
    }

    #[test]
    fn rate_is_padded_before_it_is_painted() {
        let stats = AggregateStats {
            shutter_count: 4,
            compliant_count: 2,
            acceptable_count: 2,
            compliance_rate: 50.0,
            ..AggregateStats::default()
        };
        assert!(rate_cell(&stats, 8).contains("   50.0%"));
        assert!(rate_cell(&stats, 0).contains("50.0%"));
    }

    #[test]
    fn worst_reading_sets_the_rate_colour() {
        let mut stats = AggregateStats::default();
        assert_eq!(rate_status(&stats), ComplianceStatus::Compliant);
        stats.acceptable_count = 1;
        assert_eq!(rate_status(&stats), ComplianceStatus::Acceptable);
        stats.non_compliant_count = 1;
        assert_eq!(rate_status(&stats), ComplianceStatus::NonCompliant);
    }
}
