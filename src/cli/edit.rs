use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use non_empty_string::NonEmptyString;
use tracing::instrument;
use volet::{
    domain::{
        update::{BuildingUpdate, ProjectUpdate, ShutterUpdate, ZoneUpdate},
        ProjectMode, ShutterType,
    },
    Store,
};

use super::{clearable, deviation_label, parse_name, terminal::{paint_status, Colorize}};

#[derive(Debug, clap::Parser)]
pub struct Command {
    #[command(subcommand)]
    command: EditCommand,
}

/// Text options take an empty string to clear the field.
#[derive(Debug, clap::Parser)]
enum EditCommand {
    /// Edit a project
    Project {
        /// The identifier of the project
        id: String,

        /// New name
        #[arg(long, value_parser = parse_name)]
        name: Option<NonEmptyString>,

        /// New inspection mode
        #[arg(long)]
        mode: Option<ProjectMode>,

        /// New city
        #[arg(long)]
        city: Option<String>,

        /// New start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// New end date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
    },

    /// Edit a building
    Building {
        /// The identifier of the building
        id: String,

        /// New name
        #[arg(long, value_parser = parse_name)]
        name: Option<NonEmptyString>,

        /// New description
        #[arg(long)]
        description: Option<String>,
    },

    /// Edit a smoke-control zone
    Zone {
        /// The identifier of the zone
        id: String,

        /// New name
        #[arg(long, value_parser = parse_name)]
        name: Option<NonEmptyString>,

        /// New description
        #[arg(long)]
        description: Option<String>,
    },

    /// Edit a shutter
    Shutter {
        /// The identifier of the shutter
        id: String,

        /// New name
        #[arg(long, value_parser = parse_name)]
        name: Option<NonEmptyString>,

        /// New shutter type
        #[arg(long = "type")]
        kind: Option<ShutterType>,

        /// New design airflow, in m³/h
        #[arg(long)]
        reference: Option<f64>,

        /// New measured airflow, in m³/h
        #[arg(long)]
        measured: Option<f64>,

        /// New remarks
        #[arg(long)]
        remarks: Option<String>,
    },
}

/// Parse a clearable date option.
#[allow(clippy::option_option)]
fn clearable_date(value: Option<String>) -> anyhow::Result<Option<Option<NaiveDate>>> {
    clearable(value)
        .map(|date| {
            date.map(|d| {
                NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d")
                    .with_context(|| format!("Invalid date '{d}', expected YYYY-MM-DD"))
            })
            .transpose()
        })
        .transpose()
}

impl Command {
    #[instrument]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        use EditCommand as E;

        let mut store = Store::open(root)?;

        match self.command {
            E::Project {
                id,
                name,
                mode,
                city,
                start,
                end,
            } => {
                let update = ProjectUpdate {
                    name,
                    mode,
                    city: clearable(city),
                    start_date: clearable_date(start)?,
                    end_date: clearable_date(end)?,
                };
                let project = store.update_project(&id, update)?;
                if let (Some(start), Some(end)) = (project.start_date, project.end_date) {
                    if end < start {
                        tracing::warn!("Project {id} ends ({end}) before it starts ({start})");
                    }
                }
                println!("{}", format!("Updated project {}", project.name).success());
            }
            E::Building {
                id,
                name,
                description,
            } => {
                let update = BuildingUpdate {
                    name,
                    description: clearable(description),
                };
                let building = store.update_building(&id, update)?;
                println!("{}", format!("Updated building {}", building.name).success());
            }
            E::Zone {
                id,
                name,
                description,
            } => {
                let update = ZoneUpdate {
                    name,
                    description: clearable(description),
                };
                let zone = store.update_zone(&id, update)?;
                println!("{}", format!("Updated zone {}", zone.name).success());
            }
            E::Shutter {
                id,
                name,
                kind,
                reference,
                measured,
                remarks,
            } => {
                let update = ShutterUpdate {
                    name,
                    kind,
                    reference_flow: reference,
                    measured_flow: measured,
                    remarks: clearable(remarks),
                };
                let shutter = store.update_shutter(&id, update)?;
                let result = shutter.compliance();
                println!(
                    "{} ({} {})",
                    format!("Updated shutter {}", shutter.name).success(),
                    deviation_label(&result),
                    paint_status(result.label, result.status)
                );
            }
        }

        store.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use tempfile::tempdir;

    use super::*;
    use crate::cli::testing::seed;

    fn parse(args: &[&str]) -> Command {
        Command::try_parse_from(std::iter::once("edit").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn shutter_reading_is_updated() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        let seeded = seed(&root);

        parse(&["shutter", &seeded.shutter, "--measured", "130", "--remarks", ""])
            .run(root.clone())
            .unwrap();

        let store = Store::open(root).unwrap();
        let shutter = store.shutter(&seeded.shutter).unwrap();
        assert_eq!(shutter.measured_flow, 130.0);
        assert_eq!(shutter.remarks, None);
        assert_eq!(shutter.compliance().deviation, Some(30.0));
    }

    #[test]
    fn project_dates_can_be_set_and_cleared() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        let seeded = seed(&root);

        parse(&["project", &seeded.project, "--start", "2024-03-01", "--city", ""])
            .run(root.clone())
            .unwrap();
        let store = Store::open(root.clone()).unwrap();
        let project = store.project(&seeded.project).unwrap();
        assert_eq!(project.start_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(project.city, None);

        parse(&["project", &seeded.project, "--start", ""])
            .run(root.clone())
            .unwrap();
        let store = Store::open(root).unwrap();
        assert_eq!(store.project(&seeded.project).unwrap().start_date, None);
    }

    #[test]
    fn malformed_date_is_an_error() {
        assert!(clearable_date(Some("01/03/2024".to_string())).is_err());
        assert!(matches!(clearable_date(None), Ok(None)));
    }

    #[test]
    fn invalid_reading_leaves_the_shutter_alone() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        let seeded = seed(&root);

        let result = parse(&["shutter", &seeded.shutter, "--reference", "0"]).run(root.clone());
        assert!(result.is_err());

        let store = Store::open(root).unwrap();
        assert_eq!(store.shutter(&seeded.shutter).unwrap().reference_flow, 100.0);
    }

    #[test]
    fn unknown_zone_is_an_error() {
        let tmp = tempdir().unwrap();
        let result = parse(&["zone", "missing", "--name", "ZF 2"]).run(tmp.path().to_path_buf());
        assert!(result.is_err());
    }
}
