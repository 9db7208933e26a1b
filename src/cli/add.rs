use std::path::PathBuf;

use chrono::NaiveDate;
use non_empty_string::NonEmptyString;
use tracing::instrument;
use volet::{
    domain::{
        update::{NewBuilding, NewProject, NewShutter, NewZone},
        ProjectMode, ShutterType,
    },
    Store,
};

use super::{parse_name, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct Command {
    #[command(subcommand)]
    command: AddCommand,
}

#[derive(Debug, clap::Parser)]
enum AddCommand {
    /// Create a project
    Project {
        /// Project name
        #[arg(value_parser = parse_name)]
        name: NonEmptyString,

        /// Inspection mode (smoke, compartment, complete); defaults to the
        /// configured mode
        #[arg(long)]
        mode: Option<ProjectMode>,

        /// City
        #[arg(long)]
        city: Option<String>,

        /// Planned start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Planned end date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// Create a building in a project
    Building {
        /// The identifier of the project
        project: String,

        /// Building name
        #[arg(value_parser = parse_name)]
        name: NonEmptyString,

        /// Description
        #[arg(long)]
        description: Option<String>,
    },

    /// Create a smoke-control zone in a building
    Zone {
        /// The identifier of the building
        building: String,

        /// Zone name
        #[arg(value_parser = parse_name)]
        name: NonEmptyString,

        /// Description
        #[arg(long)]
        description: Option<String>,
    },

    /// Create a compartmentation zone in a building
    Compartment {
        /// The identifier of the building
        building: String,

        /// Zone name
        #[arg(value_parser = parse_name)]
        name: NonEmptyString,

        /// Description
        #[arg(long)]
        description: Option<String>,
    },

    /// Create a shutter in a smoke-control zone
    Shutter {
        /// The identifier of the zone
        zone: String,

        /// Shutter name
        #[arg(value_parser = parse_name)]
        name: NonEmptyString,

        /// The design airflow, in m³/h
        #[arg(long)]
        reference: f64,

        /// The measured airflow, in m³/h
        #[arg(long)]
        measured: f64,

        /// Shutter type (high/VH, low/VB)
        #[arg(long = "type", default_value = "high")]
        kind: ShutterType,

        /// Remarks
        #[arg(long)]
        remarks: Option<String>,
    },
}

impl Command {
    #[instrument]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut store = Store::open(root)?;

        let (label, id) = match self.command {
            AddCommand::Project {
                name,
                mode,
                city,
                start,
                end,
            } => {
                if let (Some(start), Some(end)) = (start, end) {
                    if end < start {
                        anyhow::bail!("End date {end} is before start date {start}");
                    }
                }
                let default_mode = store.config().default_mode;
                let mode = mode.unwrap_or(default_mode);
                let project = store.create_project(NewProject {
                    name,
                    mode,
                    city,
                    start_date: start,
                    end_date: end,
                });
                ("project", project.id.clone())
            }
            AddCommand::Building {
                project,
                name,
                description,
            } => {
                let building = store.create_building(&project, NewBuilding { name, description })?;
                ("building", building.id.clone())
            }
            AddCommand::Zone {
                building,
                name,
                description,
            } => {
                let zone = store.create_zone(&building, NewZone { name, description })?;
                ("zone", zone.id.clone())
            }
            AddCommand::Compartment {
                building,
                name,
                description,
            } => {
                let zone =
                    store.create_compartment_zone(&building, NewZone { name, description })?;
                ("compartment zone", zone.id.clone())
            }
            AddCommand::Shutter {
                zone,
                name,
                reference,
                measured,
                kind,
                remarks,
            } => {
                let shutter = store.create_shutter(
                    &zone,
                    NewShutter {
                        name,
                        kind,
                        reference_flow: reference,
                        measured_flow: measured,
                        remarks,
                    },
                )?;
                ("shutter", shutter.id.clone())
            }
        };
        store.flush()?;

        println!("{}", format!("Added {label} {id}").success());
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
        Command::try_parse_from(std::iter::once("add").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn project_takes_the_configured_mode() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        let mut config = volet::Config::default();
        config.default_mode = ProjectMode::Complete;
        std::fs::create_dir_all(root.join(".volet")).unwrap();
        config
            .save(&volet::storage::store::config_path(&root))
            .unwrap();

        parse(&["project", "Tour B", "--city", "Lyon"])
            .run(root.clone())
            .unwrap();

        let store = Store::open(root).unwrap();
        let project = &store.projects()[0];
        assert_eq!(project.name, "Tour B");
        assert_eq!(project.mode, ProjectMode::Complete);
        assert_eq!(project.city.as_deref(), Some("Lyon"));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let tmp = tempdir().unwrap();
        let command = parse(&["project", "P", "--start", "2024-05-01", "--end", "2024-04-01"]);
        assert!(command.run(tmp.path().to_path_buf()).is_err());
    }

    #[test]
    fn shutter_is_added_to_the_zone() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        let seeded = seed(&root);

        parse(&[
            "shutter",
            &seeded.zone,
            "VB-02",
            "--type",
            "vb",
            "--reference",
            "80",
            "--measured",
            "95",
        ])
        .run(root.clone())
        .unwrap();

        let store = Store::open(root).unwrap();
        let (_, building) = store.building(&seeded.building).unwrap();
        let shutters = &building.functional_zones[0].shutters;
        assert_eq!(shutters.len(), 2);
        assert_eq!(shutters[1].kind, ShutterType::Low);
    }

    #[test]
    fn missing_parent_is_an_error() {
        let tmp = tempdir().unwrap();
        let command = parse(&["zone", "missing", "ZF 1"]);
        assert!(command.run(tmp.path().to_path_buf()).is_err());
    }

    #[test]
    fn blank_name_fails_to_parse() {
        let result = Command::try_parse_from(["add", "project", "  "]);
        assert!(result.is_err());
    }
}
