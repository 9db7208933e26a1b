use std::path::{Path, PathBuf};

mod add;
mod calc;
mod edit;
mod info;
mod search;
mod show;
mod status;
mod terminal;

use anyhow::Context;
use clap::ArgAction;
use non_empty_string::NonEmptyString;
use status::Status;
use tracing::instrument;
use volet::{
    domain::{ComplianceResult, FavoriteKind, ProjectMode},
    storage::store::{config_path, STORE_DIR},
    Store,
};

/// Parse a record name, rejecting empty input.
fn parse_name(s: &str) -> Result<NonEmptyString, String> {
    NonEmptyString::new(s.trim().to_string()).map_err(|_| "name must not be empty".to_string())
}

/// Map an optional text argument onto a clearable field.
///
/// An empty string clears the field.
#[allow(clippy::option_option)]
fn clearable(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| if v.trim().is_empty() { None } else { Some(v) })
}

/// Render a deviation for display, e.g. `+5.0%`.
fn deviation_label(result: &ComplianceResult) -> String {
    result
        .deviation
        .map_or_else(|| "n/a".to_string(), |d| format!("{d:+.1}%"))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The path to the root of the inspection workspace
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::Status(Status::default()))
            .run(self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Show every project with its compliance statistics (default)
    Status(Status),

    /// Initialize a new inspection workspace
    Init,

    /// Show a project tree with the result of every shutter
    Show(show::Show),

    /// Evaluate a single reading and record it in the history
    Calc(calc::Calc),

    /// Show or clear the quick-calculation history
    History(calc::History),

    /// Create a project, building, zone or shutter
    Add(add::Command),

    /// Change the fields of an existing record
    Edit(edit::Command),

    /// Delete a record and everything under it
    Remove(Remove),

    /// Mark or unmark a record as a favourite
    Favorite(Favorite),

    /// Search shutters by name, location or remarks
    Search(search::Search),

    /// Summarise what the workspace holds
    Info(info::Info),

    /// Delete every record, favourite and calculation
    Clear(info::Clear),

    /// Show or modify configuration settings
    Config(Config),
}

impl Command {
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        match self {
            Self::Status(command) => command.run(root)?,
            Self::Init => Init::run(&root)?,
            Self::Show(command) => command.run(root)?,
            Self::Calc(command) => command.run(root)?,
            Self::History(command) => command.run(root)?,
            Self::Add(command) => command.run(root)?,
            Self::Edit(command) => command.run(root)?,
            Self::Remove(command) => command.run(root)?,
            Self::Favorite(command) => command.run(root)?,
            Self::Search(command) => command.run(root)?,
            Self::Info(command) => command.run(root)?,
            Self::Clear(command) => command.run(root)?,
            Self::Config(command) => command.run(&root)?,
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct Init;

impl Init {
    #[instrument]
    fn run(root: &Path) -> anyhow::Result<()> {
        let dir = root.join(STORE_DIR);
        if dir.exists() {
            anyhow::bail!("Workspace already initialized (found existing {STORE_DIR} directory)");
        }

        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {STORE_DIR} directory"))?;

        volet::Config::default()
            .save(&config_path(root))
            .context("Failed to create config.toml")?;

        let store = Store::open(root.to_path_buf())?;
        store.flush()?;

        println!("Initialized inspection workspace in {}", root.display());
        println!("  Created: {STORE_DIR}/config.toml");
        println!("  Created: {STORE_DIR}/projects.json");
        println!();
        println!("Next steps:");
        println!("  volet add project \"Your First Project\"");

        Ok(())
    }
}

/// Kinds of record that can be removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum RecordKind {
    Project,
    Building,
    Zone,
    Compartment,
    Shutter,
}

#[derive(Debug, clap::Parser)]
pub struct Remove {
    /// The kind of record to remove
    kind: RecordKind,

    /// The identifier of the record
    id: String,
}

impl Remove {
    #[instrument]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        use terminal::Colorize;

        let mut store = Store::open(root)?;
        let removed = match self.kind {
            RecordKind::Project => store.delete_project(&self.id),
            RecordKind::Building => store.delete_building(&self.id),
            RecordKind::Zone => store.delete_zone(&self.id),
            RecordKind::Compartment => store.delete_compartment_zone(&self.id),
            RecordKind::Shutter => store.delete_shutter(&self.id),
        };
        if !removed {
            anyhow::bail!("No {:?} with id {}", self.kind, self.id);
        }
        store.flush()?;

        println!("{}", format!("Removed {}", self.id).success());
        Ok(())
    }
}

/// Levels of the tree that can hold favourites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum FavoriteLevel {
    Project,
    Building,
    Zone,
    Shutter,
}

impl From<FavoriteLevel> for FavoriteKind {
    fn from(level: FavoriteLevel) -> Self {
        match level {
            FavoriteLevel::Project => Self::Project,
            FavoriteLevel::Building => Self::Building,
            FavoriteLevel::Zone => Self::Zone,
            FavoriteLevel::Shutter => Self::Shutter,
        }
    }
}

#[derive(Debug, clap::Parser)]
pub struct Favorite {
    /// The level of the record
    kind: FavoriteLevel,

    /// The identifier of the record
    id: String,
}

impl Favorite {
    #[instrument]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        use terminal::Colorize;

        let mut store = Store::open(root)?;
        if !record_exists(&store, self.kind, &self.id) {
            anyhow::bail!("No {:?} with id {}", self.kind, self.id);
        }

        let now_favorite = store
            .favorites_mut()
            .get_mut(self.kind.into())
            .toggle(self.id.as_str().into());
        store.flush()?;

        if now_favorite {
            println!("{}", format!("★ {} added to favourites", self.id).success());
        } else {
            println!("{}", format!("{} removed from favourites", self.id).dim());
        }
        Ok(())
    }
}

fn record_exists(store: &Store, level: FavoriteLevel, id: &str) -> bool {
    match level {
        FavoriteLevel::Project => store.project(id).is_some(),
        FavoriteLevel::Building => store.building(id).is_some(),
        FavoriteLevel::Zone => store
            .projects()
            .iter()
            .flat_map(|p| &p.buildings)
            .flat_map(|b| &b.functional_zones)
            .any(|z| z.id.as_str() == id),
        FavoriteLevel::Shutter => store.shutter(id).is_some(),
    }
}

#[derive(Debug, clap::Parser)]
pub struct Config {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Debug, clap::Parser)]
enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key to set
        key: String,

        /// Value to set
        value: String,
    },
}

impl Config {
    #[instrument]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        use terminal::Colorize;

        let path = config_path(root);
        let mut config = if path.exists() {
            volet::Config::load(&path)?
        } else {
            volet::Config::default()
        };

        match self.command {
            ConfigCommand::Show => {
                println!("Configuration:");
                println!("  history_limit: {}", config.history_limit());
                println!("  default_mode: {}", config.default_mode);
            }
            ConfigCommand::Set { key, value } => {
                match key.as_str() {
                    "history_limit" => {
                        let limit = value
                            .parse::<usize>()
                            .map_err(|_| anyhow::anyhow!("Value must be a positive integer"))?;
                        config.set_history_limit(limit);
                    }
                    "default_mode" => {
                        config.default_mode = value.parse::<ProjectMode>()?;
                    }
                    _ => {
                        anyhow::bail!(
                            "Unknown configuration key: '{key}'\nSupported keys: history_limit, \
                             default_mode"
                        );
                    }
                }
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                config.save(&path)?;
                println!("{}", format!("Set {key}").success());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    use std::path::Path;

    use volet::{
        domain::{
            update::{NewBuilding, NewProject, NewShutter, NewZone},
            ProjectMode, ShutterType,
        },
        Store,
    };

    use super::parse_name;

    /// Identifiers of a seeded one-shutter tree.
    pub struct Seeded {
        pub project: String,
        pub building: String,
        pub zone: String,
        pub shutter: String,
    }

    /// Seed a workspace with one project, building, zone and shutter.
    pub fn seed(root: &Path) -> Seeded {
        let mut store = Store::open(root.to_path_buf()).unwrap();
        let project = store
            .create_project(NewProject {
                name: parse_name("Tour A").unwrap(),
                mode: ProjectMode::Smoke,
                city: Some("Lyon".to_string()),
                start_date: None,
                end_date: None,
            })
            .id
            .to_string();
        let building = store
            .create_building(
                &project,
                NewBuilding {
                    name: parse_name("Bâtiment A").unwrap(),
                    description: None,
                },
            )
            .unwrap()
            .id
            .to_string();
        let zone = store
            .create_zone(
                &building,
                NewZone {
                    name: parse_name("ZF 1").unwrap(),
                    description: None,
                },
            )
            .unwrap()
            .id
            .to_string();
        let shutter = store
            .create_shutter(
                &zone,
                NewShutter {
                    name: parse_name("VH-01").unwrap(),
                    kind: ShutterType::High,
                    reference_flow: 100.0,
                    measured_flow: 105.0,
                    remarks: Some("Grille encrassée".to_string()),
                },
            )
            .unwrap()
            .id
            .to_string();
        store.flush().unwrap();
        Seeded {
            project,
            building,
            zone,
            shutter,
        }
    }
}
