//! A filesystem backed store of inspection records.
//!
//! The [`Store`] owns the record tree, the favourites and the calculation
//! history for one workspace. Everything is held in memory; changes reach the
//! disk on [`Store::flush`].
//!
//! Layout under the workspace root:
//!
//! ```text
//! .volet/
//!   config.toml
//!   projects.json
//!   favorites.json
//!   history.json
//! ```

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use tracing::instrument;

use crate::{
    domain::{
        compliance::{FlowReading, InvalidFlow},
        favorites::Favorites,
        history::{History, HistoryEntry},
        project::{Building, CompartmentZone, FunctionalZone, Id, Project, Shutter},
        search::{search_shutters, SearchHit},
        update::{
            BuildingUpdate, NewBuilding, NewProject, NewShutter, NewZone, ProjectUpdate,
            ShutterUpdate, ZoneUpdate,
        },
        Config,
    },
    storage::document::{
        FavoritesVersions, HistoryFile, HistoryVersions, ProjectDoc, ProjectsFile,
        ProjectsVersions,
    },
};

/// Name of the metadata directory under the workspace root.
pub const STORE_DIR: &str = ".volet";

const CONFIG_FILE: &str = "config.toml";
const PROJECTS_FILE: &str = "projects.json";
const FAVORITES_FILE: &str = "favorites.json";
const HISTORY_FILE: &str = "history.json";

/// Errors raised by the [`Store`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A document could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// The document path.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
    /// A document could not be written.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        /// The document path.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
    /// A document is not valid JSON of the expected shape.
    #[error("malformed document {}: {source}", .path.display())]
    Parse {
        /// The document path.
        path: PathBuf,
        /// The underlying error.
        source: serde_json::Error,
    },
    /// The referenced entity does not exist.
    #[error("{kind} {id} not found")]
    NotFound {
        /// What was looked for.
        kind: &'static str,
        /// The identifier looked for.
        id: Id,
    },
    /// A shutter reading is not valid.
    #[error(transparent)]
    InvalidFlow(#[from] InvalidFlow),
}

impl StoreError {
    fn not_found(kind: &'static str, id: &str) -> Self {
        Self::NotFound {
            kind,
            id: Id::from(id),
        }
    }
}

/// Summary of what the store holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    /// Number of projects.
    pub project_count: usize,
    /// Number of shutters across all projects.
    pub shutter_count: usize,
    /// Approximate size of the projects document, e.g. `"1.25 KB"`.
    pub storage_size: String,
}

/// A filesystem backed store of inspection records.
#[derive(Debug)]
pub struct Store {
    root: PathBuf,
    config: Config,
    projects: Vec<Project>,
    favorites: Favorites,
    history: History,
}

impl Store {
    /// Opens the store under the given workspace root.
    ///
    /// Missing documents are treated as empty. A missing or invalid
    /// configuration falls back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a document exists but cannot be read or parsed.
    #[instrument(level = "debug")]
    pub fn open(root: PathBuf) -> Result<Self, StoreError> {
        let dir = root.join(STORE_DIR);
        let config = load_config(&dir);
        let now = Utc::now();

        let projects = read_document::<ProjectsFile>(&dir.join(PROJECTS_FILE))?
            .map_or_else(Vec::new, |file| file.into_projects(now));
        let favorites = read_document::<FavoritesVersions>(&dir.join(FAVORITES_FILE))?
            .map_or_else(Favorites::default, Favorites::from);
        let history = History::from_entries(
            read_document::<HistoryFile>(&dir.join(HISTORY_FILE))?
                .map_or_else(Vec::new, HistoryFile::into_entries),
            config.history_limit(),
        );

        tracing::debug!("Loaded {} projects from {}", projects.len(), dir.display());

        Ok(Self {
            root,
            config,
            projects,
            favorites,
            history,
        })
    }

    /// The workspace root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The workspace configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// All projects, in insertion order.
    #[must_use]
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Find a project by identifier.
    #[must_use]
    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id.as_str() == id)
    }

    /// Find a building by identifier, with its project.
    #[must_use]
    pub fn building(&self, id: &str) -> Option<(&Project, &Building)> {
        self.projects.iter().find_map(|p| {
            p.buildings
                .iter()
                .find(|b| b.id.as_str() == id)
                .map(|b| (p, b))
        })
    }

    /// Find a shutter by identifier.
    #[must_use]
    pub fn shutter(&self, id: &str) -> Option<&Shutter> {
        self.projects
            .iter()
            .flat_map(Project::shutters)
            .find(|s| s.id.as_str() == id)
    }

    /// The favourites.
    #[must_use]
    pub const fn favorites(&self) -> &Favorites {
        &self.favorites
    }

    /// The favourites, for modification.
    pub const fn favorites_mut(&mut self) -> &mut Favorites {
        &mut self.favorites
    }

    /// The quick-calculation history.
    #[must_use]
    pub const fn history(&self) -> &History {
        &self.history
    }

    /// Record a quick calculation.
    pub fn record_calculation(&mut self, reading: FlowReading) -> &HistoryEntry {
        self.history.record(reading)
    }

    /// Empty the quick-calculation history.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Search shutters across every project.
    #[must_use]
    pub fn search_shutters(&self, query: &str) -> Vec<SearchHit<'_>> {
        search_shutters(&self.projects, query)
    }

    /// Create a project.
    #[instrument(level = "debug", skip(self))]
    pub fn create_project(&mut self, new: NewProject) -> &Project {
        let project = new.build(Utc::now());
        tracing::info!("Created project {}", project.id);
        self.projects.push(project);
        &self.projects[self.projects.len() - 1]
    }

    /// Update a project.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if there is no such project.
    #[instrument(level = "debug", skip(self))]
    pub fn update_project(
        &mut self,
        id: &str,
        update: ProjectUpdate,
    ) -> Result<&Project, StoreError> {
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.id.as_str() == id)
            .ok_or_else(|| StoreError::not_found("project", id))?;
        update.apply(project, Utc::now());
        Ok(project)
    }

    /// Delete a project and everything under it.
    ///
    /// Returns `false` if there is no such project.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_project(&mut self, id: &str) -> bool {
        let Some(index) = self.projects.iter().position(|p| p.id.as_str() == id) else {
            return false;
        };
        let project = self.projects.remove(index);
        self.favorites.projects.remove(id);
        for building in &project.buildings {
            self.forget_building(building);
        }
        tracing::info!("Deleted project {id}");
        true
    }

    /// Create a building in a project.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if there is no such project.
    #[instrument(level = "debug", skip(self))]
    pub fn create_building(
        &mut self,
        project_id: &str,
        new: NewBuilding,
    ) -> Result<&Building, StoreError> {
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.id.as_str() == project_id)
            .ok_or_else(|| StoreError::not_found("project", project_id))?;
        let building = new.build(project.id.clone(), Utc::now());
        tracing::info!("Created building {} in project {project_id}", building.id);
        project.buildings.push(building);
        Ok(&project.buildings[project.buildings.len() - 1])
    }

    /// Update a building.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if there is no such building.
    #[instrument(level = "debug", skip(self))]
    pub fn update_building(
        &mut self,
        id: &str,
        update: BuildingUpdate,
    ) -> Result<&Building, StoreError> {
        let building = self
            .buildings_mut()
            .find(|b| b.id.as_str() == id)
            .ok_or_else(|| StoreError::not_found("building", id))?;
        update.apply(building);
        Ok(building)
    }

    /// Delete a building and everything under it.
    ///
    /// Returns `false` if there is no such building.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_building(&mut self, id: &str) -> bool {
        let removed = self.projects.iter_mut().find_map(|p| {
            let index = p.buildings.iter().position(|b| b.id.as_str() == id)?;
            Some(p.buildings.remove(index))
        });
        let Some(building) = removed else {
            return false;
        };
        self.forget_building(&building);
        tracing::info!("Deleted building {id}");
        true
    }

    /// Create a functional zone in a building.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if there is no such building.
    #[instrument(level = "debug", skip(self))]
    pub fn create_zone(
        &mut self,
        building_id: &str,
        new: NewZone,
    ) -> Result<&FunctionalZone, StoreError> {
        let building = self
            .buildings_mut()
            .find(|b| b.id.as_str() == building_id)
            .ok_or_else(|| StoreError::not_found("building", building_id))?;
        let zone = new.build_functional(building.id.clone(), Utc::now());
        tracing::info!("Created zone {} in building {building_id}", zone.id);
        building.functional_zones.push(zone);
        Ok(&building.functional_zones[building.functional_zones.len() - 1])
    }

    /// Update a functional zone.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if there is no such zone.
    #[instrument(level = "debug", skip(self))]
    pub fn update_zone(
        &mut self,
        id: &str,
        update: ZoneUpdate,
    ) -> Result<&FunctionalZone, StoreError> {
        let zone = self
            .zones_mut()
            .find(|z| z.id.as_str() == id)
            .ok_or_else(|| StoreError::not_found("zone", id))?;
        update.apply(zone);
        Ok(zone)
    }

    /// Delete a functional zone and its shutters.
    ///
    /// Returns `false` if there is no such zone.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_zone(&mut self, id: &str) -> bool {
        let removed = self.buildings_mut().find_map(|b| {
            let index = b.functional_zones.iter().position(|z| z.id.as_str() == id)?;
            Some(b.functional_zones.remove(index))
        });
        let Some(zone) = removed else {
            return false;
        };
        self.forget_zone(&zone);
        tracing::info!("Deleted zone {id}");
        true
    }

    /// Create a compartment zone in a building.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if there is no such building.
    #[instrument(level = "debug", skip(self))]
    pub fn create_compartment_zone(
        &mut self,
        building_id: &str,
        new: NewZone,
    ) -> Result<&CompartmentZone, StoreError> {
        let building = self
            .buildings_mut()
            .find(|b| b.id.as_str() == building_id)
            .ok_or_else(|| StoreError::not_found("building", building_id))?;
        let zone = new.build_compartment(building.id.clone(), Utc::now());
        tracing::info!("Created compartment zone {} in building {building_id}", zone.id);
        building.compartment_zones.push(zone);
        Ok(&building.compartment_zones[building.compartment_zones.len() - 1])
    }

    /// Delete a compartment zone and its devices.
    ///
    /// Returns `false` if there is no such zone.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_compartment_zone(&mut self, id: &str) -> bool {
        let removed = self.buildings_mut().any(|b| {
            let before = b.compartment_zones.len();
            b.compartment_zones.retain(|z| z.id.as_str() != id);
            b.compartment_zones.len() != before
        });
        if removed {
            tracing::info!("Deleted compartment zone {id}");
        }
        removed
    }

    /// Create a shutter in a functional zone.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no such zone, or if the reading is not
    /// valid.
    #[instrument(level = "debug", skip(self))]
    pub fn create_shutter(&mut self, zone_id: &str, new: NewShutter) -> Result<&Shutter, StoreError> {
        FlowReading::new(new.reference_flow, new.measured_flow)?;
        let zone = self
            .zones_mut()
            .find(|z| z.id.as_str() == zone_id)
            .ok_or_else(|| StoreError::not_found("zone", zone_id))?;
        let shutter = new.build(zone.id.clone(), Utc::now());
        tracing::info!("Created shutter {} in zone {zone_id}", shutter.id);
        zone.shutters.push(shutter);
        Ok(&zone.shutters[zone.shutters.len() - 1])
    }

    /// Update a shutter.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no such shutter, or if the update changes
    /// a flow and the resulting reading is not valid. The shutter is left
    /// untouched on error. Updates that leave both flows alone are accepted
    /// even when the stored reading is not valid.
    #[instrument(level = "debug", skip(self))]
    pub fn update_shutter(
        &mut self,
        id: &str,
        update: ShutterUpdate,
    ) -> Result<&Shutter, StoreError> {
        let shutter = self
            .shutters_mut()
            .find(|s| s.id.as_str() == id)
            .ok_or_else(|| StoreError::not_found("shutter", id))?;
        if update.reference_flow.is_some() || update.measured_flow.is_some() {
            FlowReading::new(
                update.reference_flow.unwrap_or(shutter.reference_flow),
                update.measured_flow.unwrap_or(shutter.measured_flow),
            )?;
        }
        update.apply(shutter, Utc::now());
        Ok(shutter)
    }

    /// Delete a shutter.
    ///
    /// Returns `false` if there is no such shutter.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_shutter(&mut self, id: &str) -> bool {
        let removed = self.zones_mut().any(|z| {
            let before = z.shutters.len();
            z.shutters.retain(|s| s.id.as_str() != id);
            z.shutters.len() != before
        });
        if removed {
            self.favorites.shutters.remove(id);
            tracing::info!("Deleted shutter {id}");
        }
        removed
    }

    /// Summarise what the store holds.
    ///
    /// The size is that of the bare JSON array of projects, without the
    /// version wrapper, counted in UTF-16 code units.
    ///
    /// # Errors
    ///
    /// Returns an error if the projects cannot be serialised.
    pub fn storage_info(&self) -> Result<StorageInfo, serde_json::Error> {
        let docs: Vec<ProjectDoc> = self.projects.iter().map(ProjectDoc::from).collect();
        let units = serde_json::to_string(&docs)?.encode_utf16().count();
        #[allow(clippy::cast_precision_loss)]
        let kilobytes = units as f64 / 1024.0;
        Ok(StorageInfo {
            project_count: self.projects.len(),
            shutter_count: self.projects.iter().flat_map(Project::shutters).count(),
            storage_size: format!("{kilobytes:.2} KB"),
        })
    }

    /// Delete every record, favourite and calculation, on disk and in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing document cannot be removed.
    #[instrument(level = "debug", skip(self))]
    pub fn clear_all(&mut self) -> Result<(), StoreError> {
        let dir = self.dir();
        for name in [PROJECTS_FILE, FAVORITES_FILE, HISTORY_FILE] {
            let path = dir.join(name);
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => return Err(StoreError::Write { path, source }),
            }
        }
        self.projects.clear();
        self.favorites = Favorites::default();
        self.history.clear();
        tracing::info!("Cleared all data in {}", dir.display());
        Ok(())
    }

    /// Write every document to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if a document cannot be written.
    #[instrument(level = "debug", skip(self))]
    pub fn flush(&self) -> Result<(), StoreError> {
        let dir = self.dir();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Write {
            path: dir.clone(),
            source,
        })?;

        write_document(
            &dir.join(PROJECTS_FILE),
            &ProjectsVersions::from_projects(&self.projects),
        )?;
        write_document(
            &dir.join(FAVORITES_FILE),
            &FavoritesVersions::from(&self.favorites),
        )?;
        write_document(
            &dir.join(HISTORY_FILE),
            &HistoryVersions::V1 {
                entries: self.history.entries().cloned().collect(),
            },
        )?;
        Ok(())
    }

    fn dir(&self) -> PathBuf {
        self.root.join(STORE_DIR)
    }

    fn buildings_mut(&mut self) -> impl Iterator<Item = &mut Building> {
        self.projects.iter_mut().flat_map(|p| p.buildings.iter_mut())
    }

    fn zones_mut(&mut self) -> impl Iterator<Item = &mut FunctionalZone> {
        self.buildings_mut()
            .flat_map(|b| b.functional_zones.iter_mut())
    }

    fn shutters_mut(&mut self) -> impl Iterator<Item = &mut Shutter> {
        self.zones_mut().flat_map(|z| z.shutters.iter_mut())
    }

    fn forget_building(&mut self, building: &Building) {
        self.favorites.buildings.remove(building.id.as_str());
        for zone in &building.functional_zones {
            self.forget_zone(zone);
        }
    }

    fn forget_zone(&mut self, zone: &FunctionalZone) {
        self.favorites.zones.remove(zone.id.as_str());
        for shutter in &zone.shutters {
            self.favorites.shutters.remove(shutter.id.as_str());
        }
    }
}

/// Path of the configuration file for a workspace root.
#[must_use]
pub fn config_path(root: &Path) -> PathBuf {
    root.join(STORE_DIR).join(CONFIG_FILE)
}

fn load_config(dir: &Path) -> Config {
    let path = dir.join(CONFIG_FILE);
    Config::load(&path).unwrap_or_else(|e| {
        tracing::debug!("Failed to load config: {e}");
        Config::default()
    })
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("No document at {}", path.display());
            return Ok(None);
        }
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Write `value` next to `path` and move it into place.
fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let write_error = |source: io::Error| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    let content = serde_json::to_string_pretty(value).map_err(|e| write_error(e.into()))?;
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, content).map_err(write_error)?;
    fs::rename(&staging, path).map_err(write_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use non_empty_string::NonEmptyString;
    use tempfile::tempdir;

    use super::*;
    use crate::domain::{
        compliance::ComplianceStatus,
        project::{ProjectMode, ShutterType},
        stats::project_stats,
    };

    fn name(s: &str) -> NonEmptyString {
        NonEmptyString::new(s.to_string()).unwrap()
    }

    fn new_project(store: &mut Store, project_name: &str) -> Id {
        store
            .create_project(NewProject {
                name: name(project_name),
                mode: ProjectMode::Smoke,
                city: Some("Lyon".to_string()),
                start_date: None,
                end_date: None,
            })
            .id
            .clone()
    }

    fn new_zone(store: &mut Store, project: &Id) -> (Id, Id) {
        let building = store
            .create_building(
                project.as_str(),
                NewBuilding {
                    name: name("Bâtiment A"),
                    description: None,
                },
            )
            .unwrap()
            .id
            .clone();
        let zone = store
            .create_zone(
                building.as_str(),
                NewZone {
                    name: name("ZF 1"),
                    description: None,
                },
            )
            .unwrap()
            .id
            .clone();
        (building, zone)
    }

    fn new_shutter(store: &mut Store, zone: &Id, reference: f64, measured: f64) -> Id {
        store
            .create_shutter(
                zone.as_str(),
                NewShutter {
                    name: name("VH-01"),
                    kind: ShutterType::High,
                    reference_flow: reference,
                    measured_flow: measured,
                    remarks: None,
                },
            )
            .unwrap()
            .id
            .clone()
    }

    #[test]
    fn empty_workspace_opens_empty() {
        let tmp = tempdir().unwrap();
        let store = Store::open(tmp.path().to_path_buf()).unwrap();
        assert!(store.projects().is_empty());
        assert!(store.history().is_empty());
        assert_eq!(store.config(), &Config::default());
    }

    #[test]
    fn records_survive_a_flush() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();

        let mut store = Store::open(root.clone()).unwrap();
        let project = new_project(&mut store, "Tour A");
        let (_, zone) = new_zone(&mut store, &project);
        new_shutter(&mut store, &zone, 100.0, 105.0);
        new_shutter(&mut store, &zone, 100.0, 130.0);
        store.favorites_mut().projects.insert(project.clone());
        store.record_calculation(FlowReading::new(100.0, 115.0).unwrap());
        store.flush().unwrap();

        let store = Store::open(root).unwrap();
        let reloaded = store.project(project.as_str()).unwrap();
        let stats = project_stats(reloaded);
        assert_eq!(stats.shutter_count, 2);
        assert_eq!(stats.compliant_count, 1);
        assert_eq!(stats.compliance_rate, 50.0);
        assert!(store.favorites().projects.contains(project.as_str()));
        let entry = store.history().entries().next().unwrap();
        assert_eq!(entry.status, ComplianceStatus::Acceptable);
    }

    #[test]
    fn legacy_documents_are_loaded() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join(STORE_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(PROJECTS_FILE),
            r#"[{"id": "p1", "name": "Ancien", "buildings": [{"id": "b1", "name": "B"}]}]"#,
        )
        .unwrap();

        let store = Store::open(tmp.path().to_path_buf()).unwrap();
        let (project, building) = store.building("b1").unwrap();
        assert_eq!(project.mode, ProjectMode::Smoke);
        assert!(building.compartment_zones.is_empty());
    }

    #[test]
    fn malformed_document_is_an_error() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join(STORE_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(PROJECTS_FILE), "{ not json").unwrap();

        let error = Store::open(tmp.path().to_path_buf()).unwrap_err();
        assert!(matches!(error, StoreError::Parse { .. }));
    }

    #[test]
    fn creating_under_a_missing_parent_fails() {
        let tmp = tempdir().unwrap();
        let mut store = Store::open(tmp.path().to_path_buf()).unwrap();

        let error = store
            .create_zone(
                "nope",
                NewZone {
                    name: name("ZF"),
                    description: None,
                },
            )
            .unwrap_err();
        assert!(matches!(error, StoreError::NotFound { kind: "building", .. }));
    }

    #[test]
    fn invalid_readings_are_rejected() {
        let tmp = tempdir().unwrap();
        let mut store = Store::open(tmp.path().to_path_buf()).unwrap();
        let project = new_project(&mut store, "P");
        let (_, zone) = new_zone(&mut store, &project);

        let error = store
            .create_shutter(
                zone.as_str(),
                NewShutter {
                    name: name("VH"),
                    kind: ShutterType::High,
                    reference_flow: 0.0,
                    measured_flow: 10.0,
                    remarks: None,
                },
            )
            .unwrap_err();
        assert!(matches!(error, StoreError::InvalidFlow(InvalidFlow::ZeroReference)));

        let shutter = new_shutter(&mut store, &zone, 100.0, 100.0);
        let error = store
            .update_shutter(
                shutter.as_str(),
                ShutterUpdate {
                    measured_flow: Some(-5.0),
                    ..ShutterUpdate::default()
                },
            )
            .unwrap_err();
        assert!(matches!(error, StoreError::InvalidFlow(InvalidFlow::Negative(_))));
        assert_eq!(store.shutter(shutter.as_str()).unwrap().measured_flow, 100.0);
    }

    #[test]
    fn legacy_shutter_without_reference_can_be_annotated() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join(STORE_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(PROJECTS_FILE),
            r#"[{"id": "p1", "buildings": [{"id": "b1", "functionalZones": [{
                "id": "z1",
                "shutters": [{"id": "s1", "name": "VH-01", "measuredFlow": 90}]
            }]}]}]"#,
        )
        .unwrap();
        let mut store = Store::open(tmp.path().to_path_buf()).unwrap();

        let updated = store
            .update_shutter(
                "s1",
                ShutterUpdate {
                    name: Some(name("VH-01 bis")),
                    remarks: Some(Some("Débit de référence à relever".to_string())),
                    ..ShutterUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "VH-01 bis");
        assert_eq!(updated.compliance().deviation, None);

        let error = store
            .update_shutter(
                "s1",
                ShutterUpdate {
                    measured_flow: Some(95.0),
                    ..ShutterUpdate::default()
                },
            )
            .unwrap_err();
        assert!(matches!(error, StoreError::InvalidFlow(InvalidFlow::ZeroReference)));

        let fixed = store
            .update_shutter(
                "s1",
                ShutterUpdate {
                    reference_flow: Some(100.0),
                    ..ShutterUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(fixed.compliance().deviation, Some(-10.0));
    }

    #[test]
    fn updates_reach_the_record() {
        let tmp = tempdir().unwrap();
        let mut store = Store::open(tmp.path().to_path_buf()).unwrap();
        let project = new_project(&mut store, "P");
        let (building, zone) = new_zone(&mut store, &project);
        let shutter = new_shutter(&mut store, &zone, 100.0, 100.0);

        store
            .update_project(
                project.as_str(),
                ProjectUpdate {
                    mode: Some(ProjectMode::Complete),
                    ..ProjectUpdate::default()
                },
            )
            .unwrap();
        store
            .update_building(
                building.as_str(),
                BuildingUpdate {
                    description: Some(Some("Aile nord".to_string())),
                    ..BuildingUpdate::default()
                },
            )
            .unwrap();
        store
            .update_zone(
                zone.as_str(),
                ZoneUpdate {
                    name: Some(name("ZF Hall")),
                    ..ZoneUpdate::default()
                },
            )
            .unwrap();
        let updated = store
            .update_shutter(
                shutter.as_str(),
                ShutterUpdate {
                    measured_flow: Some(125.0),
                    ..ShutterUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.compliance().status, ComplianceStatus::NonCompliant);

        let p = store.project(project.as_str()).unwrap();
        assert_eq!(p.mode, ProjectMode::Complete);
        assert_eq!(p.buildings[0].description.as_deref(), Some("Aile nord"));
        assert_eq!(p.buildings[0].functional_zones[0].name, "ZF Hall");
    }

    #[test]
    fn deleting_a_shutter_forgets_its_favorite() {
        let tmp = tempdir().unwrap();
        let mut store = Store::open(tmp.path().to_path_buf()).unwrap();
        let project = new_project(&mut store, "P");
        let (_, zone) = new_zone(&mut store, &project);
        let shutter = new_shutter(&mut store, &zone, 100.0, 100.0);
        store.favorites_mut().shutters.insert(shutter.clone());

        assert!(store.delete_shutter(shutter.as_str()));
        assert!(!store.favorites().shutters.contains(shutter.as_str()));
        assert!(!store.delete_shutter(shutter.as_str()));
    }

    #[test]
    fn deleting_a_project_forgets_nested_favorites() {
        let tmp = tempdir().unwrap();
        let mut store = Store::open(tmp.path().to_path_buf()).unwrap();
        let project = new_project(&mut store, "P");
        let (building, zone) = new_zone(&mut store, &project);
        let shutter = new_shutter(&mut store, &zone, 100.0, 100.0);
        let favorites = store.favorites_mut();
        favorites.projects.insert(project.clone());
        favorites.buildings.insert(building);
        favorites.zones.insert(zone);
        favorites.shutters.insert(shutter);

        assert!(store.delete_project(project.as_str()));
        assert_eq!(store.favorites(), &Favorites::default());
        assert!(!store.delete_project(project.as_str()));
    }

    #[test]
    fn compartment_zones_are_managed_separately() {
        let tmp = tempdir().unwrap();
        let mut store = Store::open(tmp.path().to_path_buf()).unwrap();
        let project = new_project(&mut store, "P");
        let (building, _) = new_zone(&mut store, &project);

        let zone = store
            .create_compartment_zone(
                building.as_str(),
                NewZone {
                    name: name("ZC 1"),
                    description: None,
                },
            )
            .unwrap()
            .id
            .clone();
        assert!(!store.delete_zone(zone.as_str()));
        assert!(store.delete_compartment_zone(zone.as_str()));

        let (_, b) = store.building(building.as_str()).unwrap();
        assert!(b.compartment_zones.is_empty());
        assert_eq!(b.functional_zones.len(), 1);
    }

    #[test]
    fn search_and_info_cover_every_project() {
        let tmp = tempdir().unwrap();
        let mut store = Store::open(tmp.path().to_path_buf()).unwrap();
        for project_name in ["Tour A", "Tour Bleue"] {
            let project = new_project(&mut store, project_name);
            let (_, zone) = new_zone(&mut store, &project);
            new_shutter(&mut store, &zone, 100.0, 100.0);
        }

        assert_eq!(store.search_shutters("tour vh").len(), 2);
        assert_eq!(store.search_shutters("tour bleue").len(), 1);
        // "b" alone also matches "Bâtiment A" in both projects
        assert_eq!(store.search_shutters("tour b").len(), 2);

        let info = store.storage_info().unwrap();
        assert_eq!(info.project_count, 2);
        assert_eq!(info.shutter_count, 2);
        assert!(info.storage_size.ends_with(" KB"));
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn storage_size_counts_the_bare_project_array() {
        let tmp = tempdir().unwrap();
        let mut store = Store::open(tmp.path().to_path_buf()).unwrap();
        assert_eq!(store.storage_info().unwrap().storage_size, "0.00 KB");

        new_project(&mut store, "Tour A");
        let docs: Vec<ProjectDoc> = store.projects().iter().map(ProjectDoc::from).collect();
        let expected = serde_json::to_string(&docs).unwrap().len();
        let expected = format!("{:.2} KB", expected as f64 / 1024.0);
        assert_eq!(store.storage_info().unwrap().storage_size, expected);
    }

    #[test]
    fn clear_all_removes_documents() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        let mut store = Store::open(root.clone()).unwrap();
        new_project(&mut store, "P");
        store.record_calculation(FlowReading::new(1.0, 1.0).unwrap());
        store.flush().unwrap();

        store.clear_all().unwrap();
        assert!(store.projects().is_empty());
        assert!(!root.join(STORE_DIR).join(PROJECTS_FILE).exists());

        let store = Store::open(root).unwrap();
        assert!(store.projects().is_empty());
        assert!(store.history().is_empty());
    }

    #[test]
    fn history_limit_comes_from_config() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        fs::create_dir_all(root.join(STORE_DIR)).unwrap();
        let mut config = Config::default();
        config.set_history_limit(2);
        config.save(&config_path(&root)).unwrap();

        let mut store = Store::open(root).unwrap();
        for measured in [1.0, 2.0, 3.0] {
            store.record_calculation(FlowReading::new(1.0, measured).unwrap());
        }
        assert_eq!(store.history().len(), 2);
    }
}
