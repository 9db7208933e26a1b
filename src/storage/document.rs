//! On-disk JSON shapes and their normalisation into the domain tree.
//!
//! Documents written by older versions of the application are accepted: a
//! bare top-level array instead of a versioned object, projects with no
//! `mode`, buildings with no `compartmentZones`, and records with missing or
//! malformed timestamps. All of this is resolved here, once, on load.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    favorites::{FavoriteSet, Favorites},
    history::HistoryEntry,
    project::{
        Building, CompartmentZone, DeviceType, FunctionalZone, Id, Project, ProjectMode,
        SafetyDevice, Shutter, ShutterType,
    },
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a stored timestamp, falling back to `now`.
fn timestamp(value: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    match value.map(DateTime::parse_from_rfc3339) {
        Some(Ok(parsed)) => parsed.with_timezone(&Utc),
        Some(Err(e)) => {
            tracing::warn!("Replacing malformed timestamp {value:?}: {e}");
            now
        }
        None => now,
    }
}

/// Parse a stored calendar date.
///
/// Accepts a plain `YYYY-MM-DD` date or a full RFC 3339 timestamp.
fn date(value: Option<&str>) -> Option<NaiveDate> {
    let value = value?;
    if let Ok(date) = NaiveDate::parse_from_str(value, DATE_FORMAT) {
        return Some(date);
    }
    match DateTime::parse_from_rfc3339(value) {
        Ok(parsed) => Some(parsed.date_naive()),
        Err(e) => {
            tracing::warn!("Dropping malformed date {value:?}: {e}");
            None
        }
    }
}

fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339()
}

fn format_date(value: Option<NaiveDate>) -> Option<String> {
    value.map(|date| date.format(DATE_FORMAT).to_string())
}

/// The projects document.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ProjectsFile {
    Versioned(ProjectsVersions),
    Legacy(Vec<ProjectDoc>),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
pub enum ProjectsVersions {
    #[serde(rename = "1")]
    V1 { projects: Vec<ProjectDoc> },
}

impl ProjectsFile {
    pub fn into_projects(self, now: DateTime<Utc>) -> Vec<Project> {
        let docs = match self {
            Self::Versioned(ProjectsVersions::V1 { projects }) => projects,
            Self::Legacy(projects) => {
                tracing::debug!("Migrating legacy projects document");
                projects
            }
        };
        docs.into_iter().map(|doc| doc.normalise(now)).collect()
    }
}

impl ProjectsVersions {
    pub fn from_projects(projects: &[Project]) -> Self {
        Self::V1 {
            projects: projects.iter().map(ProjectDoc::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDoc {
    id: Id,
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mode: Option<ProjectMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_date: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    buildings: Vec<BuildingDoc>,
}

impl ProjectDoc {
    fn normalise(self, now: DateTime<Utc>) -> Project {
        let created_at = timestamp(self.created_at.as_deref(), now);
        let buildings = self
            .buildings
            .into_iter()
            .map(|b| b.normalise(&self.id, now))
            .collect();
        Project {
            name: self.name,
            mode: self.mode.unwrap_or_default(),
            city: self.city,
            start_date: date(self.start_date.as_deref()),
            end_date: date(self.end_date.as_deref()),
            created_at,
            updated_at: timestamp(self.updated_at.as_deref(), created_at),
            buildings,
            id: self.id,
        }
    }
}

impl From<&Project> for ProjectDoc {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            name: project.name.clone(),
            mode: Some(project.mode),
            city: project.city.clone(),
            start_date: format_date(project.start_date),
            end_date: format_date(project.end_date),
            created_at: Some(format_timestamp(project.created_at)),
            updated_at: Some(format_timestamp(project.updated_at)),
            buildings: project.buildings.iter().map(BuildingDoc::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildingDoc {
    id: Id,
    #[serde(default)]
    project_id: Option<Id>,
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    functional_zones: Vec<ZoneDoc>,
    #[serde(default)]
    compartment_zones: Vec<CompartmentZoneDoc>,
}

impl BuildingDoc {
    fn normalise(self, project_id: &Id, now: DateTime<Utc>) -> Building {
        let functional_zones = self
            .functional_zones
            .into_iter()
            .map(|z| z.normalise(&self.id, now))
            .collect();
        let compartment_zones = self
            .compartment_zones
            .into_iter()
            .map(|z| z.normalise(&self.id, now))
            .collect();
        Building {
            project_id: self.project_id.unwrap_or_else(|| project_id.clone()),
            name: self.name,
            description: self.description,
            created_at: timestamp(self.created_at.as_deref(), now),
            functional_zones,
            compartment_zones,
            id: self.id,
        }
    }
}

impl From<&Building> for BuildingDoc {
    fn from(building: &Building) -> Self {
        Self {
            id: building.id.clone(),
            project_id: Some(building.project_id.clone()),
            name: building.name.clone(),
            description: building.description.clone(),
            created_at: Some(format_timestamp(building.created_at)),
            functional_zones: building.functional_zones.iter().map(ZoneDoc::from).collect(),
            compartment_zones: building
                .compartment_zones
                .iter()
                .map(CompartmentZoneDoc::from)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZoneDoc {
    id: Id,
    #[serde(default)]
    building_id: Option<Id>,
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    shutters: Vec<ShutterDoc>,
}

impl ZoneDoc {
    fn normalise(self, building_id: &Id, now: DateTime<Utc>) -> FunctionalZone {
        let shutters = self
            .shutters
            .into_iter()
            .map(|s| s.normalise(&self.id, now))
            .collect();
        FunctionalZone {
            building_id: self.building_id.unwrap_or_else(|| building_id.clone()),
            name: self.name,
            description: self.description,
            created_at: timestamp(self.created_at.as_deref(), now),
            shutters,
            id: self.id,
        }
    }
}

impl From<&FunctionalZone> for ZoneDoc {
    fn from(zone: &FunctionalZone) -> Self {
        Self {
            id: zone.id.clone(),
            building_id: Some(zone.building_id.clone()),
            name: zone.name.clone(),
            description: zone.description.clone(),
            created_at: Some(format_timestamp(zone.created_at)),
            shutters: zone.shutters.iter().map(ShutterDoc::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShutterDoc {
    id: Id,
    #[serde(default)]
    zone_id: Option<Id>,
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default)]
    kind: ShutterType,
    #[serde(default)]
    reference_flow: f64,
    #[serde(default)]
    measured_flow: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    remarks: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

impl ShutterDoc {
    fn normalise(self, zone_id: &Id, now: DateTime<Utc>) -> Shutter {
        let created_at = timestamp(self.created_at.as_deref(), now);
        Shutter {
            zone_id: self.zone_id.unwrap_or_else(|| zone_id.clone()),
            name: self.name,
            kind: self.kind,
            reference_flow: self.reference_flow,
            measured_flow: self.measured_flow,
            remarks: self.remarks,
            created_at,
            updated_at: timestamp(self.updated_at.as_deref(), created_at),
            id: self.id,
        }
    }
}

impl From<&Shutter> for ShutterDoc {
    fn from(shutter: &Shutter) -> Self {
        Self {
            id: shutter.id.clone(),
            zone_id: Some(shutter.zone_id.clone()),
            name: shutter.name.clone(),
            kind: shutter.kind,
            reference_flow: shutter.reference_flow,
            measured_flow: shutter.measured_flow,
            remarks: shutter.remarks.clone(),
            created_at: Some(format_timestamp(shutter.created_at)),
            updated_at: Some(format_timestamp(shutter.updated_at)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompartmentZoneDoc {
    id: Id,
    #[serde(default)]
    building_id: Option<Id>,
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    devices: Vec<DeviceDoc>,
}

impl CompartmentZoneDoc {
    fn normalise(self, building_id: &Id, now: DateTime<Utc>) -> CompartmentZone {
        let devices = self
            .devices
            .into_iter()
            .map(|d| d.normalise(&self.id, now))
            .collect();
        CompartmentZone {
            building_id: self.building_id.unwrap_or_else(|| building_id.clone()),
            name: self.name,
            description: self.description,
            created_at: timestamp(self.created_at.as_deref(), now),
            devices,
            id: self.id,
        }
    }
}

impl From<&CompartmentZone> for CompartmentZoneDoc {
    fn from(zone: &CompartmentZone) -> Self {
        Self {
            id: zone.id.clone(),
            building_id: Some(zone.building_id.clone()),
            name: zone.name.clone(),
            description: zone.description.clone(),
            created_at: Some(format_timestamp(zone.created_at)),
            devices: zone.devices.iter().map(DeviceDoc::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceDoc {
    id: Id,
    #[serde(default)]
    zone_id: Option<Id>,
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default)]
    kind: DeviceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    remarks: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

impl DeviceDoc {
    fn normalise(self, zone_id: &Id, now: DateTime<Utc>) -> SafetyDevice {
        let created_at = timestamp(self.created_at.as_deref(), now);
        SafetyDevice {
            zone_id: self.zone_id.unwrap_or_else(|| zone_id.clone()),
            name: self.name,
            kind: self.kind,
            remarks: self.remarks,
            created_at,
            updated_at: timestamp(self.updated_at.as_deref(), created_at),
            id: self.id,
        }
    }
}

impl From<&SafetyDevice> for DeviceDoc {
    fn from(device: &SafetyDevice) -> Self {
        Self {
            id: device.id.clone(),
            zone_id: Some(device.zone_id.clone()),
            name: device.name.clone(),
            kind: device.kind,
            remarks: device.remarks.clone(),
            created_at: Some(format_timestamp(device.created_at)),
            updated_at: Some(format_timestamp(device.updated_at)),
        }
    }
}

/// The favourites document.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
pub enum FavoritesVersions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        projects: FavoriteSet,
        #[serde(default)]
        buildings: FavoriteSet,
        #[serde(default)]
        zones: FavoriteSet,
        #[serde(default)]
        shutters: FavoriteSet,
    },
}

impl From<FavoritesVersions> for Favorites {
    fn from(versions: FavoritesVersions) -> Self {
        match versions {
            FavoritesVersions::V1 {
                projects,
                buildings,
                zones,
                shutters,
            } => Self {
                projects,
                buildings,
                zones,
                shutters,
            },
        }
    }
}

impl From<&Favorites> for FavoritesVersions {
    fn from(favorites: &Favorites) -> Self {
        Self::V1 {
            projects: favorites.projects.clone(),
            buildings: favorites.buildings.clone(),
            zones: favorites.zones.clone(),
            shutters: favorites.shutters.clone(),
        }
    }
}

/// The history document.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum HistoryFile {
    Versioned(HistoryVersions),
    Legacy(Vec<HistoryEntry>),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
pub enum HistoryVersions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        entries: Vec<HistoryEntry>,
    },
}

impl HistoryFile {
    pub fn into_entries(self) -> Vec<HistoryEntry> {
        match self {
            Self::Versioned(HistoryVersions::V1 { entries }) | Self::Legacy(entries) => entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(json: &str) -> Vec<Project> {
        let file: ProjectsFile = serde_json::from_str(json).unwrap();
        file.into_projects(Utc::now())
    }

    #[test]
    fn legacy_array_without_optional_fields_is_normalised() {
        let projects = load(
            r#"[{
                "id": "1712_abc",
                "name": "Tour A",
                "createdAt": "2024-04-10T08:30:00.000Z",
                "buildings": [{
                    "id": "b1",
                    "name": "Bâtiment 1",
                    "functionalZones": [{
                        "id": "z1",
                        "name": "ZF 1",
                        "shutters": [{
                            "id": "s1",
                            "name": "VH-01",
                            "type": "high",
                            "referenceFlow": 100,
                            "measuredFlow": 104
                        }]
                    }]
                }]
            }]"#,
        );

        let project = &projects[0];
        assert_eq!(project.mode, ProjectMode::Smoke);
        assert_eq!(project.id.as_str(), "1712_abc");
        assert_eq!(project.updated_at, project.created_at);

        let building = &project.buildings[0];
        assert_eq!(building.project_id, project.id);
        assert!(building.compartment_zones.is_empty());

        let shutter = &building.functional_zones[0].shutters[0];
        assert_eq!(shutter.zone_id.as_str(), "z1");
        assert_eq!(shutter.compliance().deviation, Some(4.0));
    }

    #[test]
    fn missing_lists_are_empty() {
        let projects = load(r#"[{"id": "p", "buildings": [{"id": "b"}]}]"#);
        let building = &projects[0].buildings[0];
        assert!(building.functional_zones.is_empty());
        assert!(building.compartment_zones.is_empty());
    }

    #[test]
    fn dates_accept_plain_and_full_forms() {
        let projects = load(
            r#"[{"id": "p", "startDate": "2024-05-01", "endDate": "2024-06-30T22:00:00.000Z"}]"#,
        );
        assert_eq!(projects[0].start_date, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(projects[0].end_date, NaiveDate::from_ymd_opt(2024, 6, 30));
    }

    #[test]
    fn malformed_dates_are_dropped() {
        let projects = load(r#"[{"id": "p", "startDate": "next tuesday", "createdAt": "??"}]"#);
        assert_eq!(projects[0].start_date, None);
    }

    #[test]
    fn versioned_document_round_trips_the_tree() {
        let projects = load(
            r#"{"_version": "1", "projects": [{
                "id": "p",
                "name": "Site",
                "mode": "complete",
                "buildings": [{
                    "id": "b",
                    "compartmentZones": [{
                        "id": "c",
                        "devices": [{"id": "d", "type": "damper"}]
                    }]
                }]
            }]}"#,
        );
        assert_eq!(projects[0].mode, ProjectMode::Complete);

        let json = serde_json::to_string(&ProjectsVersions::from_projects(&projects)).unwrap();
        let reloaded = load(&json);
        assert_eq!(reloaded, projects);
        let device = &reloaded[0].buildings[0].compartment_zones[0].devices[0];
        assert_eq!(device.kind, DeviceType::Damper);
        assert_eq!(device.zone_id.as_str(), "c");
    }

    #[test]
    fn favorites_document_tolerates_missing_levels() {
        let versions: FavoritesVersions =
            serde_json::from_str(r#"{"_version": "1", "zones": ["z1"]}"#).unwrap();
        let favorites = Favorites::from(versions);
        assert!(favorites.zones.contains("z1"));
        assert!(favorites.projects.is_empty());
    }

    #[test]
    fn history_document_accepts_legacy_array() {
        let file: HistoryFile = serde_json::from_str(
            r##"[{
                "id": "h1",
                "referenceFlow": 100,
                "measuredFlow": 90,
                "deviation": -10,
                "status": "compliant",
                "color": "#10B981",
                "timestamp": "2024-04-10T08:30:00.000Z"
            }]"##,
        )
        .unwrap();
        let entries = file.into_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].deviation, -10.0);
    }
}
