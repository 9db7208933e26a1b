//! Typed inputs for creating and editing records.
//!
//! Creation inputs carry every user-supplied field; the store fills in
//! identifiers, ownership and timestamps. Update inputs carry only the fields
//! being changed. A clearable optional field is `Option<Option<T>>`: `None`
//! leaves it alone, `Some(None)` clears it.

use chrono::{DateTime, NaiveDate, Utc};
use non_empty_string::NonEmptyString;

use crate::domain::project::{
    Building, CompartmentZone, FunctionalZone, Id, Project, ProjectMode, Shutter, ShutterType,
};

/// Fields for a new project.
#[derive(Debug, Clone)]
pub struct NewProject {
    /// Display name.
    pub name: NonEmptyString,
    /// Inspection mode.
    pub mode: ProjectMode,
    /// City.
    pub city: Option<String>,
    /// Planned start.
    pub start_date: Option<NaiveDate>,
    /// Planned end.
    pub end_date: Option<NaiveDate>,
}

impl NewProject {
    pub(crate) fn build(self, now: DateTime<Utc>) -> Project {
        Project {
            id: Id::generate(),
            name: self.name.as_str().to_owned(),
            mode: self.mode,
            city: self.city,
            start_date: self.start_date,
            end_date: self.end_date,
            created_at: now,
            updated_at: now,
            buildings: Vec::new(),
        }
    }
}

/// Fields for a new building.
#[derive(Debug, Clone)]
pub struct NewBuilding {
    /// Display name.
    pub name: NonEmptyString,
    /// Description.
    pub description: Option<String>,
}

impl NewBuilding {
    pub(crate) fn build(self, project_id: Id, now: DateTime<Utc>) -> Building {
        Building {
            id: Id::generate(),
            project_id,
            name: self.name.as_str().to_owned(),
            description: self.description,
            created_at: now,
            functional_zones: Vec::new(),
            compartment_zones: Vec::new(),
        }
    }
}

/// Fields for a new functional or compartment zone.
#[derive(Debug, Clone)]
pub struct NewZone {
    /// Display name.
    pub name: NonEmptyString,
    /// Description.
    pub description: Option<String>,
}

impl NewZone {
    pub(crate) fn build_functional(self, building_id: Id, now: DateTime<Utc>) -> FunctionalZone {
        FunctionalZone {
            id: Id::generate(),
            building_id,
            name: self.name.as_str().to_owned(),
            description: self.description,
            created_at: now,
            shutters: Vec::new(),
        }
    }

    pub(crate) fn build_compartment(self, building_id: Id, now: DateTime<Utc>) -> CompartmentZone {
        CompartmentZone {
            id: Id::generate(),
            building_id,
            name: self.name.as_str().to_owned(),
            description: self.description,
            created_at: now,
            devices: Vec::new(),
        }
    }
}

/// Fields for a new shutter.
#[derive(Debug, Clone)]
pub struct NewShutter {
    /// Display name.
    pub name: NonEmptyString,
    /// High or low.
    pub kind: ShutterType,
    /// Design flow.
    pub reference_flow: f64,
    /// Measured flow.
    pub measured_flow: f64,
    /// Remarks.
    pub remarks: Option<String>,
}

impl NewShutter {
    pub(crate) fn build(self, zone_id: Id, now: DateTime<Utc>) -> Shutter {
        Shutter {
            id: Id::generate(),
            zone_id,
            name: self.name.as_str().to_owned(),
            kind: self.kind,
            reference_flow: self.reference_flow,
            measured_flow: self.measured_flow,
            remarks: self.remarks,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Changes to a project.
#[derive(Debug, Clone, Default)]
#[allow(clippy::option_option)]
pub struct ProjectUpdate {
    /// New name.
    pub name: Option<NonEmptyString>,
    /// New mode.
    pub mode: Option<ProjectMode>,
    /// New city, or `Some(None)` to clear it.
    pub city: Option<Option<String>>,
    /// New start date, or `Some(None)` to clear it.
    pub start_date: Option<Option<NaiveDate>>,
    /// New end date, or `Some(None)` to clear it.
    pub end_date: Option<Option<NaiveDate>>,
}

impl ProjectUpdate {
    /// Apply the changes and bump `updated_at`.
    pub fn apply(self, project: &mut Project, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            project.name = name.as_str().to_owned();
        }
        if let Some(mode) = self.mode {
            project.mode = mode;
        }
        if let Some(city) = self.city {
            project.city = city;
        }
        if let Some(start_date) = self.start_date {
            project.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            project.end_date = end_date;
        }
        project.updated_at = now;
    }
}

/// Changes to a building.
#[derive(Debug, Clone, Default)]
#[allow(clippy::option_option)]
pub struct BuildingUpdate {
    /// New name.
    pub name: Option<NonEmptyString>,
    /// New description, or `Some(None)` to clear it.
    pub description: Option<Option<String>>,
}

impl BuildingUpdate {
    /// Apply the changes.
    pub fn apply(self, building: &mut Building) {
        if let Some(name) = self.name {
            building.name = name.as_str().to_owned();
        }
        if let Some(description) = self.description {
            building.description = description;
        }
    }
}

/// Changes to a functional zone.
#[derive(Debug, Clone, Default)]
#[allow(clippy::option_option)]
pub struct ZoneUpdate {
    /// New name.
    pub name: Option<NonEmptyString>,
    /// New description, or `Some(None)` to clear it.
    pub description: Option<Option<String>>,
}

impl ZoneUpdate {
    /// Apply the changes.
    pub fn apply(self, zone: &mut FunctionalZone) {
        if let Some(name) = self.name {
            zone.name = name.as_str().to_owned();
        }
        if let Some(description) = self.description {
            zone.description = description;
        }
    }
}

/// Changes to a shutter.
#[derive(Debug, Clone, Default)]
#[allow(clippy::option_option)]
pub struct ShutterUpdate {
    /// New name.
    pub name: Option<NonEmptyString>,
    /// New type.
    pub kind: Option<ShutterType>,
    /// New design flow.
    pub reference_flow: Option<f64>,
    /// New measured flow.
    pub measured_flow: Option<f64>,
    /// New remarks, or `Some(None)` to clear them.
    pub remarks: Option<Option<String>>,
}

impl ShutterUpdate {
    /// Apply the changes and bump `updated_at`.
    pub fn apply(self, shutter: &mut Shutter, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            shutter.name = name.as_str().to_owned();
        }
        if let Some(kind) = self.kind {
            shutter.kind = kind;
        }
        if let Some(reference_flow) = self.reference_flow {
            shutter.reference_flow = reference_flow;
        }
        if let Some(measured_flow) = self.measured_flow {
            shutter.measured_flow = measured_flow;
        }
        if let Some(remarks) = self.remarks {
            shutter.remarks = remarks;
        }
        shutter.updated_at = now;
    }
}
