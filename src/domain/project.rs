//! The inspection record tree: projects own buildings, buildings own zones,
//! zones own shutters.
//!
//! These are the fully-typed, normalised in-memory shapes. Tolerance for
//! partially-hydrated data lives at the storage boundary, so every list here
//! is always present (possibly empty) and every project has a mode.

use std::{borrow::Borrow, convert::Infallible, fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::compliance::{self, ComplianceResult};

/// An opaque entity identifier.
///
/// Identifiers loaded from storage are kept as-is, whatever their shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    /// Generate a fresh, random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl FromStr for Id {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl Borrow<str> for Id {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Anything with an identifier.
pub trait Entity {
    /// The entity's identifier.
    fn id(&self) -> &Id;
}

/// Entities that record when they were last modified.
pub trait Timestamped {
    /// When the entity was last modified.
    fn updated_at(&self) -> DateTime<Utc>;
}

/// Error returned when parsing an unknown enumeration value.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}', expected one of: {expected}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

/// Which kinds of zones a project inspects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectMode {
    /// Smoke control only: functional zones with shutters.
    #[default]
    Smoke,
    /// Compartmentation only: compartment zones with fire doors and dampers.
    Compartment,
    /// Both smoke control and compartmentation.
    Complete,
}

impl ProjectMode {
    /// The serialised identifier of this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Smoke => "smoke",
            Self::Compartment => "compartment",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for ProjectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectMode {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "smoke" => Ok(Self::Smoke),
            "compartment" => Ok(Self::Compartment),
            "complete" => Ok(Self::Complete),
            _ => Err(UnknownVariant {
                kind: "project mode",
                value: s.to_string(),
                expected: "smoke, compartment, complete",
            }),
        }
    }
}

/// Position of a shutter in the shaft.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShutterType {
    /// High shutter (extraction).
    #[default]
    High,
    /// Low shutter (supply).
    Low,
}

impl ShutterType {
    /// Short display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "VH",
            Self::Low => "VB",
        }
    }
}

impl FromStr for ShutterType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" | "vh" => Ok(Self::High),
            "low" | "vb" => Ok(Self::Low),
            _ => Err(UnknownVariant {
                kind: "shutter type",
                value: s.to_string(),
                expected: "high, low",
            }),
        }
    }
}

/// Kind of fire-safety device in a compartment zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    /// Fire door (PCF).
    #[default]
    Door,
    /// Fire damper (CCF).
    Damper,
}

impl DeviceType {
    /// Short display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Door => "PCF",
            Self::Damper => "CCF",
        }
    }
}

impl FromStr for DeviceType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "door" | "pcf" => Ok(Self::Door),
            "damper" | "ccf" => Ok(Self::Damper),
            _ => Err(UnknownVariant {
                kind: "device type",
                value: s.to_string(),
                expected: "door, damper",
            }),
        }
    }
}

/// An inspection project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    /// Identifier.
    pub id: Id,
    /// Display name.
    pub name: String,
    /// Which kinds of zones are inspected.
    pub mode: ProjectMode,
    /// City the site is in.
    pub city: Option<String>,
    /// Planned start of the inspection.
    pub start_date: Option<NaiveDate>,
    /// Planned end of the inspection.
    pub end_date: Option<NaiveDate>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Buildings on the site, in insertion order.
    pub buildings: Vec<Building>,
}

impl Project {
    /// Iterate over every shutter in the project, in tree order.
    pub fn shutters(&self) -> impl Iterator<Item = &Shutter> {
        self.buildings.iter().flat_map(Building::shutters)
    }

    /// Find a building by identifier.
    #[must_use]
    pub fn building(&self, id: &str) -> Option<&Building> {
        self.buildings.iter().find(|b| b.id.as_str() == id)
    }
}

/// A building within a project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Building {
    /// Identifier.
    pub id: Id,
    /// Owning project.
    pub project_id: Id,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Smoke-control zones.
    pub functional_zones: Vec<FunctionalZone>,
    /// Compartmentation zones.
    pub compartment_zones: Vec<CompartmentZone>,
}

impl Building {
    /// Iterate over every shutter in the building, in tree order.
    pub fn shutters(&self) -> impl Iterator<Item = &Shutter> {
        self.functional_zones.iter().flat_map(|z| z.shutters.iter())
    }
}

/// A smoke-control zone, holding shutters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionalZone {
    /// Identifier.
    pub id: Id,
    /// Owning building.
    pub building_id: Id,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Shutters in the zone.
    pub shutters: Vec<Shutter>,
}

/// A ventilation shutter, the unit that is measured.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shutter {
    /// Identifier.
    pub id: Id,
    /// Owning zone.
    pub zone_id: Id,
    /// Display name.
    pub name: String,
    /// High or low shutter.
    #[serde(rename = "type")]
    pub kind: ShutterType,
    /// Design flow.
    pub reference_flow: f64,
    /// Flow measured on site.
    pub measured_flow: f64,
    /// Inspector's remarks.
    pub remarks: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Shutter {
    /// Evaluate this shutter's reading.
    #[must_use]
    pub fn compliance(&self) -> ComplianceResult {
        compliance::evaluate(self.reference_flow, self.measured_flow)
    }
}

/// A compartmentation zone, holding fire-safety devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompartmentZone {
    /// Identifier.
    pub id: Id,
    /// Owning building.
    pub building_id: Id,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Devices in the zone.
    pub devices: Vec<SafetyDevice>,
}

/// A fire door or fire damper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SafetyDevice {
    /// Identifier.
    pub id: Id,
    /// Owning compartment zone.
    pub zone_id: Id,
    /// Display name.
    pub name: String,
    /// Door or damper.
    #[serde(rename = "type")]
    pub kind: DeviceType,
    /// Inspector's remarks.
    pub remarks: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

macro_rules! impl_entity {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Entity for $ty {
                fn id(&self) -> &Id {
                    &self.id
                }
            }
        )*
    };
}

impl_entity!(
    Project,
    Building,
    FunctionalZone,
    CompartmentZone,
    Shutter,
    SafetyDevice
);

impl Timestamped for Project {
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Timestamped for Shutter {
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Timestamped for SafetyDevice {
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl<T: Entity + ?Sized> Entity for &T {
    fn id(&self) -> &Id {
        (**self).id()
    }
}

impl<T: Timestamped + ?Sized> Timestamped for &T {
    fn updated_at(&self) -> DateTime<Utc> {
        (**self).updated_at()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(Id::generate(), Id::generate());
    }

    #[test]
    fn mode_parsing_is_case_insensitive() {
        assert_eq!("Complete".parse::<ProjectMode>(), Ok(ProjectMode::Complete));
        assert!("simple".parse::<ProjectMode>().is_err());
    }

    #[test]
    fn shutter_type_accepts_short_labels() {
        assert_eq!("VB".parse::<ShutterType>(), Ok(ShutterType::Low));
        assert_eq!("high".parse::<ShutterType>(), Ok(ShutterType::High));
    }

    #[test]
    fn device_type_accepts_short_labels() {
        assert_eq!("ccf".parse::<DeviceType>(), Ok(DeviceType::Damper));
        assert_eq!(DeviceType::Door.label(), "PCF");
    }

    #[test]
    fn id_borrows_as_str() {
        let set: std::collections::HashSet<Id> = [Id::from("a")].into();
        assert!(set.contains("a"));
    }
}
