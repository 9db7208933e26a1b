//! Domain models for shutter airflow inspections.
//!
//! This module contains the record tree, the compliance rule applied to each
//! shutter, and the roll-ups computed over the tree.

/// Compliance classification of a single reading.
pub mod compliance;
pub use compliance::{evaluate, ComplianceResult, ComplianceStatus, FlowReading, InvalidFlow};

mod config;
pub use config::{Config, ConfigError};

/// Favourite identifiers per level of the tree.
pub mod favorites;
pub use favorites::{FavoriteKind, FavoriteSet, Favorites};

/// Bounded log of quick calculations.
pub mod history;
pub use history::{History, HistoryEntry};

/// The record tree.
pub mod project;
pub use project::{
    Building, CompartmentZone, DeviceType, Entity, FunctionalZone, Id, Project, ProjectMode,
    SafetyDevice, Shutter, ShutterType, Timestamped,
};

/// Free-text shutter search.
pub mod search;
pub use search::{search_shutters, SearchHit};

/// Compliance roll-ups and display ordering.
pub mod stats;
pub use stats::{AggregateStats, SecondaryKey, ZoneSelection, ZoneTab};

/// Typed creation and update inputs.
pub mod update;

#[cfg(test)]
pub(crate) mod fixtures;
