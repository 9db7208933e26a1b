//! Airflow compliance records for ventilation shutter inspections.
//!
//! Projects are organised as a tree of buildings, zones and shutters. Each
//! shutter carries a reference and a measured flow, from which a compliance
//! status is derived and rolled up into per-zone, per-building and
//! per-project statistics.

pub mod domain;
pub use domain::{
    evaluate, AggregateStats, ComplianceResult, ComplianceStatus, Config, Favorites, Id, Project,
};

/// JSON document storage for the record tree, favourites and history.
pub mod storage;
pub use storage::{Store, StoreError};
