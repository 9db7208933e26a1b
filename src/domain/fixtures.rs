//! Terse constructors for record trees used across the test suites.

use chrono::Utc;

use crate::domain::project::{
    Building, CompartmentZone, FunctionalZone, Id, Project, ProjectMode, Shutter, ShutterType,
};

pub fn shutter(id: &str, reference_flow: f64, measured_flow: f64) -> Shutter {
    let now = Utc::now();
    Shutter {
        id: Id::from(id),
        zone_id: Id::from("zone"),
        name: format!("Volet {id}"),
        kind: ShutterType::High,
        reference_flow,
        measured_flow,
        remarks: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn zone(id: &str, shutters: Vec<Shutter>) -> FunctionalZone {
    FunctionalZone {
        id: Id::from(id),
        building_id: Id::from("building"),
        name: format!("ZF {id}"),
        description: None,
        created_at: Utc::now(),
        shutters,
    }
}

pub fn compartment_zone(id: &str) -> CompartmentZone {
    CompartmentZone {
        id: Id::from(id),
        building_id: Id::from("building"),
        name: format!("ZC {id}"),
        description: None,
        created_at: Utc::now(),
        devices: Vec::new(),
    }
}

pub fn building(id: &str, zones: Vec<FunctionalZone>) -> Building {
    Building {
        id: Id::from(id),
        project_id: Id::from("project"),
        name: format!("Bâtiment {id}"),
        description: None,
        created_at: Utc::now(),
        functional_zones: zones,
        compartment_zones: Vec::new(),
    }
}

pub fn project(id: &str, buildings: Vec<Building>) -> Project {
    let now = Utc::now();
    Project {
        id: Id::from(id),
        name: format!("Projet {id}"),
        mode: ProjectMode::Smoke,
        city: None,
        start_date: None,
        end_date: None,
        created_at: now,
        updated_at: now,
        buildings,
    }
}
