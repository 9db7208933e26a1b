//! Free-text shutter search.

use serde::Serialize;

use crate::domain::project::{Building, FunctionalZone, Project, Shutter};

/// A matching shutter together with its ancestors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchHit<'a> {
    /// The matching shutter.
    pub shutter: &'a Shutter,
    /// The zone it belongs to.
    pub zone: &'a FunctionalZone,
    /// The building it belongs to.
    pub building: &'a Building,
    /// The project it belongs to.
    pub project: &'a Project,
}

impl SearchHit<'_> {
    fn haystack(&self) -> String {
        [
            self.shutter.name.as_str(),
            self.zone.name.as_str(),
            self.building.name.as_str(),
            self.project.name.as_str(),
            self.project.city.as_deref().unwrap_or_default(),
            self.shutter.remarks.as_deref().unwrap_or_default(),
        ]
        .join(" ")
        .to_lowercase()
    }
}

/// Find shutters matching every word of `query`.
///
/// Matching is case-insensitive substring search over the shutter, zone,
/// building and project names, the project city and the shutter remarks. A
/// query with no words matches every shutter. Hits are returned in tree
/// order.
#[must_use]
pub fn search_shutters<'a>(projects: &'a [Project], query: &str) -> Vec<SearchHit<'a>> {
    let query = query.to_lowercase();
    let words: Vec<&str> = query.split_whitespace().collect();

    let mut hits = Vec::new();
    for project in projects {
        for building in &project.buildings {
            for zone in &building.functional_zones {
                for shutter in &zone.shutters {
                    let hit = SearchHit {
                        shutter,
                        zone,
                        building,
                        project,
                    };
                    let haystack = hit.haystack();
                    if words.iter().all(|word| haystack.contains(word)) {
                        hits.push(hit);
                    }
                }
            }
        }
    }
    hits
}
