//! Roll-ups of shutter compliance across the record tree, and display
//! ordering helpers.
//!
//! Everything here is a pure read over a borrowed tree.

use std::{cmp::Ordering, ops::AddAssign};

use serde::Serialize;

use crate::domain::{
    compliance::ComplianceStatus,
    favorites::FavoriteSet,
    project::{
        Building, CompartmentZone, Entity, FunctionalZone, Project, ProjectMode, Shutter,
        Timestamped,
    },
};

/// Counts and compliance rate for a subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    /// Number of buildings.
    pub building_count: usize,
    /// Number of functional zones.
    pub zone_count: usize,
    /// Number of shutters.
    pub shutter_count: usize,
    /// Shutters classified compliant.
    pub compliant_count: usize,
    /// Shutters classified acceptable.
    pub acceptable_count: usize,
    /// Shutters classified non-compliant.
    pub non_compliant_count: usize,
    /// `compliant_count / shutter_count * 100`, or `0` with no shutters.
    pub compliance_rate: f64,
}

impl AggregateStats {
    fn record(&mut self, shutter: &Shutter) {
        self.shutter_count += 1;
        match shutter.compliance().status {
            ComplianceStatus::Compliant => self.compliant_count += 1,
            ComplianceStatus::Acceptable => self.acceptable_count += 1,
            ComplianceStatus::NonCompliant => self.non_compliant_count += 1,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    const fn finish(mut self) -> Self {
        self.compliance_rate = if self.shutter_count > 0 {
            self.compliant_count as f64 / self.shutter_count as f64 * 100.0
        } else {
            0.0
        };
        self
    }

    /// Count for a given status.
    #[must_use]
    pub const fn count(&self, status: ComplianceStatus) -> usize {
        match status {
            ComplianceStatus::Compliant => self.compliant_count,
            ComplianceStatus::Acceptable => self.acceptable_count,
            ComplianceStatus::NonCompliant => self.non_compliant_count,
        }
    }
}

impl AddAssign for AggregateStats {
    /// Sums the counts. The rate is left for `finish` to recompute.
    fn add_assign(&mut self, other: Self) {
        self.building_count += other.building_count;
        self.zone_count += other.zone_count;
        self.shutter_count += other.shutter_count;
        self.compliant_count += other.compliant_count;
        self.acceptable_count += other.acceptable_count;
        self.non_compliant_count += other.non_compliant_count;
    }
}

/// Statistics for a single functional zone.
#[must_use]
pub fn zone_stats(zone: &FunctionalZone) -> AggregateStats {
    let mut stats = AggregateStats {
        zone_count: 1,
        ..AggregateStats::default()
    };
    for shutter in &zone.shutters {
        stats.record(shutter);
    }
    stats.finish()
}

/// Statistics for a single building.
#[must_use]
pub fn building_stats(building: &Building) -> AggregateStats {
    let mut stats = AggregateStats {
        building_count: 1,
        ..AggregateStats::default()
    };
    for zone in &building.functional_zones {
        stats += zone_stats(zone);
    }
    stats.finish()
}

/// Statistics for a whole project.
///
/// Every shutter of every functional zone of every building is evaluated.
/// Compartment zones hold no shutters and do not count towards `zone_count`.
#[must_use]
pub fn project_stats(project: &Project) -> AggregateStats {
    let mut stats = AggregateStats::default();
    for building in &project.buildings {
        stats += building_stats(building);
    }
    stats.finish()
}

/// Statistics summed over several projects.
#[must_use]
pub fn portfolio_stats(projects: &[Project]) -> AggregateStats {
    let mut stats = AggregateStats::default();
    for project in projects {
        stats += project_stats(project);
    }
    stats.finish()
}

/// Tie-break applied within the favourite and non-favourite partitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SecondaryKey {
    /// Keep input order.
    #[default]
    None,
    /// Most recently updated first.
    UpdatedDesc,
}

/// Compare two entities by favourite status only.
///
/// Returns [`Ordering::Equal`] when both or neither are favourites.
fn favorite_order<T: Entity>(a: &T, b: &T, favorites: &FavoriteSet) -> Ordering {
    let is_favorite = |entity: &T| favorites.contains(entity.id().as_str());
    is_favorite(b).cmp(&is_favorite(a))
}

/// Order entities with favourites first, preserving input order otherwise.
///
/// The sort is stable, so within each partition entities keep their relative
/// input order.
pub fn sort_with_favorites_first<T: Entity>(entities: &mut [T], favorites: &FavoriteSet) {
    entities.sort_by(|a, b| favorite_order(a, b, favorites));
}

/// Order entities with favourites first, then by the requested secondary key.
pub fn sort_with_favorites_first_by<T: Entity + Timestamped>(
    entities: &mut [T],
    favorites: &FavoriteSet,
    secondary: SecondaryKey,
) {
    entities.sort_by(|a, b| {
        favorite_order(a, b, favorites).then_with(|| match secondary {
            SecondaryKey::None => Ordering::Equal,
            SecondaryKey::UpdatedDesc => b.updated_at().cmp(&a.updated_at()),
        })
    });
}

/// Borrow `entities` and return them with favourites first.
#[must_use]
pub fn favorites_first<'a, T: Entity>(
    entities: &'a [T],
    favorites: &FavoriteSet,
) -> Vec<&'a T> {
    let mut ordered: Vec<&T> = entities.iter().collect();
    sort_with_favorites_first(&mut ordered, favorites);
    ordered
}

/// Which zone list the user is looking at in a complete-mode project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ZoneTab {
    /// Smoke-control zones.
    #[default]
    Smoke,
    /// Compartmentation zones.
    Compartment,
}

/// The zones to display for a building.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoneSelection<'a> {
    /// Functional (smoke-control) zones.
    Functional(&'a [FunctionalZone]),
    /// Compartment zones.
    Compartment(&'a [CompartmentZone]),
}

impl ZoneSelection<'_> {
    /// Number of zones selected.
    #[must_use]
    pub const fn len(&self) -> usize {
        match self {
            Self::Functional(zones) => zones.len(),
            Self::Compartment(zones) => zones.len(),
        }
    }

    /// Whether no zones are selected.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Select the zones of `building` shown for a project mode and active tab.
///
/// - compartment mode shows compartment zones;
/// - complete mode shows functional zones on the smoke tab and compartment
///   zones otherwise;
/// - smoke mode shows functional zones.
#[must_use]
pub fn select_zones_for_display(
    building: &Building,
    mode: ProjectMode,
    tab: ZoneTab,
) -> ZoneSelection<'_> {
    match (mode, tab) {
        (ProjectMode::Compartment, _) | (ProjectMode::Complete, ZoneTab::Compartment) => {
            ZoneSelection::Compartment(&building.compartment_zones)
        }
        (ProjectMode::Complete, ZoneTab::Smoke) | (ProjectMode::Smoke, _) => {
            ZoneSelection::Functional(&building.functional_zones)
        }
    }
}
