//! User-pinned entities.
//!
//! Favourites only affect display order. Membership is all that matters, so
//! each level is kept as a set.

use std::collections::{btree_set, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::project::Id;

/// A set of favourite identifiers for one level of the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FavoriteSet(BTreeSet<Id>);

impl FavoriteSet {
    /// Whether `id` is a favourite.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    /// Mark `id` as a favourite.
    ///
    /// Returns `true` if it was not already one.
    pub fn insert(&mut self, id: Id) -> bool {
        self.0.insert(id)
    }

    /// Remove `id` from the favourites.
    ///
    /// Returns `true` if it was a favourite.
    pub fn remove(&mut self, id: &str) -> bool {
        self.0.remove(id)
    }

    /// Flip the favourite status of `id`.
    ///
    /// Returns the new status.
    pub fn toggle(&mut self, id: Id) -> bool {
        if self.0.remove(id.as_str()) {
            false
        } else {
            self.0.insert(id);
            true
        }
    }

    /// Number of favourites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no favourites.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the favourite identifiers.
    pub fn iter(&self) -> btree_set::Iter<'_, Id> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a FavoriteSet {
    type Item = &'a Id;
    type IntoIter = btree_set::Iter<'a, Id>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Id> for FavoriteSet {
    fn from_iter<I: IntoIterator<Item = Id>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The level of the tree a favourite belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteKind {
    /// Projects.
    Project,
    /// Buildings.
    Building,
    /// Functional zones.
    Zone,
    /// Shutters.
    Shutter,
}

/// Favourites at every level of the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Favorites {
    /// Favourite projects.
    pub projects: FavoriteSet,
    /// Favourite buildings.
    pub buildings: FavoriteSet,
    /// Favourite functional zones.
    pub zones: FavoriteSet,
    /// Favourite shutters.
    pub shutters: FavoriteSet,
}

impl Favorites {
    /// The favourite set for a level.
    #[must_use]
    pub const fn get(&self, kind: FavoriteKind) -> &FavoriteSet {
        match kind {
            FavoriteKind::Project => &self.projects,
            FavoriteKind::Building => &self.buildings,
            FavoriteKind::Zone => &self.zones,
            FavoriteKind::Shutter => &self.shutters,
        }
    }

    /// The mutable favourite set for a level.
    pub const fn get_mut(&mut self, kind: FavoriteKind) -> &mut FavoriteSet {
        match kind {
            FavoriteKind::Project => &mut self.projects,
            FavoriteKind::Building => &mut self.buildings,
            FavoriteKind::Zone => &mut self.zones,
            FavoriteKind::Shutter => &mut self.shutters,
        }
    }
}
