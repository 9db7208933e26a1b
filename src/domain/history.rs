//! A short log of quick calculations made outside any project.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    compliance::{ComplianceStatus, FlowReading},
    project::Id,
};

/// Number of entries kept when no limit is configured.
pub const DEFAULT_HISTORY_LIMIT: usize = 5;

/// Smallest accepted limit. The latest calculation is always kept.
const MIN_HISTORY_LIMIT: usize = 1;

/// A recorded quick calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Identifier.
    pub id: Id,
    /// Reference flow entered.
    pub reference_flow: f64,
    /// Measured flow entered.
    pub measured_flow: f64,
    /// Signed deviation, in percent.
    pub deviation: f64,
    /// Resulting status.
    pub status: ComplianceStatus,
    /// Colour token of the status.
    pub color: String,
    /// When the calculation was made.
    pub timestamp: DateTime<Utc>,
}

/// Newest-first, bounded log of quick calculations.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    /// An empty history keeping at most `limit` entries.
    ///
    /// A limit of zero is raised to one.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        let limit = limit.max(MIN_HISTORY_LIMIT);
        Self {
            entries: VecDeque::with_capacity(limit),
            limit,
        }
    }

    /// Rebuild a history from stored entries (newest first), truncating to
    /// `limit`. A limit of zero is raised to one.
    #[must_use]
    pub fn from_entries(entries: Vec<HistoryEntry>, limit: usize) -> Self {
        let limit = limit.max(MIN_HISTORY_LIMIT);
        let mut entries = VecDeque::from(entries);
        entries.truncate(limit);
        Self { entries, limit }
    }

    /// Record a validated reading and return the new entry.
    pub fn record(&mut self, reading: FlowReading) -> &HistoryEntry {
        let result = reading.evaluate();
        let entry = HistoryEntry {
            id: Id::generate(),
            reference_flow: reading.reference_flow(),
            measured_flow: reading.measured_flow(),
            // a validated reading always has a defined deviation
            deviation: result.deviation.unwrap_or_default(),
            status: result.status,
            color: result.color.to_string(),
            timestamp: Utc::now(),
        };
        self.push(entry);
        // the limit is at least one, so the new entry is still there
        &self.entries[0]
    }

    fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.limit);
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries, newest first.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// The maximum number of entries kept.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
