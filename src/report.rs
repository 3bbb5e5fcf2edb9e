use std::collections::BTreeMap;

use serde::Serialize;

use crate::{error::PassError, options::PassKind};

// -----------------------------------------------------------------------------
// Counter names
// -----------------------------------------------------------------------------

pub const STRINGS_DECODED: &str = "strings_decoded";
pub const CONSTANTS_FOLDED: &str = "constants_folded";
pub const FUNCTIONS_INLINED: &str = "functions_inlined";
pub const IDENTIFIERS_RENAMED: &str = "identifiers_renamed";
pub const DEAD_BLOCKS_REMOVED: &str = "dead_blocks_removed";
pub const REMOVED_ARRAYS: &str = "removed_arrays";

/// Counters every report starts with; passes may add more.
const SEEDED_COUNTERS: [&str; 5] = [
    STRINGS_DECODED,
    CONSTANTS_FOLDED,
    FUNCTIONS_INLINED,
    IDENTIFIERS_RENAMED,
    DEAD_BLOCKS_REMOVED,
];

// -----------------------------------------------------------------------------
// Per-pass statistics
// -----------------------------------------------------------------------------

/// What one pass hands back on success.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassStats {
    counters: Vec<(&'static str, u64)>,
    notes: Vec<String>,
}

impl PassStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` to counter `name`.
    pub fn with_counter(mut self, name: &'static str, value: u64) -> Self {
        self.add(name, value);
        self
    }

    pub fn add(&mut self, name: &'static str, value: u64) {
        match self.counters.iter_mut().find(|(n, _)| *n == name) {
            Some((_, total)) => *total += value,
            None => self.counters.push((name, value)),
        }
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
            .unwrap_or(0)
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }
}

// -----------------------------------------------------------------------------
// Aggregate report
// -----------------------------------------------------------------------------

/// Result report of one [`crate::deobfuscate`] call.
///
/// Counters form an open map: the five seeded counters always exist, and a pass
/// may introduce new ones (`removed_arrays`). Every counter equals the sum of
/// what the passes that ran returned for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformationReport {
    passes_applied: Vec<PassKind>,
    #[serde(flatten)]
    counters: BTreeMap<String, u64>,
    notes: Vec<String>,
}

impl Default for TransformationReport {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformationReport {
    pub fn new() -> Self {
        Self {
            passes_applied: vec![],
            counters: SEEDED_COUNTERS
                .iter()
                .map(|name| (name.to_string(), 0))
                .collect(),
            notes: vec![],
        }
    }

    /// Passes that completed, in the order they ran.
    pub fn passes_applied(&self) -> &[PassKind] {
        &self.passes_applied
    }

    /// Value of counter `name`, or 0 if no pass ever produced it.
    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn counters(&self) -> &BTreeMap<String, u64> {
        &self.counters
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Fold one pass outcome into the report.
    pub(crate) fn absorb(&mut self, kind: PassKind, outcome: Result<PassStats, PassError>) {
        match outcome {
            Ok(stats) => {
                self.passes_applied.push(kind);
                for (name, value) in stats.counters {
                    *self.counters.entry(name.to_string()).or_insert(0) += value;
                }
                self.notes
                    .extend(stats.notes.into_iter().map(|note| format!("{kind}:{note}")));
            }
            Err(err) => self.notes.push(format!("{kind}-error:{err}")),
        }
    }
}
