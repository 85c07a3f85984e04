//! Request and result values exchanged with the allocation engine.

use std::fmt;

use super::quantity::Resolution;
use super::report::AllocationSummary;

/// Opaque identifier of a demand point (household, substation, location).
///
/// Ordering is lexicographic on the underlying string and is only used to
/// break ties deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One entity's forecasted need for the target date.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandEntry {
    /// Entity the forecast belongs to.
    pub entity_id: EntityId,
    /// Forecasted demand (energy units, must be >= 0).
    pub predicted_demand: f64,
}

impl DemandEntry {
    pub fn new(entity_id: impl Into<EntityId>, predicted_demand: f64) -> Self {
        Self {
            entity_id: entity_id.into(),
            predicted_demand,
        }
    }
}

/// Immutable input to one allocation run.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationRequest {
    total_supply: f64,
    demands: Vec<DemandEntry>,
}

impl AllocationRequest {
    /// Builds a request. Nothing is checked here; the engine validates the
    /// whole request before allocating.
    pub fn new(total_supply: f64, demands: Vec<DemandEntry>) -> Self {
        Self {
            total_supply,
            demands,
        }
    }

    pub fn total_supply(&self) -> f64 {
        self.total_supply
    }

    pub fn demands(&self) -> &[DemandEntry] {
        &self.demands
    }
}

/// Scenario classification of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Supply meets or exceeds total demand.
    Sufficient,
    /// Supply falls short of total demand.
    Insufficient,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sufficient => f.write_str("Sufficient energy"),
            Self::Insufficient => f.write_str("Insufficient energy"),
        }
    }
}

/// One entity's outcome.
///
/// Invariant: `0 <= allocated <= predicted_demand` and
/// `unmet == predicted_demand - allocated`.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationEntry {
    pub entity_id: EntityId,
    /// Demand exactly as the request carried it.
    pub predicted_demand: f64,
    pub allocated: f64,
    pub unmet: f64,
}

impl AllocationEntry {
    /// Fraction of demand that was served; `1.0` for zero-demand entities.
    pub fn satisfaction(&self) -> f64 {
        if self.predicted_demand > 0.0 {
            self.allocated / self.predicted_demand
        } else {
            1.0
        }
    }

    pub fn is_fully_served(&self) -> bool {
        self.unmet == 0.0
    }
}

/// Output of one allocation run.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationResult {
    pub(crate) entries: Vec<AllocationEntry>,
    pub(crate) resolution: Resolution,
    pub(crate) total_supply: f64,
    pub(crate) total_demand: f64,
    pub(crate) total_allocated: f64,
    pub(crate) water_level: Option<f64>,
    pub(crate) verdict: Verdict,
}

impl AllocationResult {
    /// Per-entity outcomes, in the same order as the request's demands.
    pub fn entries(&self) -> &[AllocationEntry] {
        &self.entries
    }

    /// Looks up an entity's outcome by id.
    pub fn entry(&self, entity_id: &EntityId) -> Option<&AllocationEntry> {
        self.entries.iter().find(|e| &e.entity_id == entity_id)
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Supply as the request carried it.
    pub fn total_supply(&self) -> f64 {
        self.total_supply
    }

    /// Sum of the requested demands.
    pub fn total_demand(&self) -> f64 {
        self.total_demand
    }

    /// Sum of the allocations; never above `total_supply`.
    pub fn total_allocated(&self) -> f64 {
        self.total_allocated
    }

    /// Supply left over after every entity was served.
    pub fn unallocated_supply(&self) -> f64 {
        (self.total_supply - self.total_allocated).max(0.0)
    }

    /// Demand left unserved across all entities.
    pub fn shortfall(&self) -> f64 {
        (self.total_demand - self.total_allocated).max(0.0)
    }

    /// Floor share of the entities left short. Each of them got this
    /// amount or one unit more, the extra units going to the largest unmet
    /// demands. `None` when supply was sufficient.
    pub fn water_level(&self) -> Option<f64> {
        self.water_level
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn summary(&self) -> AllocationSummary {
        AllocationSummary::from_result(self)
    }
}
