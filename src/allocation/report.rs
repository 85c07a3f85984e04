//! Post-hoc summary of an allocation run.

use std::fmt;

use super::types::{AllocationResult, Verdict};

/// Aggregate figures derived from a complete [`AllocationResult`].
///
/// Computed from the entries after the fact so the summary can never
/// disagree with the per-entity outcomes.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationSummary {
    /// Number of entities in the run.
    pub entity_count: usize,
    /// Entities whose whole demand was met (zero-demand entities included).
    pub fully_served: usize,
    /// Entities left with unmet demand.
    pub short: usize,
    /// Lowest served fraction across all entities (1.0 when nobody is short).
    pub min_satisfaction: f64,
    /// Served fraction of total demand.
    pub overall_satisfaction: f64,
    /// Floor share of the entities left short; some got one unit more.
    pub water_level: Option<f64>,
    pub total_supply: f64,
    pub total_demand: f64,
    pub total_allocated: f64,
    pub unallocated_supply: f64,
    pub shortfall: f64,
    pub verdict: Verdict,
}

impl AllocationSummary {
    pub fn from_result(result: &AllocationResult) -> Self {
        let entries = result.entries();
        let fully_served = entries.iter().filter(|e| e.is_fully_served()).count();
        let min_satisfaction = entries
            .iter()
            .map(|e| e.satisfaction())
            .fold(1.0_f64, f64::min);
        let overall_satisfaction = if result.total_demand() > 0.0 {
            result.total_allocated() / result.total_demand()
        } else {
            1.0
        };

        Self {
            entity_count: entries.len(),
            fully_served,
            short: entries.len() - fully_served,
            min_satisfaction,
            overall_satisfaction,
            water_level: result.water_level(),
            total_supply: result.total_supply(),
            total_demand: result.total_demand(),
            total_allocated: result.total_allocated(),
            unallocated_supply: result.unallocated_supply(),
            shortfall: result.shortfall(),
            verdict: result.verdict(),
        }
    }
}

impl fmt::Display for AllocationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Allocation Report ---")?;
        writeln!(f, "Verdict:               {}", self.verdict)?;
        writeln!(f, "Entities:              {}", self.entity_count)?;
        writeln!(f, "Fully served:          {}", self.fully_served)?;
        writeln!(f, "Short:                 {}", self.short)?;
        writeln!(f, "Total supply:          {:.3} kWh", self.total_supply)?;
        writeln!(f, "Total demand:          {:.3} kWh", self.total_demand)?;
        writeln!(f, "Total allocated:       {:.3} kWh", self.total_allocated)?;
        writeln!(f, "Unallocated supply:    {:.3} kWh", self.unallocated_supply)?;
        writeln!(f, "Shortfall:             {:.3} kWh", self.shortfall)?;
        if let Some(level) = self.water_level {
            writeln!(f, "Fair-share level:      {level:.3} kWh")?;
        }
        writeln!(
            f,
            "Overall satisfaction:  {:.1}%",
            100.0 * self.overall_satisfaction
        )?;
        write!(
            f,
            "Min satisfaction:      {:.1}%",
            100.0 * self.min_satisfaction
        )
    }
}
