//! Max-min fair (water-filling) allocation of a finite supply.

use std::collections::HashSet;

use super::error::AllocationError;
use super::quantity::{Resolution, compensated_sum};
use super::types::{AllocationEntry, AllocationRequest, AllocationResult, EntityId, Verdict};

/// Stateless allocation engine.
///
/// Holds only its working resolution, so a single instance can be shared
/// across threads and reused for any number of requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocationEngine {
    resolution: Resolution,
}

/// Request after validation: supply rounded down and demands rounded up
/// to whole units.
struct Quantized<'a> {
    supply: u64,
    demands: Vec<u64>,
    ids: Vec<&'a EntityId>,
}

/// Outcome of a scarce-supply water-fill, in units.
#[derive(Debug, PartialEq, Eq)]
struct WaterFill {
    allocated: Vec<u64>,
    /// Floor share of the entities left short; `None` if nobody was.
    level: Option<u64>,
}

impl AllocationEngine {
    pub fn new(resolution: Resolution) -> Self {
        Self { resolution }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Distributes the request's supply across its entities.
    ///
    /// Total demand and the verdict are computed on the caller's values.
    /// When supply covers total demand every entity is served in full.
    /// Otherwise the smallest demands are capped out first and the rest
    /// share what remains equally, so the minimum served fraction is as
    /// large as possible. The scarce split runs at the engine resolution.
    ///
    /// # Errors
    ///
    /// Returns an [`AllocationError`] if the supply or any demand is not a
    /// finite non-negative quantity, or an entity id is repeated.
    pub fn allocate(&self, request: &AllocationRequest) -> Result<AllocationResult, AllocationError> {
        let q = self.quantize(request)?;
        let total_supply = request.total_supply();
        let total_demand = compensated_sum(request.demands().iter().map(|d| d.predicted_demand));

        if total_supply >= total_demand {
            let entries = request
                .demands()
                .iter()
                .map(|d| AllocationEntry {
                    entity_id: d.entity_id.clone(),
                    predicted_demand: d.predicted_demand,
                    allocated: d.predicted_demand,
                    unmet: 0.0,
                })
                .collect();
            return Ok(AllocationResult {
                entries,
                resolution: self.resolution,
                total_supply,
                total_demand,
                total_allocated: total_demand,
                water_level: None,
                verdict: Verdict::Sufficient,
            });
        }

        let fill = water_fill(q.supply, &q.demands, &q.ids);
        let entries: Vec<AllocationEntry> = request
            .demands()
            .iter()
            .zip(q.demands.iter().zip(&fill.allocated))
            .map(|(d, (&need, &given))| {
                // Reaching the rounded-up demand means the whole real demand is covered.
                let allocated = if given >= need {
                    d.predicted_demand
                } else {
                    self.resolution.from_units(given).min(d.predicted_demand)
                };
                AllocationEntry {
                    entity_id: d.entity_id.clone(),
                    predicted_demand: d.predicted_demand,
                    allocated,
                    unmet: d.predicted_demand - allocated,
                }
            })
            .collect();
        let total_allocated = compensated_sum(entries.iter().map(|e| e.allocated)).min(total_supply);

        Ok(AllocationResult {
            entries,
            resolution: self.resolution,
            total_supply,
            total_demand,
            total_allocated,
            water_level: fill.level.map(|level| self.resolution.from_units(level)),
            verdict: Verdict::Insufficient,
        })
    }

    fn quantize<'a>(&self, request: &'a AllocationRequest) -> Result<Quantized<'a>, AllocationError> {
        let supply = self
            .resolution
            .floor_units(request.total_supply())
            .ok_or(AllocationError::InvalidSupply {
                value: request.total_supply(),
            })?;

        let mut seen = HashSet::with_capacity(request.demands().len());
        let mut demands = Vec::with_capacity(request.demands().len());
        let mut ids = Vec::with_capacity(request.demands().len());
        for entry in request.demands() {
            let units = self.resolution.ceil_units(entry.predicted_demand).ok_or_else(|| {
                AllocationError::InvalidDemand {
                    entity_id: entry.entity_id.clone(),
                    value: entry.predicted_demand,
                }
            })?;
            if !seen.insert(&entry.entity_id) {
                return Err(AllocationError::DuplicateEntity {
                    entity_id: entry.entity_id.clone(),
                });
            }
            demands.push(units);
            ids.push(&entry.entity_id);
        }

        Ok(Quantized {
            supply,
            demands,
            ids,
        })
    }
}

/// Allocates with the default engine (three decimal places).
///
/// # Errors
///
/// See [`AllocationEngine::allocate`].
pub fn allocate(request: &AllocationRequest) -> Result<AllocationResult, AllocationError> {
    AllocationEngine::default().allocate(request)
}

/// Water-fills `supply` over `demands`. If supply covers every demand, all
/// of them cap out and the level is `None`.
///
/// Entities are swept once in `(demand, id)` ascending order. An entity whose
/// demand fits under the current equal share is served in full and leaves the
/// pool; the first one that does not fit ends the sweep, and it and every
/// larger entity get the floor share. The integer remainder goes out one unit
/// at a time to the largest unmet demands, ties broken by ascending id.
fn water_fill(supply: u64, demands: &[u64], ids: &[&EntityId]) -> WaterFill {
    let mut allocated = vec![0_u64; demands.len()];
    let mut order: Vec<usize> = (0..demands.len()).filter(|&i| demands[i] > 0).collect();
    order.sort_by(|&a, &b| demands[a].cmp(&demands[b]).then_with(|| ids[a].cmp(ids[b])));

    let mut remaining = supply;
    let mut capped = 0;
    for (pos, &i) in order.iter().enumerate() {
        let share = remaining / (order.len() - pos) as u64;
        if demands[i] > share {
            break;
        }
        allocated[i] = demands[i];
        remaining -= demands[i];
        capped += 1;
    }

    let uncapped = &order[capped..];
    if uncapped.is_empty() {
        return WaterFill {
            allocated,
            level: None,
        };
    }

    let level = remaining / uncapped.len() as u64;
    for &i in uncapped {
        allocated[i] = level;
    }
    let residual = remaining - level * uncapped.len() as u64;
    distribute_residual(residual, uncapped, demands, ids, &mut allocated);

    WaterFill {
        allocated,
        level: Some(level),
    }
}

/// Hands `residual` single units to the entities in `pool` with the largest
/// unmet demand. Every entity in `pool` has demand above its allocation, and
/// `residual < pool.len()`, so nobody is over-served.
fn distribute_residual(
    residual: u64,
    pool: &[usize],
    demands: &[u64],
    ids: &[&EntityId],
    allocated: &mut [u64],
) {
    if residual == 0 {
        return;
    }
    let mut by_unmet = pool.to_vec();
    by_unmet.sort_by(|&a, &b| {
        (demands[b] - allocated[b])
            .cmp(&(demands[a] - allocated[a]))
            .then_with(|| ids[a].cmp(ids[b]))
    });
    for &i in by_unmet.iter().take(residual as usize) {
        allocated[i] += 1;
    }
}

/// Pass-by-pass water-filling: recompute the equal share, cap out everyone
/// at or below it, repeat until nobody caps out. Quadratic, kept as the
/// oracle the sweep is checked against.
#[cfg(test)]
fn water_fill_by_passes(supply: u64, demands: &[u64], ids: &[&EntityId]) -> WaterFill {
    let mut allocated = vec![0_u64; demands.len()];
    let mut active: Vec<usize> = (0..demands.len()).filter(|&i| demands[i] > 0).collect();
    let mut remaining = supply;

    loop {
        if active.is_empty() {
            return WaterFill {
                allocated,
                level: None,
            };
        }
        let share = remaining / active.len() as u64;
        let (fits, rest): (Vec<usize>, Vec<usize>) =
            active.iter().partition(|&&i| demands[i] <= share);
        if fits.is_empty() {
            for &i in &active {
                allocated[i] = share;
            }
            let residual = remaining - share * active.len() as u64;
            distribute_residual(residual, &active, demands, ids, &mut allocated);
            return WaterFill {
                allocated,
                level: Some(share),
            };
        }
        for &i in &fits {
            allocated[i] = demands[i];
            remaining -= demands[i];
        }
        active = rest;
    }
}
