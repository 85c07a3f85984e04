//! Shared fixtures for integration tests.

#![allow(dead_code)]

use energy_allocator::allocation::{AllocationRequest, DemandEntry};
use rand::{Rng, rngs::StdRng, seq::SliceRandom};

/// Builds a request from `(id, demand)` pairs.
pub fn request(supply: f64, demands: &[(&str, f64)]) -> AllocationRequest {
    AllocationRequest::new(
        supply,
        demands
            .iter()
            .map(|&(id, d)| DemandEntry::new(id, d))
            .collect(),
    )
}

/// Random demand list with ids in shuffled order, roughly one in ten zero,
/// values on a 0.001 grid.
pub fn random_demands(rng: &mut StdRng, n: usize) -> Vec<DemandEntry> {
    let mut ids: Vec<usize> = (0..n).collect();
    ids.shuffle(rng);
    ids.into_iter()
        .map(|id| {
            let demand = if rng.random_bool(0.1) {
                0.0
            } else {
                f64::from(rng.random_range(1_u32..50_000)) / 1000.0
            };
            DemandEntry::new(format!("E{id:04}"), demand)
        })
        .collect()
}

/// Random request whose supply is below total demand.
pub fn random_scarce_request(rng: &mut StdRng, n: usize) -> AllocationRequest {
    let demands = random_demands(rng, n);
    let total: f64 = demands.iter().map(|d| d.predicted_demand).sum();
    let supply = (total * rng.random_range(0.0..0.99) * 1000.0).floor() / 1000.0;
    AllocationRequest::new(supply, demands)
}
