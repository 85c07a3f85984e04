//! End-to-end checks of the allocation engine contract.

mod common;

use common::{random_demands, random_scarce_request, request};
use energy_allocator::allocation::{
    AllocationEngine, AllocationError, AllocationRequest, AllocationResult, DemandEntry,
    Resolution, Verdict, allocate,
};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// One unit of least precision at the default resolution.
const UNIT: f64 = 0.001;
const EPS: f64 = 1e-9;

fn allocations(result: &AllocationResult) -> Vec<f64> {
    result.entries().iter().map(|e| e.allocated).collect()
}

#[test]
fn ample_supply_serves_everyone_in_full() {
    let result = allocate(&request(300.0, &[("A", 100.0), ("B", 100.0), ("C", 100.0)]))
        .expect("valid request");
    assert_eq!(allocations(&result), vec![100.0, 100.0, 100.0]);
    assert_eq!(result.verdict(), Verdict::Sufficient);
}

#[test]
fn half_supply_splits_equal_demands_evenly() {
    let result = allocate(&request(150.0, &[("A", 100.0), ("B", 100.0), ("C", 100.0)]))
        .expect("valid request");
    assert_eq!(allocations(&result), vec![50.0, 50.0, 50.0]);
    assert_eq!(result.verdict(), Verdict::Insufficient);
}

#[test]
fn small_demand_is_capped_and_rest_shared() {
    let result = allocate(&request(120.0, &[("A", 20.0), ("B", 100.0), ("C", 100.0)]))
        .expect("valid request");
    assert_eq!(allocations(&result), vec![20.0, 50.0, 50.0]);
    assert_eq!(result.verdict(), Verdict::Insufficient);
}

#[test]
fn zero_supply_leaves_demand_unmet() {
    let result = allocate(&request(0.0, &[("A", 10.0)])).expect("valid request");
    assert_eq!(result.entries()[0].allocated, 0.0);
    assert_eq!(result.entries()[0].unmet, 10.0);
    assert_eq!(result.verdict(), Verdict::Insufficient);
}

#[test]
fn empty_demands_are_sufficient() {
    let result = allocate(&request(50.0, &[])).expect("valid request");
    assert!(result.entries().is_empty());
    assert_eq!(result.total_demand(), 0.0);
    assert_eq!(result.total_allocated(), 0.0);
    assert_eq!(result.verdict(), Verdict::Sufficient);
}

#[test]
fn validation_rejects_bad_input() {
    assert!(matches!(
        allocate(&request(-1.0, &[("A", 1.0)])),
        Err(AllocationError::InvalidSupply { .. })
    ));

    let err = allocate(&request(10.0, &[("A", 1.0), ("B", -5.0)])).err();
    assert_eq!(err.as_ref().and_then(|e| e.entity_id()).map(|id| id.as_str()), Some("B"));

    let err = allocate(&request(10.0, &[("A", 1.0), ("A", 2.0)])).err();
    assert!(matches!(err, Some(AllocationError::DuplicateEntity { ref entity_id }) if entity_id.as_str() == "A"));
}

#[test]
fn conservation_and_no_over_service() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..200 {
        let n = rng.random_range(0..80);
        let demands = random_demands(&mut rng, n);
        let total: f64 = demands.iter().map(|d| d.predicted_demand).sum();
        let supply = (total * rng.random_range(0.0..1.5) * 1000.0).floor() / 1000.0;
        let result = allocate(&AllocationRequest::new(supply, demands)).expect("valid request");

        assert!(result.total_allocated() <= result.total_supply() + EPS);
        assert!(result.total_allocated() <= result.total_demand() + EPS);
        let summed: f64 = result.entries().iter().map(|e| e.allocated).sum();
        assert!((summed - result.total_allocated()).abs() <= UNIT);

        for e in result.entries() {
            assert!(e.allocated >= 0.0);
            assert!(e.allocated <= e.predicted_demand);
            assert!((e.predicted_demand - e.allocated - e.unmet).abs() < EPS);
        }
    }
}

#[test]
fn full_service_when_supply_covers_demand() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..100 {
        let n = rng.random_range(1..50);
        let demands = random_demands(&mut rng, n);
        let total: f64 = demands.iter().map(|d| d.predicted_demand).sum();
        let result =
            allocate(&AllocationRequest::new(total + 1.0, demands)).expect("valid request");
        assert_eq!(result.verdict(), Verdict::Sufficient);
        assert!(result.entries().iter().all(|e| e.allocated == e.predicted_demand));
    }
}

#[test]
fn scarce_supply_is_spent_in_full() {
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..200 {
        let n = rng.random_range(1..60);
        let req = random_scarce_request(&mut rng, n);
        let result = allocate(&req).expect("valid request");
        if result.total_demand() > result.total_supply() {
            // Demands and supply sit on the unit grid, so nothing is lost
            // to rounding and the split spends everything.
            assert_eq!(result.verdict(), Verdict::Insufficient);
            assert!(result.total_allocated() <= result.total_supply());
            assert!(result.total_supply() - result.total_allocated() < 1e-9);
        }
    }
}

#[test]
fn short_entities_get_the_largest_shares() {
    // Max-min fairness: nobody left short received less than anyone else,
    // give or take the single residual unit.
    let mut rng = StdRng::seed_from_u64(17);
    for _ in 0..200 {
        let n = rng.random_range(1..60);
        let result = allocate(&random_scarce_request(&mut rng, n)).expect("valid request");
        let max_allocated = result
            .entries()
            .iter()
            .map(|e| e.allocated)
            .fold(0.0_f64, f64::max);
        for e in result.entries().iter().filter(|e| e.unmet > 0.0) {
            assert!(
                e.allocated + UNIT + EPS >= max_allocated,
                "{} got {} while someone got {}",
                e.entity_id,
                e.allocated,
                max_allocated
            );
            if let Some(level) = result.water_level() {
                assert!(e.allocated >= level - EPS && e.allocated <= level + UNIT + EPS);
            }
        }
    }
}

#[test]
fn verdict_and_totals_use_unrounded_values() {
    let ids: Vec<String> = (0..10).map(|i| format!("H{i:02}")).collect();
    let demands: Vec<(&str, f64)> = ids.iter().map(|id| (id.as_str(), 1.0004)).collect();
    let result = allocate(&request(10.003, &demands)).expect("valid request");

    assert_eq!(result.verdict(), Verdict::Insufficient);
    assert!((result.total_demand() - 10.004).abs() < 1e-12);
    assert!(result.total_allocated() <= result.total_supply());
    assert!(result.entries().iter().all(|e| e.predicted_demand == 1.0004));
    assert!(result.entries().iter().all(|e| e.allocated <= e.predicted_demand));

    let result = allocate(&request(0.0014, &[("A", 0.0006), ("B", 0.0006)]))
        .expect("valid request");
    assert_eq!(result.verdict(), Verdict::Sufficient);
    assert_eq!(result.total_supply(), 0.0014);
    assert!((result.total_demand() - 0.0012).abs() < 1e-15);
    assert_eq!(allocations(&result), vec![0.0006, 0.0006]);
}

#[test]
fn full_precision_demands_never_overspend() {
    let mut rng = StdRng::seed_from_u64(41);
    for _ in 0..200 {
        let n = rng.random_range(1..80);
        let demands: Vec<_> = (0..n)
            .map(|i| DemandEntry::new(format!("H{i:03}"), rng.random_range(0.0..20.0)))
            .collect();
        let total: f64 = demands.iter().map(|d| d.predicted_demand).sum();
        let supply = total * rng.random_range(0.0..1.2);
        let result = allocate(&AllocationRequest::new(supply, demands)).expect("valid request");

        assert_eq!(result.total_supply(), supply);
        assert_eq!(
            result.verdict() == Verdict::Sufficient,
            supply >= result.total_demand()
        );
        assert!(result.total_allocated() <= supply);
        let spent: f64 = result.entries().iter().map(|e| e.allocated).sum();
        assert!(spent <= supply + 1e-9);
        for e in result.entries() {
            assert!(e.allocated >= 0.0 && e.allocated <= e.predicted_demand);
        }
    }
}

#[test]
fn identical_input_gives_identical_output() {
    let mut rng = StdRng::seed_from_u64(23);
    let req = random_scarce_request(&mut rng, 500);
    let first = allocate(&req).expect("valid request");
    for _ in 0..5 {
        let again = allocate(&req.clone()).expect("valid request");
        assert_eq!(first, again);
        let bits: Vec<u64> = again.entries().iter().map(|e| e.allocated.to_bits()).collect();
        let first_bits: Vec<u64> = first.entries().iter().map(|e| e.allocated.to_bits()).collect();
        assert_eq!(bits, first_bits);
    }
}

#[test]
fn entries_follow_request_order() {
    let mut rng = StdRng::seed_from_u64(29);
    let req = random_scarce_request(&mut rng, 120);
    let result = allocate(&req).expect("valid request");
    assert_eq!(result.entries().len(), req.demands().len());
    for (entry, demand) in result.entries().iter().zip(req.demands()) {
        assert_eq!(entry.entity_id, demand.entity_id);
    }
}

#[test]
fn shared_engine_serves_concurrent_requests() {
    let engine = AllocationEngine::new(Resolution::new(2));
    let mut rng = StdRng::seed_from_u64(31);
    let requests: Vec<AllocationRequest> =
        (0..8).map(|_| random_scarce_request(&mut rng, 200)).collect();
    let sequential: Vec<_> = requests.iter().map(|r| engine.allocate(r).ok()).collect();

    let concurrent: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = requests
            .iter()
            .map(|r| s.spawn(|| engine.allocate(r).ok()))
            .collect();
        handles.into_iter().map(|h| h.join().ok().flatten()).collect()
    });

    assert_eq!(sequential, concurrent);
}

#[test]
fn thousands_of_entities_allocate() {
    let mut rng = StdRng::seed_from_u64(37);
    let req = random_scarce_request(&mut rng, 5_000);
    let result = allocate(&req).expect("valid request");
    assert_eq!(result.entries().len(), 5_000);
    assert!(result.total_allocated() <= result.total_supply() + EPS);
}
