//! Allocation of a finite energy supply across forecasted demands.

/// Water-filling engine.
pub mod engine;
pub mod error;
/// Fixed-point quantity handling.
pub mod quantity;
pub mod report;
pub mod types;

pub use engine::{AllocationEngine, allocate};
pub use error::AllocationError;
pub use quantity::Resolution;
pub use report::AllocationSummary;
pub use types::{
    AllocationEntry, AllocationRequest, AllocationResult, DemandEntry, EntityId, Verdict,
};
