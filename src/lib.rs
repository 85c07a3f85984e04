//! Fair allocation of a finite energy supply across forecasted demand.

/// Water-filling allocation engine and its data model.
pub mod allocation;
pub mod cli;
pub mod config;
/// Demand forecast sources.
pub mod forecast;
pub mod generation;
pub mod runner;
