//! Request validation errors.

use thiserror::Error;

use super::types::EntityId;

/// Reasons a request is rejected. All of them are detected before any
/// allocation work starts, so a rejected request never yields a partial result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AllocationError {
    /// Total supply is negative, not finite, or too large to represent.
    #[error("invalid supply {value}: must be a finite, non-negative quantity")]
    InvalidSupply { value: f64 },

    /// An entity's predicted demand is negative, not finite, or too large.
    #[error("invalid demand {value} for entity \"{entity_id}\": must be a finite, non-negative quantity")]
    InvalidDemand { entity_id: EntityId, value: f64 },

    /// The same entity id appears more than once in the request.
    #[error("duplicate entity \"{entity_id}\" in demand list")]
    DuplicateEntity { entity_id: EntityId },
}

impl AllocationError {
    /// Entity the error refers to, if any.
    pub fn entity_id(&self) -> Option<&EntityId> {
        match self {
            Self::InvalidSupply { .. } => None,
            Self::InvalidDemand { entity_id, .. } | Self::DuplicateEntity { entity_id } => {
                Some(entity_id)
            }
        }
    }
}
