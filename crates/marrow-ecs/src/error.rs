use crate::entity::Entity;

/// Recoverable failures when adding a component to a pool.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("component pool is full (capacity {capacity})")]
    CapacityExceeded { capacity: usize },

    #[error("entity {entity} collides with stale occupant {occupant} of the same index")]
    StaleEntity { entity: Entity, occupant: Entity },
}
