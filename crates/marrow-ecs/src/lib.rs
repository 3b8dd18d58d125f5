//! Marrow ECS - entity identities and dense component storage
//!
//! Entities are generational indices. Every component kind lives in its own
//! fixed-capacity [`ComponentPool`], which keeps live components packed in a
//! dense array so systems can iterate them linearly.

mod entity;
mod error;
mod pool;
mod world;

pub use entity::{Entity, EntityAllocator};
pub use error::PoolError;
pub use pool::{Component, ComponentPool, Handle};
pub use world::World;
