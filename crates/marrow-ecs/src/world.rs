use std::any::{Any, TypeId};
use std::collections::HashMap;

use tracing::debug;

use crate::entity::{Entity, EntityAllocator};
use crate::error::PoolError;
use crate::pool::{Component, ComponentPool, Handle};

/// Type-erased view of a pool, so `World` can strip a despawned entity from
/// every component kind without knowing the kinds.
trait ComponentStorage: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn remove_entity(&mut self, entity: Entity) -> bool;
}

impl<T: Component> ComponentStorage for ComponentPool<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_some()
    }
}

/// Owns the entity allocator and exactly one pool per registered component kind.
pub struct World {
    entities: EntityAllocator,
    pools: HashMap<TypeId, Box<dyn ComponentStorage>>,
}

impl World {
    pub fn new() -> Self {
        Self {
            entities: EntityAllocator::new(),
            pools: HashMap::new(),
        }
    }

    /// Create the pool for component kind `T`. Registering a kind twice keeps
    /// the existing pool and its contents.
    pub fn register<T: Component>(&mut self, capacity: usize) {
        self.pools.entry(TypeId::of::<T>()).or_insert_with(|| {
            debug!(
                "registered {} pool with capacity {}",
                std::any::type_name::<T>(),
                capacity
            );
            Box::new(ComponentPool::<T>::with_capacity(capacity))
        });
    }

    // ---- Entity management ----

    /// Spawn a new entity with no components.
    pub fn spawn(&mut self) -> Entity {
        self.entities.allocate()
    }

    /// Despawn an entity, destroying its component in every pool.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.entities.deallocate(entity) {
            return false;
        }
        for pool in self.pools.values_mut() {
            pool.remove_entity(entity);
        }
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of alive entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // ---- Component management ----

    pub fn pool<T: Component>(&self) -> Option<&ComponentPool<T>> {
        self.pools
            .get(&TypeId::of::<T>())
            .and_then(|p| p.as_any().downcast_ref::<ComponentPool<T>>())
    }

    pub fn pool_mut<T: Component>(&mut self) -> Option<&mut ComponentPool<T>> {
        self.pools
            .get_mut(&TypeId::of::<T>())
            .and_then(|p| p.as_any_mut().downcast_mut::<ComponentPool<T>>())
    }

    fn registered_pool_mut<T: Component>(&mut self) -> &mut ComponentPool<T> {
        match self.pool_mut::<T>() {
            Some(pool) => pool,
            None => panic!(
                "component kind {} was never registered",
                std::any::type_name::<T>()
            ),
        }
    }

    /// Attach a default-constructed `T` to a live entity.
    ///
    /// # Panics
    /// If the entity is dead or `T` has no registered pool.
    pub fn insert<T: Component>(&mut self, entity: Entity) -> Result<Handle<T>, PoolError> {
        assert!(
            self.entities.is_alive(entity),
            "cannot insert component on dead entity {entity:?}"
        );
        self.registered_pool_mut::<T>().create(entity)
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        let pool = self.pool::<T>()?;
        pool.get(pool.handle_of(entity)?)
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        let pool = self.pool_mut::<T>()?;
        let handle = pool.handle_of(entity)?;
        pool.get_mut(handle)
    }

    /// Remove a component from an entity. Returns `true` if it was present.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> bool {
        self.pool_mut::<T>()
            .is_some_and(|pool| pool.remove(entity).is_some())
    }

    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.pool::<T>()
            .is_some_and(|pool| pool.handle_of(entity).is_some())
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
