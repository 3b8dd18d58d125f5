use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

use tracing::warn;

use crate::entity::Entity;
use crate::error::PoolError;

/// Component data stored in a [`ComponentPool`].
///
/// A component is constructed in place when its entity acquires it, so every
/// kind knows how to build its default state for a given owner.
pub trait Component: 'static + Send + Sync {
    fn for_entity(entity: Entity) -> Self;
}

/// Marks an entity index with no component in this pool.
const INVALID_SLOT: u32 = u32::MAX;

/// Typed reference to an entity's component in a [`ComponentPool`].
///
/// A handle holds no slot index: it resolves through the pool on every access,
/// so it stays correct across swap-removal of other entities.
pub struct Handle<T> {
    entity: Entity,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            _marker: PhantomData,
        }
    }

    /// The entity this handle refers to.
    pub fn entity(&self) -> Entity {
        self.entity
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.entity == other.entity
    }
}

impl<T> Eq for Handle<T> {}

impl<T> std::hash::Hash for Handle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.entity.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:?})", self.entity)
    }
}

/// Fixed-capacity dense storage for one component kind.
///
/// Live components occupy `data[0..len)`. `forward` maps entity index to slot
/// and `backward` maps slot to entity; destroying a slot moves the last live
/// component into the hole so the array stays packed.
pub struct ComponentPool<T> {
    forward: Vec<u32>,
    backward: Vec<Entity>,
    data: Vec<T>,
    capacity: usize,
}

impl<T: Component> ComponentPool<T> {
    /// Create an empty pool that holds at most `capacity` components.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            forward: Vec::new(),
            backward: Vec::with_capacity(capacity),
            data: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Slot currently mapped for this entity's index, whatever its generation.
    fn occupied_slot(&self, index: u32) -> Option<usize> {
        let slot = *self.forward.get(index as usize)?;
        ((slot as usize) < self.data.len()).then_some(slot as usize)
    }

    fn slot_of(&self, entity: Entity) -> Option<usize> {
        self.occupied_slot(entity.index)
            .filter(|&slot| self.backward[slot] == entity)
    }

    /// Give `entity` a freshly constructed component.
    ///
    /// If the entity already owns one, its handle is returned and the data is
    /// left untouched.
    pub fn create(&mut self, entity: Entity) -> Result<Handle<T>, PoolError> {
        if let Some(slot) = self.occupied_slot(entity.index) {
            let occupant = self.backward[slot];
            if occupant == entity {
                return Ok(Handle::new(entity));
            }
            return Err(PoolError::StaleEntity { entity, occupant });
        }

        if self.data.len() >= self.capacity {
            warn!(
                "{} pool full ({} slots), cannot add {}",
                std::any::type_name::<T>(),
                self.capacity,
                entity
            );
            return Err(PoolError::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        let index = entity.index as usize;
        if index >= self.forward.len() {
            self.forward.resize(index + 1, INVALID_SLOT);
        }

        let slot = self.data.len();
        self.data.push(T::for_entity(entity));
        self.backward.push(entity);
        self.forward[index] = slot as u32;
        Ok(Handle::new(entity))
    }

    /// Destroy the component behind `handle`.
    ///
    /// # Panics
    /// If the handle is not valid. Destroying a dead component is a bug in the
    /// caller, not a runtime condition.
    pub fn destroy(&mut self, handle: Handle<T>) {
        let Some(slot) = self.slot_of(handle.entity) else {
            panic!("destroy called with invalid handle {handle:?}");
        };
        self.remove_slot(slot);
    }

    /// Remove the entity's component if it has one, returning it.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let slot = self.slot_of(entity)?;
        Some(self.remove_slot(slot))
    }

    fn remove_slot(&mut self, slot: usize) -> T {
        let last = self.data.len() - 1;
        let removed = self.data.swap_remove(slot);
        let entity = self.backward.swap_remove(slot);
        self.forward[entity.index as usize] = INVALID_SLOT;

        if slot != last {
            let moved = self.backward[slot];
            self.forward[moved.index as usize] = slot as u32;
        }
        removed
    }

    /// Whether the handle currently resolves to a live component.
    pub fn is_valid(&self, handle: Handle<T>) -> bool {
        self.slot_of(handle.entity).is_some()
    }

    /// Handle for the entity's component, if it has one.
    pub fn handle_of(&self, entity: Entity) -> Option<Handle<T>> {
        self.slot_of(entity).map(|_| Handle::new(entity))
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.slot_of(handle.entity).map(|slot| &self.data[slot])
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.slot_of(handle.entity).map(|slot| &mut self.data[slot])
    }

    /// The dense array of live components, in slot order.
    pub fn components(&self) -> &[T] {
        &self.data
    }

    pub fn components_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Owning entity of each slot, parallel to [`Self::components`].
    pub fn entities(&self) -> &[Entity] {
        &self.backward
    }

    /// Iterate over all (entity, &component) pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.backward.iter().copied().zip(self.data.iter())
    }

    /// Iterate over all (entity, &mut component) pairs in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.backward.iter().copied().zip(self.data.iter_mut())
    }

    /// Number of live components.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every component.
    pub fn clear(&mut self) {
        for entity in self.backward.drain(..) {
            self.forward[entity.index as usize] = INVALID_SLOT;
        }
        self.data.clear();
    }
}

impl<T: Component> Index<Handle<T>> for ComponentPool<T> {
    type Output = T;

    fn index(&self, handle: Handle<T>) -> &T {
        match self.get(handle) {
            Some(component) => component,
            None => panic!("access through invalid handle {handle:?}"),
        }
    }
}

impl<T: Component> IndexMut<Handle<T>> for ComponentPool<T> {
    fn index_mut(&mut self, handle: Handle<T>) -> &mut T {
        match self.slot_of(handle.entity) {
            Some(slot) => &mut self.data[slot],
            None => panic!("access through invalid handle {handle:?}"),
        }
    }
}
