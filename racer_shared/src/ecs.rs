//! Entity ids and component storage for host-spawned actors.
//!
//! Each component type lives in its own [`ComponentStore`], an ordered map
//! keyed by [`EntityId`]. Iteration follows id order, which is spawn order,
//! so a simulation step visits actors the same way every run.

use std::collections::{btree_map, BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::math::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// Allocates ids and tracks which are alive. Ids are never reused.
#[derive(Debug, Default)]
pub struct Entities {
    next_id: u64,
    alive: BTreeSet<EntityId>,
}

impl Entities {
    pub fn spawn(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.alive.insert(id);
        id
    }

    /// Returns false if the entity was not alive.
    pub fn despawn(&mut self, entity: EntityId) -> bool {
        self.alive.remove(&entity)
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.alive.contains(&entity)
    }

    pub fn len(&self) -> usize {
        self.alive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alive.is_empty()
    }
}

/// Components of one type.
#[derive(Debug, Clone)]
pub struct ComponentStore<T> {
    items: BTreeMap<EntityId, T>,
}

impl<T> Default for ComponentStore<T> {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }
}

impl<T> ComponentStore<T> {
    /// Inserts or replaces, returning the previous component.
    pub fn insert(&mut self, entity: EntityId, component: T) -> Option<T> {
        self.items.insert(entity, component)
    }

    pub fn remove(&mut self, entity: EntityId) -> Option<T> {
        self.items.remove(&entity)
    }

    pub fn get(&self, entity: EntityId) -> Option<&T> {
        self.items.get(&entity)
    }

    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut T> {
        self.items.get_mut(&entity)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.items.iter().map(|(id, c)| (*id, c))
    }

    pub fn iter_mut(&mut self) -> btree_map::IterMut<'_, EntityId, T> {
        self.items.iter_mut()
    }
}

/// Linear velocity in units per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Velocity(pub Vec3);

/// Seconds left before the host removes the entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lifespan(pub f32);
