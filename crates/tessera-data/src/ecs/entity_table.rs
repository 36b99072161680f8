// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Internal entity storage and handle management.

use std::collections::{BTreeSet, HashMap};

use tessera_core::{EcsError, EcsResult, EntityHandle};

use crate::ecs::{ComponentMask, ComponentTypeId};

/// The per-slot record of a live entity.
///
/// It acts as a table of contents for the entity: which component types it
/// owns and where each of those components lives in its type's array.
#[derive(Debug, Clone)]
pub struct EntityData {
    pub(crate) version: u64,
    pub(crate) is_visible: bool,
    pub(crate) owned: ComponentMask,
    pub(crate) component_indices: HashMap<ComponentTypeId, usize>,
}

impl EntityData {
    fn new(version: u64) -> Self {
        Self {
            version,
            is_visible: true,
            owned: ComponentMask::EMPTY,
            component_indices: HashMap::new(),
        }
    }

    /// The version stamped onto the slot when this entity was created.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether external systems should process this entity.
    pub fn is_visible(&self) -> bool {
        self.is_visible
    }

    /// The set of component types this entity owns.
    pub fn owned_types(&self) -> ComponentMask {
        self.owned
    }

    /// The slot of this entity's component in the array of type `id`.
    pub fn component_index(&self, id: ComponentTypeId) -> Option<usize> {
        self.component_indices.get(&id).copied()
    }
}

/// Fixed-capacity table of entity slots.
///
/// Slots are allocated lowest-free-first and every allocation stamps the slot
/// with the next value of a table-wide version counter, starting at 1. A
/// handle is valid only while its index is live and its version matches the
/// slot's, so handles to deleted entities are rejected even after the slot is
/// reused.
#[derive(Debug, Clone)]
pub struct EntityTable {
    entities: Vec<Option<EntityData>>,
    capacity: usize,
    next_version: u64,
    free_slots: BTreeSet<usize>,
}

impl EntityTable {
    /// Creates an empty table that holds at most `capacity` entities.
    ///
    /// Every slot is reserved up front. Fails with
    /// [`EcsError::CapacityExceeded`] if that reservation cannot be made.
    pub fn new(capacity: usize) -> EcsResult<Self> {
        let mut entities = Vec::new();
        entities.try_reserve_exact(capacity).map_err(|err| {
            log::warn!("Could not reserve {capacity} entity slots: {err}");
            EcsError::CapacityExceeded {
                resource: "entity table",
                capacity,
            }
        })?;
        Ok(Self {
            entities,
            capacity,
            next_version: 1,
            free_slots: BTreeSet::new(),
        })
    }

    /// Allocates a slot for a new entity.
    ///
    /// Reuses the lowest free slot if there is one, otherwise extends the
    /// table. Fails with [`EcsError::CapacityExceeded`] when every slot up to
    /// the capacity is live.
    pub fn allocate(&mut self) -> EcsResult<EntityHandle> {
        let index = match self.free_slots.pop_first() {
            Some(index) => index,
            None if self.entities.len() < self.capacity => {
                self.entities.push(None);
                self.entities.len() - 1
            }
            None => {
                return Err(EcsError::CapacityExceeded {
                    resource: "entity table",
                    capacity: self.capacity,
                })
            }
        };

        let version = self.next_version;
        self.next_version += 1;
        self.entities[index] = Some(EntityData::new(version));
        Ok(EntityHandle::new(index, version))
    }

    /// Frees the slot `handle` points at and returns its data.
    ///
    /// The last slot shrinks the table; any other slot joins the free set.
    pub fn release(&mut self, handle: EntityHandle) -> EcsResult<EntityData> {
        self.get(handle)?;
        let index = handle.index();
        let data = self.entities[index]
            .take()
            .ok_or(EcsError::StaleOrInvalidHandle { handle })?;

        if index + 1 == self.entities.len() {
            self.entities.pop();
        } else {
            self.free_slots.insert(index);
        }
        Ok(data)
    }

    /// Returns true if `handle` refers to the live entity in its slot.
    pub fn is_valid(&self, handle: EntityHandle) -> bool {
        self.get(handle).is_ok()
    }

    /// Returns the data of the entity `handle` refers to.
    pub fn get(&self, handle: EntityHandle) -> EcsResult<&EntityData> {
        self.slot(handle.index())
            .filter(|data| data.version == handle.version())
            .ok_or(EcsError::StaleOrInvalidHandle { handle })
    }

    /// Mutable counterpart of [`get`](Self::get).
    pub fn get_mut(&mut self, handle: EntityHandle) -> EcsResult<&mut EntityData> {
        self.entities
            .get_mut(handle.index())
            .and_then(Option::as_mut)
            .filter(|data| data.version == handle.version())
            .ok_or(EcsError::StaleOrInvalidHandle { handle })
    }

    /// Returns the live entity in slot `index`, if any.
    pub fn slot(&self, index: usize) -> Option<&EntityData> {
        self.entities.get(index).and_then(Option::as_ref)
    }

    /// Returns true if `index` is below the high-water mark but not live.
    pub fn is_free(&self, index: usize) -> bool {
        self.free_slots.contains(&index)
    }

    /// The high-water mark of used slots.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if no slot is in use.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The number of live entities.
    pub fn live_count(&self) -> usize {
        self.entities.len() - self.free_slots.len()
    }

    /// The fixed maximum number of entities.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
