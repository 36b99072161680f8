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

//! Implements the fixed-capacity dense array that stores one component type.

use std::{
    any::{type_name, Any},
    collections::BTreeSet,
};

use tessera_core::{EcsError, EcsResult};

use crate::ecs::{Component, ComponentType};

/// Type-erased operations on a [`ComponentArray`].
///
/// The manager keeps one boxed array per component type and only knows the
/// concrete `T` at typed call sites. Everything it needs without `T`
/// (removal on entity deletion, introspection, dynamic access) goes through
/// this trait; typed access downcasts after checking [`element_type`].
///
/// [`element_type`]: AnyComponentArray::element_type
pub trait AnyComponentArray {
    /// Casts the trait object to `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Casts the trait object to `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// The descriptor of the stored component type.
    fn element_type(&self) -> ComponentType;

    /// The high-water mark of used slots.
    fn len(&self) -> usize;

    /// Returns true if no slot is in use.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The fixed number of slots.
    fn capacity(&self) -> usize;

    /// The number of slots currently holding a value.
    fn live_count(&self) -> usize;

    /// Returns the value in `index` as `&dyn Any`.
    fn get_any(&self, index: usize) -> EcsResult<&dyn Any>;

    /// Returns the value in `index` as `&mut dyn Any`.
    fn get_any_mut(&mut self, index: usize) -> EcsResult<&mut dyn Any>;

    /// Drops the value in `index` and frees the slot.
    fn remove_any(&mut self, index: usize) -> EcsResult<()>;
}

impl dyn AnyComponentArray {
    /// Downcasts to the concrete array, failing with [`EcsError::TypeMismatch`]
    /// if the array does not store `T`.
    pub fn downcast_ref<T: Component>(&self) -> EcsResult<&ComponentArray<T>> {
        let expected = self.element_type().name();
        self.as_any()
            .downcast_ref::<ComponentArray<T>>()
            .ok_or(EcsError::TypeMismatch {
                expected,
                actual: type_name::<T>(),
            })
    }

    /// Mutable counterpart of [`downcast_ref`](Self::downcast_ref).
    pub fn downcast_mut<T: Component>(&mut self) -> EcsResult<&mut ComponentArray<T>> {
        let expected = self.element_type().name();
        self.as_any_mut()
            .downcast_mut::<ComponentArray<T>>()
            .ok_or(EcsError::TypeMismatch {
                expected,
                actual: type_name::<T>(),
            })
    }
}

/// Dense storage for every instance of one component type.
///
/// The slot buffer is reserved to `capacity` (the manager's maximum entity
/// count) when the array is built and never grows past it, so references into
/// the array are not invalidated by reallocation.
///
/// Invariant: every index below [`len`](Self::len) that is not in the free
/// set holds a live value. Adding reuses the lowest free index or extends the
/// high-water mark; removing the last slot shrinks the high-water mark,
/// removing any other slot puts it in the free set.
pub struct ComponentArray<T: Component> {
    element_type: ComponentType,
    slots: Vec<Option<T>>,
    capacity: usize,
    free: BTreeSet<usize>,
}

impl<T: Component> ComponentArray<T> {
    /// Creates an empty array and reserves all `capacity` slots.
    ///
    /// Fails with [`EcsError::CapacityExceeded`] if the slot buffer cannot be
    /// allocated.
    pub fn new(element_type: ComponentType, capacity: usize) -> EcsResult<Self> {
        debug_assert!(element_type.is::<T>());
        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity).map_err(|err| {
            log::warn!(
                "Could not reserve {capacity} slots for '{}': {err}",
                element_type.name()
            );
            EcsError::CapacityExceeded {
                resource: element_type.name(),
                capacity,
            }
        })?;
        Ok(Self {
            element_type,
            slots,
            capacity,
            free: BTreeSet::new(),
        })
    }

    /// Stores `value` and returns its slot index.
    pub fn add(&mut self, value: T) -> EcsResult<usize> {
        self.add_with(|| value)
    }

    /// Picks a slot first, then builds the value directly into it.
    ///
    /// `make` is only called once a slot is known to be available, so a full
    /// array never constructs a value it cannot keep.
    pub fn add_with<F>(&mut self, make: F) -> EcsResult<usize>
    where
        F: FnOnce() -> T,
    {
        if let Some(index) = self.free.pop_first() {
            self.slots[index] = Some(make());
            return Ok(index);
        }

        if self.slots.len() >= self.capacity {
            return Err(EcsError::CapacityExceeded {
                resource: self.element_type.name(),
                capacity: self.capacity,
            });
        }

        self.slots.push(Some(make()));
        Ok(self.slots.len() - 1)
    }

    /// Returns the value stored in `index`.
    pub fn get(&self, index: usize) -> EcsResult<&T> {
        self.slots
            .get(index)
            .and_then(Option::as_ref)
            .ok_or(self.empty_slot(index))
    }

    /// Returns the value stored in `index` mutably.
    pub fn get_mut(&mut self, index: usize) -> EcsResult<&mut T> {
        let err = self.empty_slot(index);
        self.slots
            .get_mut(index)
            .and_then(Option::as_mut)
            .ok_or(err)
    }

    /// Removes and returns the value stored in `index`.
    pub fn remove(&mut self, index: usize) -> EcsResult<T> {
        let err = self.empty_slot(index);
        let value = self
            .slots
            .get_mut(index)
            .and_then(Option::take)
            .ok_or(err)?;

        if index + 1 == self.slots.len() {
            self.slots.pop();
        } else {
            self.free.insert(index);
        }
        Ok(value)
    }

    /// Returns true if `index` currently holds a value.
    pub fn is_occupied(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Some(_)))
    }

    /// Iterates the freed slots below the high-water mark, lowest first.
    pub fn free_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.free.iter().copied()
    }

    /// The high-water mark of used slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no slot has been used since the last shrink to zero.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The fixed number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of slots currently holding a value.
    pub fn live_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// The descriptor of the stored component type.
    pub fn element_type(&self) -> ComponentType {
        self.element_type
    }

    /// Returns the base pointer and length of the slot buffer.
    ///
    /// Views use this to hand out references to individual slots without
    /// re-borrowing the whole array for every entity.
    pub(crate) fn raw_slots(&mut self) -> (*mut Option<T>, usize) {
        (self.slots.as_mut_ptr(), self.slots.len())
    }

    fn empty_slot(&self, index: usize) -> EcsError {
        EcsError::EmptySlot {
            component: self.element_type.name(),
            index,
        }
    }
}

impl<T: Component> AnyComponentArray for ComponentArray<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn element_type(&self) -> ComponentType {
        self.element_type
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn live_count(&self) -> usize {
        ComponentArray::live_count(self)
    }

    fn get_any(&self, index: usize) -> EcsResult<&dyn Any> {
        self.get(index).map(|value| value as &dyn Any)
    }

    fn get_any_mut(&mut self, index: usize) -> EcsResult<&mut dyn Any> {
        self.get_mut(index).map(|value| value as &mut dyn Any)
    }

    fn remove_any(&mut self, index: usize) -> EcsResult<()> {
        self.remove(index).map(drop)
    }
}
