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

use std::{
    any::{type_name, TypeId},
    collections::HashMap,
    fmt,
};

use tessera_core::{ecs::COMPONENT_TYPE_CEILING, EcsError, EcsResult};

use crate::ecs::{AnyComponentArray, Component, ComponentArray};

/// The small integer ID assigned to a component type.
///
/// IDs are handed out sequentially starting at 0 and index both the owned-type
/// [`ComponentMask`](crate::ecs::ComponentMask) and the manager's array table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(u8);

impl ComponentTypeId {
    /// Creates an ID from its raw value.
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// Returns the raw value of the ID.
    pub const fn raw(&self) -> u8 {
        self.0
    }

    /// Returns the ID as an index into per-type tables.
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type ArrayFactory = fn(ComponentType, usize) -> EcsResult<Box<dyn AnyComponentArray>>;

fn create_array_for<T: Component>(
    element_type: ComponentType,
    capacity: usize,
) -> EcsResult<Box<dyn AnyComponentArray>> {
    let array = ComponentArray::<T>::new(element_type, capacity)?;
    Ok(Box::new(array))
}

/// The immutable descriptor of a registered component type.
///
/// Exactly one descriptor exists per component type and registry. It carries
/// the factory that builds a correctly typed [`ComponentArray`] behind a
/// type-erased box, so the manager can allocate storage without knowing `T`.
#[derive(Clone, Copy)]
pub struct ComponentType {
    id: ComponentTypeId,
    name: &'static str,
    type_id: TypeId,
    factory: ArrayFactory,
}

impl ComponentType {
    fn of<T: Component>(id: ComponentTypeId) -> Self {
        Self {
            id,
            name: type_name::<T>(),
            type_id: TypeId::of::<T>(),
            factory: create_array_for::<T>,
        }
    }

    /// The ID assigned to this type.
    pub fn id(&self) -> ComponentTypeId {
        self.id
    }

    /// A human-readable name for debugging.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The Rust `TypeId` of the component.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns true if this descriptor belongs to `T`.
    pub fn is<T: Component>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Builds an empty dense array for this type with a fixed capacity.
    ///
    /// Fails with [`EcsError::CapacityExceeded`] if the slots cannot be reserved.
    pub fn create_array(&self, capacity: usize) -> EcsResult<Box<dyn AnyComponentArray>> {
        (self.factory)(*self, capacity)
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentType")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.type_id == other.type_id
    }
}

impl Eq for ComponentType {}

/// Assigns component types their IDs on first use.
///
/// The registry is owned by a manager rather than being process-global, and it
/// refuses to hand out more IDs than the configured limit (at most 64, the
/// width of the owned-type bitset).
#[derive(Debug)]
pub struct ComponentRegistry {
    types: Vec<ComponentType>,
    by_type: HashMap<TypeId, ComponentTypeId>,
    limit: usize,
}

impl ComponentRegistry {
    /// Creates an empty registry that accepts at most `limit` distinct types.
    ///
    /// The limit is clamped to the 64-bit width of the owned-type bitset.
    pub fn new(limit: usize) -> Self {
        let limit = limit.min(COMPONENT_TYPE_CEILING);
        Self {
            types: Vec::with_capacity(limit),
            by_type: HashMap::with_capacity(limit),
            limit,
        }
    }

    /// Returns the descriptor for `T`, registering it if this is its first use.
    ///
    /// Idempotent: every call for the same `T` yields the same ID. Fails with
    /// [`EcsError::ComponentTypeOverflow`] once the limit has been reached.
    pub fn register<T: Component>(&mut self) -> EcsResult<ComponentType> {
        if let Some(id) = self.by_type.get(&TypeId::of::<T>()) {
            return Ok(self.types[id.index()]);
        }

        if self.types.len() >= self.limit {
            log::warn!(
                "Component type limit of {} reached while registering '{}'.",
                self.limit,
                type_name::<T>()
            );
            return Err(EcsError::ComponentTypeOverflow { limit: self.limit });
        }

        let id = ComponentTypeId::new(self.types.len() as u8);
        let component_type = ComponentType::of::<T>(id);
        self.types.push(component_type);
        self.by_type.insert(component_type.type_id, id);
        log::debug!("Registered component type '{}' as {id}.", component_type.name);
        Ok(component_type)
    }

    /// Returns the ID of `T`, registering it if this is its first use.
    pub fn id_of<T: Component>(&mut self) -> EcsResult<ComponentTypeId> {
        self.register::<T>().map(|component_type| component_type.id)
    }

    /// Looks up the ID of `T` without registering it.
    pub fn lookup<T: Component>(&self) -> Option<ComponentTypeId> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Looks up the descriptor of `T` without registering it.
    pub fn get_type<T: Component>(&self) -> Option<ComponentType> {
        self.lookup::<T>().map(|id| self.types[id.index()])
    }

    /// Returns the descriptor registered under `id`.
    pub fn get(&self, id: ComponentTypeId) -> Option<ComponentType> {
        self.types.get(id.index()).copied()
    }

    /// Iterates every registered descriptor in ID order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentType> {
        self.types.iter()
    }

    /// The number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if no type has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// The maximum number of types this registry accepts.
    pub fn limit(&self) -> usize {
        self.limit
    }
}
