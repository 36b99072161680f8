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

//! Implements Tessera's dense-array Entity-Component-System.
//!
//! Every component type gets a small integer ID from the manager's
//! [`ComponentRegistry`] and one fixed-capacity [`ComponentArray`]. Entities
//! live in an [`EntityTable`] of generational slots; each slot records a
//! 64-bit [`ComponentMask`] of the types it owns and where each component sits
//! in its array. Queries walk the table in slot order and keep the slots whose
//! mask is a superset of the requested one.
//!
//! The primary entry point is the [`EntityComponentManager`].

mod array;
mod component;
mod entity;
mod entity_table;
mod events;
mod iter;
mod manager;
mod mask;
mod registry;
mod view;

pub use array::{AnyComponentArray, ComponentArray};
pub use component::Component;
pub use entity::Entity;
pub use entity_table::{EntityData, EntityTable};
pub use events::EventSubscriptions;
pub use iter::EntityIterator;
pub use manager::EntityComponentManager;
pub use mask::ComponentMask;
pub use registry::{ComponentRegistry, ComponentType, ComponentTypeId};
pub use view::{ColumnPtr, ReadColumn, ReadView, ReadViewIter, View, ViewIter, ViewQuery};
