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

//! Defines the error taxonomy for the ECS runtime.
//!
//! Every variant describes a contract violation between engine subsystems
//! (a stale handle, a duplicate component, a capacity ceiling, ...). They are
//! reported as values so callers decide whether a violation is fatal.

use crate::ecs::entity::EntityHandle;
use thiserror::Error;

/// A convenient alias for results produced by the ECS runtime.
pub type EcsResult<T> = Result<T, EcsError>;

/// An error raised by the entity/component manager or its storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcsError {
    /// The handle's index is out of range, points at a free slot, or its
    /// version no longer matches the live entity in that slot.
    #[error("Stale or invalid entity handle {handle}")]
    StaleOrInvalidHandle {
        /// The rejected handle.
        handle: EntityHandle,
    },

    /// The entity already owns a component of this type.
    #[error("Entity {entity} already owns a '{component}' component")]
    DuplicateComponent {
        /// The entity the component was added to.
        entity: EntityHandle,
        /// The name of the component type.
        component: &'static str,
    },

    /// The entity does not own a component of this type.
    #[error("Entity {entity} does not own a '{component}' component")]
    MissingComponent {
        /// The entity that was queried.
        entity: EntityHandle,
        /// The name of the component type.
        component: &'static str,
    },

    /// A type-erased value was accessed as the wrong concrete type.
    #[error("Type mismatch: expected '{expected}', found '{actual}'")]
    TypeMismatch {
        /// The type the storage actually holds.
        expected: &'static str,
        /// The type the caller asked for.
        actual: &'static str,
    },

    /// A fixed-capacity container is full.
    #[error("Capacity of {capacity} exceeded for {resource}")]
    CapacityExceeded {
        /// What ran out of room (the entity table or a component array).
        resource: &'static str,
        /// The fixed capacity that was hit.
        capacity: usize,
    },

    /// Registering one more distinct component type would exceed the
    /// owned-type bitset.
    #[error("Cannot register more than {limit} component types")]
    ComponentTypeOverflow {
        /// The configured component type limit.
        limit: usize,
    },

    /// A component array slot is out of range or currently free.
    #[error("Slot {index} of the '{component}' array is empty")]
    EmptySlot {
        /// The name of the array's element type.
        component: &'static str,
        /// The requested slot.
        index: usize,
    },

    /// A view listed the same component type more than once.
    #[error("View requests '{component}' more than once")]
    AliasedViewComponent {
        /// The repeated component type.
        component: &'static str,
    },

    /// The manager was configured with unusable settings.
    #[error("Invalid ECS settings: {0}")]
    InvalidSettings(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_handle_display() {
        let err = EcsError::StaleOrInvalidHandle {
            handle: EntityHandle::new(1, 2),
        };
        assert_eq!(format!("{err}"), "Stale or invalid entity handle 1v2");
    }

    #[test]
    fn component_errors_name_the_component() {
        let entity = EntityHandle::new(0, 1);
        let duplicate = EcsError::DuplicateComponent {
            entity,
            component: "Position",
        };
        assert_eq!(
            format!("{duplicate}"),
            "Entity 0v1 already owns a 'Position' component"
        );

        let missing = EcsError::MissingComponent {
            entity,
            component: "Velocity",
        };
        assert_eq!(
            format!("{missing}"),
            "Entity 0v1 does not own a 'Velocity' component"
        );
    }

    #[test]
    fn capacity_and_overflow_display() {
        let capacity = EcsError::CapacityExceeded {
            resource: "entity table",
            capacity: 4,
        };
        assert_eq!(
            format!("{capacity}"),
            "Capacity of 4 exceeded for entity table"
        );

        let overflow = EcsError::ComponentTypeOverflow { limit: 64 };
        assert_eq!(
            format!("{overflow}"),
            "Cannot register more than 64 component types"
        );
    }
}
