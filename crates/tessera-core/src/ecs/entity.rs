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

//! Defines the generational handle used to refer to entities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A generational reference to an entity slot.
///
/// It pairs a slot index with the version stamped onto that slot when the
/// entity was created. Versions come from a single counter shared by every
/// slot and are never reused, so once an entity is deleted and its slot is
/// recycled, old handles pointing at that index no longer match the slot's
/// version and are rejected instead of silently aliasing the new entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityHandle {
    index: usize,
    version: u64,
}

impl EntityHandle {
    /// The handle that represents "no entity".
    ///
    /// Live entities start at version 1, so `NULL` never matches a live slot.
    pub const NULL: EntityHandle = EntityHandle {
        index: 0,
        version: 0,
    };

    /// Creates a handle from a raw slot index and version.
    pub const fn new(index: usize, version: u64) -> Self {
        Self { index, version }
    }

    /// The index of the entity's slot in the entity table.
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The version stamped onto the slot when the entity was created.
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Returns `true` if this is the [`EntityHandle::NULL`] handle.
    pub const fn is_null(&self) -> bool {
        self.version == 0
    }
}

impl Default for EntityHandle {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.version)
    }
}
