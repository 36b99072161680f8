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

//! Implements the fixed-width bitset recording which component types an entity owns.

use crate::ecs::ComponentTypeId;

/// A 64-bit set of component type IDs.
///
/// Bit `i` is set when the entity owns the component whose ID is `i`. Views
/// precompute the mask of the types they request and keep an entity when
/// `owned & required == required`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentMask(u64);

impl ComponentMask {
    /// The mask with no bits set.
    pub const EMPTY: ComponentMask = ComponentMask(0);

    /// Sets the bit for the given component type.
    pub fn set(&mut self, id: ComponentTypeId) {
        self.0 |= 1 << id.index();
    }

    /// Clears the bit for the given component type.
    pub fn clear(&mut self, id: ComponentTypeId) {
        self.0 &= !(1 << id.index());
    }

    /// Returns true if the bit for the given component type is set.
    pub fn contains(&self, id: ComponentTypeId) -> bool {
        (self.0 & (1 << id.index())) != 0
    }

    /// Returns true if every bit set in `required` is also set in `self`.
    pub fn contains_all(&self, required: ComponentMask) -> bool {
        self.0 & required.0 == required.0
    }

    /// Returns true if no bit is set.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns the number of bits set.
    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    /// Iterates the component type IDs whose bit is set, lowest first.
    pub fn ids(&self) -> impl Iterator<Item = ComponentTypeId> {
        let bits = self.0;
        (0..64u8)
            .filter(move |i| bits & (1 << i) != 0)
            .map(ComponentTypeId::new)
    }
}
