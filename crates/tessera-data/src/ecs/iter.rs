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

use std::iter::FusedIterator;

use tessera_core::EntityHandle;

use crate::ecs::{EntityData, EntityTable};

/// Walks the live slots of an [`EntityTable`] in ascending index order.
///
/// Free slots are skipped. The order is slot order, so it is not stable
/// across deletions and creations that recycle slots.
#[derive(Clone)]
pub struct EntityIterator<'a> {
    table: &'a EntityTable,
    index: usize,
}

impl<'a> EntityIterator<'a> {
    pub(crate) fn new(table: &'a EntityTable) -> Self {
        Self { table, index: 0 }
    }

    /// Advances to the next live slot and returns its handle and data.
    pub(crate) fn next_slot(&mut self) -> Option<(EntityHandle, &'a EntityData)> {
        while self.index < self.table.len() {
            let index = self.index;
            self.index += 1;
            if let Some(data) = self.table.slot(index) {
                return Some((EntityHandle::new(index, data.version), data));
            }
        }
        None
    }

    /// Returns true once every slot has been visited.
    pub fn is_end(&self) -> bool {
        self.index >= self.table.len()
    }
}

impl Iterator for EntityIterator<'_> {
    type Item = EntityHandle;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_slot().map(|(handle, _)| handle)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.table.len().saturating_sub(self.index)))
    }
}

impl FusedIterator for EntityIterator<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_free_slots() {
        let mut table = EntityTable::new(8).unwrap();
        let handles: Vec<_> = (0..5).map(|_| table.allocate().unwrap()).collect();
        table.release(handles[0]).unwrap();
        table.release(handles[3]).unwrap();

        let seen: Vec<_> = EntityIterator::new(&table).collect();
        assert_eq!(seen, vec![handles[1], handles[2], handles[4]]);
    }

    #[test]
    fn empty_table_ends_immediately() {
        let table = EntityTable::new(4).unwrap();
        let mut iter = EntityIterator::new(&table);
        assert!(iter.is_end());
        assert_eq!(iter.next(), None);
    }
}
