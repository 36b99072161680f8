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

use tessera_core::{EcsResult, EntityHandle, EventId};

use crate::ecs::{Component, EntityComponentManager};

/// A convenience facade binding an [`EntityHandle`] to the manager that
/// issued it.
///
/// Every call forwards to the matching [`EntityComponentManager`] operation,
/// so a stale handle fails here exactly as it would on the manager.
pub struct Entity<'m> {
    manager: &'m mut EntityComponentManager,
    handle: EntityHandle,
}

impl<'m> Entity<'m> {
    pub(crate) fn new(manager: &'m mut EntityComponentManager, handle: EntityHandle) -> Self {
        Self { manager, handle }
    }

    /// The handle this facade wraps.
    pub fn handle(&self) -> EntityHandle {
        self.handle
    }

    /// Returns true while the wrapped entity is alive.
    pub fn is_valid(&self) -> bool {
        self.manager.is_valid(self.handle)
    }

    /// See [`EntityComponentManager::is_visible`].
    pub fn is_visible(&self) -> EcsResult<bool> {
        self.manager.is_visible(self.handle)
    }

    /// Marks the entity visible.
    pub fn show(&mut self) -> EcsResult<()> {
        self.manager.set_visible(self.handle, true)
    }

    /// Marks the entity hidden.
    pub fn hide(&mut self) -> EcsResult<()> {
        self.manager.set_visible(self.handle, false)
    }

    /// Deletes the entity, consuming the facade.
    pub fn delete(self) -> EcsResult<()> {
        self.manager.delete_entity(self.handle)
    }

    /// See [`EntityComponentManager::add_component`].
    pub fn add_component<T: Component>(&mut self, value: T) -> EcsResult<&mut T> {
        self.manager.add_component(self.handle, value)
    }

    /// See [`EntityComponentManager::add_component_with`].
    pub fn add_component_with<T, F>(&mut self, make: F) -> EcsResult<&mut T>
    where
        T: Component,
        F: FnOnce() -> T,
    {
        self.manager.add_component_with(self.handle, make)
    }

    /// Builder-style add that keeps the facade for chaining.
    pub fn with<T: Component>(self, value: T) -> EcsResult<Self> {
        self.manager.add_component(self.handle, value)?;
        Ok(self)
    }

    /// See [`EntityComponentManager::get_component`].
    pub fn get_component<T: Component>(&self) -> EcsResult<&T> {
        self.manager.get_component(self.handle)
    }

    /// See [`EntityComponentManager::get_component_mut`].
    pub fn get_component_mut<T: Component>(&mut self) -> EcsResult<&mut T> {
        self.manager.get_component_mut(self.handle)
    }

    /// See [`EntityComponentManager::remove_component`].
    pub fn remove_component<T: Component>(&mut self) -> EcsResult<T> {
        self.manager.remove_component(self.handle)
    }

    /// See [`EntityComponentManager::contains_component`].
    pub fn contains_component<T: Component>(&self) -> bool {
        self.manager.contains_component::<T>(self.handle)
    }

    /// See [`EntityComponentManager::subscribe_event`].
    pub fn subscribe_event<A, F>(&mut self, event: EventId, handler: F) -> EcsResult<()>
    where
        A: 'static,
        F: Fn(&A) + 'static,
    {
        self.manager.subscribe_event(self.handle, event, handler)
    }

    /// See [`EntityComponentManager::unsubscribe_event`].
    pub fn unsubscribe_event(&mut self, event: EventId) -> EcsResult<()> {
        self.manager.unsubscribe_event(self.handle, event)
    }

    /// See [`EntityComponentManager::trigger_event`].
    pub fn trigger_event<A: 'static>(&self, event: EventId, args: &A) -> EcsResult<()> {
        self.manager.trigger_event(self.handle, event, args)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use tessera_core::EcsError;

    use super::*;

    #[derive(Debug, PartialEq)]
    struct Tag(u8);
    impl Component for Tag {}

    #[test]
    fn facade_forwards_to_manager() {
        let mut ecm = EntityComponentManager::with_max_entities(4).unwrap();
        let mut entity = ecm.spawn().unwrap().with(Tag(1)).unwrap();

        assert!(entity.is_valid());
        assert!(entity.contains_component::<Tag>());
        entity.get_component_mut::<Tag>().unwrap().0 = 2;
        assert_eq!(entity.get_component::<Tag>(), Ok(&Tag(2)));

        entity.hide().unwrap();
        assert_eq!(entity.is_visible(), Ok(false));
        entity.show().unwrap();
        assert_eq!(entity.is_visible(), Ok(true));

        let handle = entity.handle();
        assert_eq!(entity.remove_component::<Tag>(), Ok(Tag(2)));
        entity.delete().unwrap();
        assert!(!ecm.is_valid(handle));
    }

    #[test]
    fn facade_events() {
        let mut ecm = EntityComponentManager::with_max_entities(4).unwrap();
        let hits = Rc::new(Cell::new(0));
        let event = EventId::new(1);

        let mut entity = ecm.spawn().unwrap();
        let counter = Rc::clone(&hits);
        entity
            .subscribe_event(event, move |amount: &i32| counter.set(counter.get() + amount))
            .unwrap();
        entity.trigger_event(event, &5).unwrap();
        entity.unsubscribe_event(event).unwrap();
        entity.trigger_event(event, &5).unwrap();

        assert_eq!(hits.get(), 5);
    }

    #[test]
    fn stale_facade_fails() {
        let mut ecm = EntityComponentManager::with_max_entities(4).unwrap();
        let handle = ecm.create_entity().unwrap();
        ecm.delete_entity(handle).unwrap();

        let mut entity = ecm.entity(handle);
        assert!(!entity.is_valid());
        assert_eq!(
            entity.add_component(Tag(0)).map(|_| ()),
            Err(EcsError::StaleOrInvalidHandle { handle })
        );
    }
}
