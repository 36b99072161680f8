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

use std::any::{type_name, Any};

use tessera_core::{EcsError, EcsResult, EcsSettings, EntityHandle, EventId};

use crate::ecs::{
    AnyComponentArray, Component, ComponentArray, ComponentRegistry, ComponentType,
    ComponentTypeId, Entity, EntityData, EntityIterator, EntityTable, EventSubscriptions,
    ReadView, View, ViewQuery,
};

/// The central container of the ECS: entities, their components and their
/// event subscriptions.
///
/// The manager exclusively owns the [`EntityTable`], one [`ComponentArray`]
/// per registered component type and the subscription map. It is the only
/// place that mutates an entity's owned-type mask or component slots, which
/// keeps the mask, the slot map and the arrays consistent.
pub struct EntityComponentManager {
    settings: EcsSettings,
    registry: ComponentRegistry,
    /// One array per component type ID, created on the first add of that type.
    arrays: Vec<Option<Box<dyn AnyComponentArray>>>,
    table: EntityTable,
    subscriptions: EventSubscriptions,
}

impl EntityComponentManager {
    /// Creates a manager with the given fixed capacities.
    pub fn new(settings: EcsSettings) -> EcsResult<Self> {
        settings.validate()?;
        log::info!(
            "EntityComponentManager initialized (max_entities={}, max_component_types={}).",
            settings.max_entities,
            settings.max_component_types
        );
        Self::from_valid_settings(settings)
    }

    /// Creates a manager holding at most `max_entities` entities.
    pub fn with_max_entities(max_entities: usize) -> EcsResult<Self> {
        Self::new(EcsSettings::with_max_entities(max_entities))
    }

    fn from_valid_settings(settings: EcsSettings) -> EcsResult<Self> {
        Ok(Self {
            settings,
            registry: ComponentRegistry::new(settings.max_component_types),
            arrays: (0..settings.max_component_types).map(|_| None).collect(),
            table: EntityTable::new(settings.max_entities)?,
            subscriptions: EventSubscriptions::new(),
        })
    }

    /// The settings the manager was built with.
    pub fn settings(&self) -> &EcsSettings {
        &self.settings
    }

    /// The maximum number of simultaneously live entities.
    pub fn max_entity_count(&self) -> usize {
        self.settings.max_entities
    }

    /// The maximum number of distinct component types.
    pub fn max_component_types(&self) -> usize {
        self.settings.max_component_types
    }

    // --- Entity lifecycle ---

    /// Creates an entity and returns its handle.
    ///
    /// Reuses the lowest free slot if one exists. Fails with
    /// [`EcsError::CapacityExceeded`] when the table is full.
    pub fn create_entity(&mut self) -> EcsResult<EntityHandle> {
        let handle = self.table.allocate().inspect_err(|_| {
            log::warn!(
                "Entity table is full ({} entities).",
                self.settings.max_entities
            );
        })?;
        log::debug!("Created entity {handle}.");
        Ok(handle)
    }

    /// Creates an entity and returns a facade over it.
    pub fn spawn(&mut self) -> EcsResult<Entity<'_>> {
        let handle = self.create_entity()?;
        Ok(Entity::new(self, handle))
    }

    /// Deletes an entity.
    ///
    /// Every component it owns is removed from its array, its slot is freed
    /// and all event subscriptions made through its handle are dropped.
    pub fn delete_entity(&mut self, handle: EntityHandle) -> EcsResult<()> {
        let data = self.table.release(handle)?;

        for id in data.owned.ids() {
            let array = self.arrays.get_mut(id.index()).and_then(|a| a.as_deref_mut());
            match (array, data.component_index(id)) {
                (Some(array), Some(index)) => {
                    if let Err(err) = array.remove_any(index) {
                        log::error!("Failed to release component {id} of entity {handle}: {err}");
                    }
                }
                _ => log::error!("Entity {handle} owns component {id} without a stored slot."),
            }
        }
        self.subscriptions.remove_entity(handle.version());

        log::debug!(
            "Deleted entity {handle} ({} components released).",
            data.owned.count()
        );
        Ok(())
    }

    /// Returns true if `handle` refers to a live entity.
    pub fn is_valid(&self, handle: EntityHandle) -> bool {
        self.table.is_valid(handle)
    }

    /// The number of live entities.
    pub fn live_entity_count(&self) -> usize {
        self.table.live_count()
    }

    /// Returns a facade over an existing entity.
    ///
    /// The handle is not checked here; every facade call validates it.
    pub fn entity(&mut self, handle: EntityHandle) -> Entity<'_> {
        Entity::new(self, handle)
    }

    /// Read access to the entity table.
    pub fn entity_table(&self) -> &EntityTable {
        &self.table
    }

    /// Returns the bookkeeping record of a live entity.
    pub fn entity_data(&self, handle: EntityHandle) -> EcsResult<&EntityData> {
        self.table.get(handle)
    }

    // --- Visibility ---

    /// Whether external systems should process the entity.
    pub fn is_visible(&self, handle: EntityHandle) -> EcsResult<bool> {
        Ok(self.table.get(handle)?.is_visible)
    }

    /// Sets the entity's visibility flag. It does not affect views.
    pub fn set_visible(&mut self, handle: EntityHandle, visible: bool) -> EcsResult<()> {
        self.table.get_mut(handle)?.is_visible = visible;
        Ok(())
    }

    // --- Component types ---

    /// Registers `T` ahead of its first use and returns its ID.
    pub fn register_component<T: Component>(&mut self) -> EcsResult<ComponentTypeId> {
        self.registry.id_of::<T>()
    }

    /// The descriptor of `T`, if it has been registered.
    pub fn component_type_of<T: Component>(&self) -> Option<ComponentType> {
        self.registry.get_type::<T>()
    }

    /// Iterates every registered component type in ID order.
    pub fn component_types(&self) -> impl Iterator<Item = &ComponentType> {
        self.registry.iter()
    }

    /// The dense array storing every `T`, if one has been created.
    pub fn component_array<T: Component>(&self) -> Option<&ComponentArray<T>> {
        let id = self.registry.lookup::<T>()?;
        self.array(id)?.downcast_ref::<T>().ok()
    }

    // --- Components ---

    /// Attaches `value` to the entity and returns a reference to the stored
    /// component.
    ///
    /// Fails with [`EcsError::DuplicateComponent`] if the entity already owns
    /// a `T`.
    pub fn add_component<T: Component>(
        &mut self,
        handle: EntityHandle,
        value: T,
    ) -> EcsResult<&mut T> {
        self.add_component_with(handle, || value)
    }

    /// Attaches a component built by `make` directly in its array slot.
    ///
    /// `make` only runs once the handle, uniqueness and capacity checks pass.
    pub fn add_component_with<T, F>(&mut self, handle: EntityHandle, make: F) -> EcsResult<&mut T>
    where
        T: Component,
        F: FnOnce() -> T,
    {
        let data = self.table.get(handle)?;
        if let Some(id) = self.registry.lookup::<T>() {
            if data.owned.contains(id) {
                return Err(EcsError::DuplicateComponent {
                    entity: handle,
                    component: type_name::<T>(),
                });
            }
        }

        let component_type = self.registry.register::<T>()?;
        let id = component_type.id();
        let capacity = self.settings.max_entities;
        let array = match &mut self.arrays[id.index()] {
            Some(array) => array,
            slot => {
                let created = component_type.create_array(capacity)?;
                log::debug!(
                    "Created component array for '{}' (capacity {capacity}).",
                    component_type.name()
                );
                slot.insert(created)
            }
        }
        .downcast_mut::<T>()?;
        let index = array.add_with(make)?;

        let data = self.table.get_mut(handle)?;
        data.owned.set(id);
        data.component_indices.insert(id, index);
        log::trace!("Added '{}' to entity {handle} (slot {index}).", component_type.name());

        array.get_mut(index)
    }

    /// Returns the entity's `T`.
    pub fn get_component<T: Component>(&self, handle: EntityHandle) -> EcsResult<&T> {
        let (id, index) = self.locate::<T>(handle)?;
        self.typed_array::<T>(handle, id)?.get(index)
    }

    /// Returns the entity's `T` mutably.
    pub fn get_component_mut<T: Component>(&mut self, handle: EntityHandle) -> EcsResult<&mut T> {
        let (id, index) = self.locate::<T>(handle)?;
        self.typed_array_mut::<T>(handle, id)?.get_mut(index)
    }

    /// Detaches the entity's `T` and returns it.
    pub fn remove_component<T: Component>(&mut self, handle: EntityHandle) -> EcsResult<T> {
        let (id, index) = self.locate::<T>(handle)?;
        let value = self.typed_array_mut::<T>(handle, id)?.remove(index)?;
        self.forget_component(handle, id)?;
        log::trace!("Removed '{}' from entity {handle}.", type_name::<T>());
        Ok(value)
    }

    /// Returns true if the entity owns a `T`.
    ///
    /// A bitset test only: no array is touched. Stale handles own nothing.
    pub fn contains_component<T: Component>(&self, handle: EntityHandle) -> bool {
        self.registry
            .lookup::<T>()
            .is_some_and(|id| self.contains_component_id(handle, id))
    }

    /// Returns true if the entity owns a component of type `id`.
    pub fn contains_component_id(&self, handle: EntityHandle, id: ComponentTypeId) -> bool {
        self.table
            .get(handle)
            .is_ok_and(|data| data.owned.contains(id))
    }

    /// Returns the entity's component of type `id` without naming its type.
    pub fn get_component_dyn(
        &self,
        handle: EntityHandle,
        id: ComponentTypeId,
    ) -> EcsResult<&dyn Any> {
        let index = self.locate_id(handle, id)?;
        self.array(id)
            .ok_or_else(|| self.missing(handle, id))?
            .get_any(index)
    }

    /// Detaches and drops the entity's component of type `id`.
    pub fn remove_component_by_id(
        &mut self,
        handle: EntityHandle,
        id: ComponentTypeId,
    ) -> EcsResult<()> {
        let index = self.locate_id(handle, id)?;
        let missing = self.missing(handle, id);
        self.arrays
            .get_mut(id.index())
            .and_then(|array| array.as_deref_mut())
            .ok_or(missing)?
            .remove_any(index)?;
        self.forget_component(handle, id)?;
        log::trace!("Removed component {id} from entity {handle}.");
        Ok(())
    }

    // --- Events ---

    /// Appends `handler` to the entity's handlers for `event`.
    ///
    /// The subscription is keyed by the handle's version, so it can never be
    /// triggered through a later entity that reuses the slot.
    pub fn subscribe_event<A, F>(
        &mut self,
        handle: EntityHandle,
        event: EventId,
        handler: F,
    ) -> EcsResult<()>
    where
        A: 'static,
        F: Fn(&A) + 'static,
    {
        self.table.get(handle)?;
        self.subscriptions.subscribe(handle.version(), event, handler);
        Ok(())
    }

    /// Removes every handler the entity has for `event`.
    pub fn unsubscribe_event(&mut self, handle: EntityHandle, event: EventId) -> EcsResult<()> {
        self.table.get(handle)?;
        let removed = self.subscriptions.unsubscribe(handle.version(), event);
        log::trace!("Unsubscribed {removed} handler(s) of {event} from entity {handle}.");
        Ok(())
    }

    /// Invokes the entity's handlers for `event` in subscription order.
    ///
    /// Handlers cannot stop later handlers from running. Fails with
    /// [`EcsError::TypeMismatch`], before any handler runs, if a handler was
    /// subscribed with a different argument type.
    pub fn trigger_event<A: 'static>(
        &self,
        handle: EntityHandle,
        event: EventId,
        args: &A,
    ) -> EcsResult<()> {
        self.table.get(handle)?;
        let invoked = self.subscriptions.trigger(handle.version(), event, args)?;
        log::trace!("Triggered {event} on entity {handle} ({invoked} handler(s)).");
        Ok(())
    }

    /// The number of handlers the entity has for `event`.
    pub fn event_handler_count(&self, handle: EntityHandle, event: EventId) -> usize {
        self.subscriptions.handler_count(handle.version(), event)
    }

    // --- Iteration ---

    /// Iterates the handles of every live entity in slot order.
    pub fn all_entities(&self) -> EntityIterator<'_> {
        EntityIterator::new(&self.table)
    }

    /// Builds a view over the entities owning every type in `Q`.
    ///
    /// The view borrows the manager exclusively until it is dropped. Fails
    /// with [`EcsError::AliasedViewComponent`] if `Q` names a type twice.
    pub fn view<Q: ViewQuery>(&mut self) -> EcsResult<View<'_, Q>> {
        let prepared = Q::prepare(&self.registry, &mut self.arrays)?;
        Ok(View::new(&self.table, prepared))
    }

    /// Builds a read-only view over the entities owning every type in `Q`.
    ///
    /// Only borrows the manager immutably, so read views can be iterated
    /// side by side with each other and with component lookups.
    pub fn view_ref<Q: ViewQuery>(&self) -> EcsResult<ReadView<'_, Q>> {
        let prepared = Q::prepare_read(&self.registry, &self.arrays)?;
        Ok(ReadView::new(&self.table, prepared))
    }

    // --- Internals ---

    fn array(&self, id: ComponentTypeId) -> Option<&(dyn AnyComponentArray + 'static)> {
        self.arrays.get(id.index()).and_then(|array| array.as_deref())
    }

    fn typed_array<T: Component>(
        &self,
        handle: EntityHandle,
        id: ComponentTypeId,
    ) -> EcsResult<&ComponentArray<T>> {
        self.array(id)
            .ok_or_else(|| self.missing(handle, id))?
            .downcast_ref::<T>()
    }

    fn typed_array_mut<T: Component>(
        &mut self,
        handle: EntityHandle,
        id: ComponentTypeId,
    ) -> EcsResult<&mut ComponentArray<T>> {
        let missing = self.missing(handle, id);
        self.arrays
            .get_mut(id.index())
            .and_then(|array| array.as_deref_mut())
            .ok_or(missing)?
            .downcast_mut::<T>()
    }

    /// Resolves the type ID and array slot of the entity's `T`.
    fn locate<T: Component>(&self, handle: EntityHandle) -> EcsResult<(ComponentTypeId, usize)> {
        let data = self.table.get(handle)?;
        let missing = move || EcsError::MissingComponent {
            entity: handle,
            component: type_name::<T>(),
        };
        let id = self.registry.lookup::<T>().ok_or_else(missing)?;
        if !data.owned.contains(id) {
            return Err(missing());
        }
        data.component_index(id)
            .map(|index| (id, index))
            .ok_or_else(missing)
    }

    fn locate_id(&self, handle: EntityHandle, id: ComponentTypeId) -> EcsResult<usize> {
        let data = self.table.get(handle)?;
        if !data.owned.contains(id) {
            return Err(self.missing(handle, id));
        }
        data.component_index(id)
            .ok_or_else(|| self.missing(handle, id))
    }

    fn forget_component(&mut self, handle: EntityHandle, id: ComponentTypeId) -> EcsResult<()> {
        let data = self.table.get_mut(handle)?;
        data.owned.clear(id);
        data.component_indices.remove(&id);
        Ok(())
    }

    fn missing(&self, handle: EntityHandle, id: ComponentTypeId) -> EcsError {
        EcsError::MissingComponent {
            entity: handle,
            component: self
                .registry
                .get(id)
                .map_or("<unregistered component>", |component_type| component_type.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Clone, Copy)]
    struct Health(u32);
    impl Component for Health {}

    #[derive(Debug, PartialEq)]
    struct Name(&'static str);
    impl Component for Name {}

    fn manager(max_entities: usize) -> EntityComponentManager {
        EntityComponentManager::with_max_entities(max_entities).unwrap()
    }

    #[test]
    fn new_rejects_invalid_settings() {
        assert!(matches!(
            EntityComponentManager::with_max_entities(0),
            Err(EcsError::InvalidSettings(_))
        ));
        assert!(matches!(
            EntityComponentManager::with_max_entities(usize::MAX / 2),
            Err(EcsError::InvalidSettings(_))
        ));
        let ecm = EntityComponentManager::new(EcsSettings::default()).unwrap();
        assert_eq!(ecm.max_entity_count(), 4096);
        assert_eq!(ecm.max_component_types(), 64);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn unreservable_component_array_is_an_error() {
        #[allow(dead_code)]
        struct Volume([u8; 1 << 28]);
        impl Component for Volume {}

        let mut ecm = manager(1 << 20);
        let e = ecm.create_entity().unwrap();

        let result = ecm.add_component_with::<Volume, _>(e, || panic!("never built"));
        assert!(matches!(result, Err(EcsError::CapacityExceeded { .. })));
        assert!(!ecm.contains_component::<Volume>(e));
        assert!(ecm.component_array::<Volume>().is_none());

        // The manager stays usable after the failed allocation.
        ecm.add_component(e, Health(1)).unwrap();
        assert_eq!(ecm.get_component::<Health>(e), Ok(&Health(1)));
    }

    #[test]
    fn add_and_get_component() {
        let mut ecm = manager(8);
        let e = ecm.create_entity().unwrap();

        let stored = ecm.add_component(e, Health(10)).unwrap();
        stored.0 += 5;

        assert_eq!(ecm.get_component::<Health>(e), Ok(&Health(15)));
        assert!(ecm.contains_component::<Health>(e));
        assert!(!ecm.contains_component::<Name>(e));
    }

    #[test]
    fn duplicate_component_is_rejected_without_building_value() {
        let mut ecm = manager(8);
        let e = ecm.create_entity().unwrap();
        ecm.add_component(e, Health(1)).unwrap();

        let mut built = false;
        let result = ecm.add_component_with(e, || {
            built = true;
            Health(2)
        });

        assert!(matches!(result, Err(EcsError::DuplicateComponent { .. })));
        assert!(!built);
        assert_eq!(ecm.get_component::<Health>(e), Ok(&Health(1)));
    }

    #[test]
    fn get_missing_component_fails() {
        let mut ecm = manager(8);
        let e = ecm.create_entity().unwrap();

        assert!(matches!(
            ecm.get_component::<Health>(e),
            Err(EcsError::MissingComponent { .. })
        ));
        // Lookups never register a type.
        assert!(ecm.component_type_of::<Health>().is_none());
    }

    #[test]
    fn remove_component_returns_value_and_clears_mask() {
        let mut ecm = manager(8);
        let e = ecm.create_entity().unwrap();
        ecm.add_component(e, Name("crate")).unwrap();

        assert_eq!(ecm.remove_component::<Name>(e), Ok(Name("crate")));
        assert!(!ecm.contains_component::<Name>(e));
        assert!(ecm.entity_data(e).unwrap().owned_types().is_empty());
        assert!(matches!(
            ecm.remove_component::<Name>(e),
            Err(EcsError::MissingComponent { .. })
        ));

        // The type can be added again after removal.
        ecm.add_component(e, Name("again")).unwrap();
        assert_eq!(ecm.get_component::<Name>(e), Ok(&Name("again")));
    }

    #[test]
    fn delete_entity_releases_components() {
        let mut ecm = manager(8);
        let a = ecm.create_entity().unwrap();
        let b = ecm.create_entity().unwrap();
        ecm.add_component(a, Health(1)).unwrap();
        ecm.add_component(b, Health(2)).unwrap();

        ecm.delete_entity(a).unwrap();

        let array = ecm.component_array::<Health>().unwrap();
        assert_eq!(array.live_count(), 1);
        assert!(!array.is_occupied(0));
        assert!(!ecm.is_valid(a));
        assert_eq!(ecm.get_component::<Health>(b), Ok(&Health(2)));
    }

    #[test]
    fn stale_handle_is_rejected_everywhere() {
        let mut ecm = manager(8);
        let e = ecm.create_entity().unwrap();
        ecm.add_component(e, Health(1)).unwrap();
        ecm.delete_entity(e).unwrap();

        let stale = EcsError::StaleOrInvalidHandle { handle: e };
        assert_eq!(ecm.delete_entity(e), Err(stale.clone()));
        assert_eq!(ecm.add_component(e, Health(2)).map(|_| ()), Err(stale.clone()));
        assert_eq!(ecm.get_component::<Health>(e), Err(stale.clone()));
        assert_eq!(ecm.is_visible(e), Err(stale));
        assert!(!ecm.contains_component::<Health>(e));
    }

    #[test]
    fn dynamic_access_by_id() {
        let mut ecm = manager(8);
        let e = ecm.create_entity().unwrap();
        ecm.add_component(e, Health(7)).unwrap();
        let id = ecm.component_type_of::<Health>().unwrap().id();

        assert!(ecm.contains_component_id(e, id));
        let value = ecm.get_component_dyn(e, id).unwrap();
        assert_eq!(value.downcast_ref::<Health>(), Some(&Health(7)));

        ecm.remove_component_by_id(e, id).unwrap();
        assert!(!ecm.contains_component_id(e, id));
        assert_eq!(ecm.component_array::<Health>().unwrap().live_count(), 0);
    }

    #[test]
    fn visibility_defaults_to_visible() {
        let mut ecm = manager(2);
        let e = ecm.create_entity().unwrap();
        assert_eq!(ecm.is_visible(e), Ok(true));

        ecm.set_visible(e, false).unwrap();
        assert_eq!(ecm.is_visible(e), Ok(false));
    }

    #[test]
    fn component_types_are_listed_in_id_order() {
        let mut ecm = manager(2);
        let e = ecm.create_entity().unwrap();
        ecm.register_component::<Name>().unwrap();
        ecm.add_component(e, Health(0)).unwrap();

        let names: Vec<_> = ecm.component_types().map(|t| t.is::<Name>()).collect();
        assert_eq!(names, vec![true, false]);
    }

    #[test]
    fn events_are_dropped_with_their_entity() {
        let mut ecm = manager(2);
        let e = ecm.create_entity().unwrap();
        let event = EventId::new(3);
        ecm.subscribe_event(e, event, |_: &u32| {}).unwrap();
        assert_eq!(ecm.event_handler_count(e, event), 1);

        ecm.delete_entity(e).unwrap();
        assert_eq!(ecm.event_handler_count(e, event), 0);

        let reused = ecm.create_entity().unwrap();
        assert_eq!(reused.index(), e.index());
        assert_eq!(ecm.event_handler_count(reused, event), 0);
    }
}
