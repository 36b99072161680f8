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
    marker::PhantomData,
};

use tessera_core::{EcsError, EcsResult, EntityHandle};

use crate::ecs::{
    AnyComponentArray, Component, ComponentArray, ComponentMask, ComponentRegistry,
    ComponentTypeId, EntityData, EntityIterator, EntityTable,
};

// ------------------------ //
// ---- ViewQuery Part ---- //
// ------------------------ //

/// A raw window onto the slot buffer of one `ComponentArray<T>`.
///
/// Captured once when a view is built so that fetching a component for an
/// entity touches only that entity's slot.
pub struct ColumnPtr<T> {
    id: ComponentTypeId,
    base: *mut Option<T>,
    len: usize,
}

impl<T> Clone for ColumnPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ColumnPtr<T> {}

impl<T: Component> ColumnPtr<T> {
    /// Resolves the column of `T`, or `None` if no entity can own a `T` yet.
    fn resolve(
        registry: &ComponentRegistry,
        arrays: &mut [Option<Box<dyn AnyComponentArray>>],
    ) -> EcsResult<Option<Self>> {
        let Some(id) = registry.lookup::<T>() else {
            return Ok(None);
        };
        let Some(array) = arrays.get_mut(id.index()).and_then(|slot| slot.as_deref_mut()) else {
            return Ok(None);
        };
        let (base, len) = array.downcast_mut::<T>()?.raw_slots();
        Ok(Some(Self { id, base, len }))
    }

    /// # Safety
    ///
    /// The array this column was resolved from must still be exclusively
    /// borrowed by the view, and no other live reference may point at the
    /// slot `data` records for this component.
    unsafe fn fetch<'a>(self, data: &EntityData) -> Option<&'a mut T> {
        let index = data.component_index(self.id)?;
        if index >= self.len {
            return None;
        }
        // SAFETY: `index` is in bounds and the caller guarantees exclusivity.
        unsafe { (*self.base.add(index)).as_mut() }
    }
}

/// A shared window onto one `ComponentArray<T>`, used by read-only views.
pub struct ReadColumn<'a, T: Component> {
    id: ComponentTypeId,
    array: &'a ComponentArray<T>,
}

impl<T: Component> Clone for ReadColumn<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Component> Copy for ReadColumn<'_, T> {}

impl<'a, T: Component> ReadColumn<'a, T> {
    fn resolve(
        registry: &ComponentRegistry,
        arrays: &'a [Option<Box<dyn AnyComponentArray>>],
    ) -> EcsResult<Option<Self>> {
        let Some(id) = registry.lookup::<T>() else {
            return Ok(None);
        };
        let Some(array) = arrays.get(id.index()).and_then(|slot| slot.as_deref()) else {
            return Ok(None);
        };
        Ok(Some(Self {
            id,
            array: array.downcast_ref::<T>()?,
        }))
    }

    fn fetch(self, data: &EntityData) -> Option<&'a T> {
        let index = data.component_index(self.id)?;
        self.array.get(index).ok()
    }
}

/// A set of component types a [`View`] or [`ReadView`] can request.
///
/// Implemented for `()` (every live entity) and for tuples of up to eight
/// component types. A [`View`] yields one `&mut` per requested type and
/// needs the types to be distinct; a [`ReadView`] yields shared references.
pub trait ViewQuery {
    /// What the view yields alongside each entity handle.
    type Item<'a>;

    /// What a read-only view yields alongside each entity handle.
    type ReadItem<'a>;

    /// The resolved columns captured when the view is built.
    type State: Copy;

    /// The resolved shared columns of a read-only view.
    type ReadState<'a>: Copy;

    /// Builds the required-type mask and resolves every requested column.
    ///
    /// Returns `Ok(None)` when a requested type has never been stored, in
    /// which case no entity can match and the view is empty.
    fn prepare(
        registry: &ComponentRegistry,
        arrays: &mut [Option<Box<dyn AnyComponentArray>>],
    ) -> EcsResult<Option<(ComponentMask, Self::State)>>;

    /// Fetches the requested components of one matching entity.
    ///
    /// # Safety
    ///
    /// `state` must come from `prepare` on arrays that are still exclusively
    /// borrowed by the caller, `data` must own every requested type, and each
    /// entity may be fetched at most once per view.
    unsafe fn fetch<'a>(state: Self::State, data: &EntityData) -> Option<Self::Item<'a>>;

    /// Read-only counterpart of [`prepare`](Self::prepare).
    fn prepare_read<'a>(
        registry: &ComponentRegistry,
        arrays: &'a [Option<Box<dyn AnyComponentArray>>],
    ) -> EcsResult<Option<(ComponentMask, Self::ReadState<'a>)>>;

    /// Fetches shared references to the requested components of one entity.
    fn fetch_read<'a>(
        state: Self::ReadState<'a>,
        data: &EntityData,
    ) -> Option<Self::ReadItem<'a>>;
}

impl ViewQuery for () {
    type Item<'a> = ();
    type ReadItem<'a> = ();
    type State = ();
    type ReadState<'a> = ();

    fn prepare(
        _registry: &ComponentRegistry,
        _arrays: &mut [Option<Box<dyn AnyComponentArray>>],
    ) -> EcsResult<Option<(ComponentMask, Self::State)>> {
        Ok(Some((ComponentMask::EMPTY, ())))
    }

    unsafe fn fetch<'a>(_state: Self::State, _data: &EntityData) -> Option<Self::Item<'a>> {
        Some(())
    }

    fn prepare_read<'a>(
        _registry: &ComponentRegistry,
        _arrays: &'a [Option<Box<dyn AnyComponentArray>>],
    ) -> EcsResult<Option<(ComponentMask, Self::ReadState<'a>)>> {
        Ok(Some((ComponentMask::EMPTY, ())))
    }

    fn fetch_read<'a>(
        _state: Self::ReadState<'a>,
        _data: &EntityData,
    ) -> Option<Self::ReadItem<'a>> {
        Some(())
    }
}

/// Fails if the same type appears twice, which would alias `&mut` borrows.
fn ensure_distinct(types: &[(TypeId, &'static str)]) -> EcsResult<()> {
    for (i, (type_id, name)) in types.iter().enumerate() {
        if types[i + 1..].iter().any(|(other, _)| other == type_id) {
            return Err(EcsError::AliasedViewComponent { component: *name });
        }
    }
    Ok(())
}

macro_rules! impl_view_query {
    ($($T:ident $idx:tt),+) => {
        impl<$($T: Component),+> ViewQuery for ($($T,)+) {
            type Item<'a> = ($(&'a mut $T,)+);
            type ReadItem<'a> = ($(&'a $T,)+);
            type State = ($(ColumnPtr<$T>,)+);
            type ReadState<'a> = ($(ReadColumn<'a, $T>,)+);

            fn prepare(
                registry: &ComponentRegistry,
                arrays: &mut [Option<Box<dyn AnyComponentArray>>],
            ) -> EcsResult<Option<(ComponentMask, Self::State)>> {
                ensure_distinct(&[$((TypeId::of::<$T>(), type_name::<$T>())),+])?;

                let state: Self::State = ($(
                    match ColumnPtr::<$T>::resolve(registry, arrays)? {
                        Some(column) => column,
                        None => return Ok(None),
                    },
                )+);

                let mut required = ComponentMask::EMPTY;
                $(required.set(state.$idx.id);)+
                Ok(Some((required, state)))
            }

            unsafe fn fetch<'a>(state: Self::State, data: &EntityData) -> Option<Self::Item<'a>> {
                // SAFETY: forwarded from the caller; the types are distinct, so
                // every column points into a different array.
                unsafe { Some(($(state.$idx.fetch(data)?,)+)) }
            }

            fn prepare_read<'a>(
                registry: &ComponentRegistry,
                arrays: &'a [Option<Box<dyn AnyComponentArray>>],
            ) -> EcsResult<Option<(ComponentMask, Self::ReadState<'a>)>> {
                let state: Self::ReadState<'a> = ($(
                    match ReadColumn::<$T>::resolve(registry, arrays)? {
                        Some(column) => column,
                        None => return Ok(None),
                    },
                )+);

                let mut required = ComponentMask::EMPTY;
                $(required.set(state.$idx.id);)+
                Ok(Some((required, state)))
            }

            fn fetch_read<'a>(
                state: Self::ReadState<'a>,
                data: &EntityData,
            ) -> Option<Self::ReadItem<'a>> {
                Some(($(state.$idx.fetch(data)?,)+))
            }
        }
    };
}

impl_view_query!(A 0);
impl_view_query!(A 0, B 1);
impl_view_query!(A 0, B 1, C 2);
impl_view_query!(A 0, B 1, C 2, D 3);
impl_view_query!(A 0, B 1, C 2, D 3, E 4);
impl_view_query!(A 0, B 1, C 2, D 3, E 4, F 5);
impl_view_query!(A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_view_query!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);

// ------------------- //
// ---- View Part ---- //
// ------------------- //

/// A bitset-filtered view over the live entities of a manager.
///
/// Created by [`EntityComponentManager::view`]. It stores only the mask of the
/// requested types, the table it walks and the resolved columns, so building
/// one is cheap. The view holds the manager's exclusive borrow for its whole
/// lifetime: entities and components cannot be added or removed while it is
/// being iterated.
///
/// [`EntityComponentManager::view`]: crate::ecs::EntityComponentManager::view
pub struct View<'a, Q: ViewQuery> {
    table: &'a EntityTable,
    required: ComponentMask,
    state: Option<Q::State>,
    _borrow: PhantomData<(&'a mut (), fn() -> Q)>,
}

impl<'a, Q: ViewQuery> View<'a, Q> {
    pub(crate) fn new(
        table: &'a EntityTable,
        prepared: Option<(ComponentMask, Q::State)>,
    ) -> Self {
        let (required, state) = match prepared {
            Some((required, state)) => (required, Some(state)),
            None => (ComponentMask::EMPTY, None),
        };
        Self {
            table,
            required,
            state,
            _borrow: PhantomData,
        }
    }

    /// The mask an entity's owned types must contain to be yielded.
    pub fn required(&self) -> ComponentMask {
        self.required
    }

    /// Returns an iterator positioned on the first matching entity.
    pub fn iter(self) -> ViewIter<'a, Q> {
        ViewIter {
            entities: EntityIterator::new(self.table),
            required: self.required,
            state: self.state,
            _borrow: PhantomData,
        }
    }
}

impl<'a, Q: ViewQuery> IntoIterator for View<'a, Q> {
    type Item = (EntityHandle, Q::Item<'a>);
    type IntoIter = ViewIter<'a, Q>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the entities of a [`View`].
///
/// Wraps an [`EntityIterator`] and skips every slot whose owned types are not
/// a superset of the view's mask. Yields each matching entity's handle with
/// direct references into the component arrays.
pub struct ViewIter<'a, Q: ViewQuery> {
    entities: EntityIterator<'a>,
    required: ComponentMask,
    state: Option<Q::State>,
    _borrow: PhantomData<(&'a mut (), fn() -> Q)>,
}

impl<'a, Q: ViewQuery> Iterator for ViewIter<'a, Q> {
    type Item = (EntityHandle, Q::Item<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let state = self.state?;
        while let Some((handle, data)) = self.entities.next_slot() {
            if !data.owned.contains_all(self.required) {
                continue;
            }
            // SAFETY: the view holds the manager's exclusive borrow for 'a,
            // slots are visited once each, and distinct entities never share
            // a slot in any component array.
            if let Some(item) = unsafe { Q::fetch(state, data) } {
                return Some((handle, item));
            }
            log::error!("Entity {handle} owns a component with no stored value; skipped.");
        }
        None
    }
}

/// A read-only, bitset-filtered view over the live entities of a manager.
///
/// Created by [`EntityComponentManager::view_ref`]. It only borrows the
/// manager immutably, so several read views may be alive and iterated at
/// the same time. A type may be requested more than once.
///
/// [`EntityComponentManager::view_ref`]: crate::ecs::EntityComponentManager::view_ref
pub struct ReadView<'a, Q: ViewQuery> {
    table: &'a EntityTable,
    required: ComponentMask,
    state: Option<Q::ReadState<'a>>,
}

impl<'a, Q: ViewQuery> ReadView<'a, Q> {
    pub(crate) fn new(
        table: &'a EntityTable,
        prepared: Option<(ComponentMask, Q::ReadState<'a>)>,
    ) -> Self {
        let (required, state) = match prepared {
            Some((required, state)) => (required, Some(state)),
            None => (ComponentMask::EMPTY, None),
        };
        Self {
            table,
            required,
            state,
        }
    }

    /// The mask an entity's owned types must contain to be yielded.
    pub fn required(&self) -> ComponentMask {
        self.required
    }

    /// Returns an iterator positioned on the first matching entity.
    pub fn iter(&self) -> ReadViewIter<'a, Q> {
        ReadViewIter {
            entities: EntityIterator::new(self.table),
            required: self.required,
            state: self.state,
        }
    }
}

impl<'a, Q: ViewQuery> IntoIterator for ReadView<'a, Q> {
    type Item = (EntityHandle, Q::ReadItem<'a>);
    type IntoIter = ReadViewIter<'a, Q>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, Q: ViewQuery> IntoIterator for &ReadView<'a, Q> {
    type Item = (EntityHandle, Q::ReadItem<'a>);
    type IntoIter = ReadViewIter<'a, Q>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the entities of a [`ReadView`].
pub struct ReadViewIter<'a, Q: ViewQuery> {
    entities: EntityIterator<'a>,
    required: ComponentMask,
    state: Option<Q::ReadState<'a>>,
}

impl<'a, Q: ViewQuery> Iterator for ReadViewIter<'a, Q> {
    type Item = (EntityHandle, Q::ReadItem<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let state = self.state?;
        while let Some((handle, data)) = self.entities.next_slot() {
            if !data.owned.contains_all(self.required) {
                continue;
            }
            if let Some(item) = Q::fetch_read(state, data) {
                return Some((handle, item));
            }
            log::error!("Entity {handle} owns a component with no stored value; skipped.");
        }
        None
    }
}
