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

//! Per-entity typed event subscriptions.

use std::{
    any::{type_name, Any, TypeId},
    collections::HashMap,
    rc::Rc,
};

use tessera_core::{EcsError, EcsResult, EventId};

type Handler<A> = Box<dyn Fn(&A)>;

/// A registered handler with its argument type erased.
///
/// The closure is dropped together with its subscription.
struct Subscription {
    arg_type: TypeId,
    arg_name: &'static str,
    handler: Rc<dyn Any>,
}

impl Subscription {
    fn new<A: 'static>(handler: impl Fn(&A) + 'static) -> Self {
        let handler: Handler<A> = Box::new(handler);
        Self {
            arg_type: TypeId::of::<A>(),
            arg_name: type_name::<A>(),
            handler: Rc::new(handler),
        }
    }
}

/// Event handlers keyed by entity version, then by event.
///
/// Keying by version rather than slot index means a recycled slot never
/// inherits the handlers of the entity that used it before.
#[derive(Default)]
pub struct EventSubscriptions {
    by_version: HashMap<u64, HashMap<EventId, Vec<Subscription>>>,
}

impl EventSubscriptions {
    /// Creates an empty subscription map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `handler` to the handlers of `event` on the entity `version`.
    pub fn subscribe<A: 'static>(
        &mut self,
        version: u64,
        event: EventId,
        handler: impl Fn(&A) + 'static,
    ) {
        self.by_version
            .entry(version)
            .or_default()
            .entry(event)
            .or_default()
            .push(Subscription::new(handler));
    }

    /// Removes every handler of `event` on the entity `version`, returning how
    /// many were removed.
    pub fn unsubscribe(&mut self, version: u64, event: EventId) -> usize {
        let Some(events) = self.by_version.get_mut(&version) else {
            return 0;
        };
        let removed = events.remove(&event).map_or(0, |handlers| handlers.len());
        if events.is_empty() {
            self.by_version.remove(&version);
        }
        removed
    }

    /// Drops every subscription of the entity `version`.
    pub fn remove_entity(&mut self, version: u64) {
        self.by_version.remove(&version);
    }

    /// Invokes the handlers of `event` on the entity `version` in subscription
    /// order and returns how many ran.
    ///
    /// All handlers are type-checked before the first one runs, so a
    /// mismatched argument type fails with [`EcsError::TypeMismatch`] without
    /// side effects.
    pub fn trigger<A: 'static>(&self, version: u64, event: EventId, args: &A) -> EcsResult<usize> {
        let Some(handlers) = self
            .by_version
            .get(&version)
            .and_then(|events| events.get(&event))
        else {
            return Ok(0);
        };

        if let Some(mismatch) = handlers.iter().find(|s| s.arg_type != TypeId::of::<A>()) {
            return Err(EcsError::TypeMismatch {
                expected: mismatch.arg_name,
                actual: type_name::<A>(),
            });
        }

        for subscription in handlers {
            if let Some(handler) = subscription.handler.downcast_ref::<Handler<A>>() {
                handler(args);
            }
        }
        Ok(handlers.len())
    }

    /// The number of handlers registered for `event` on the entity `version`.
    pub fn handler_count(&self, version: u64, event: EventId) -> usize {
        self.by_version
            .get(&version)
            .and_then(|events| events.get(&event))
            .map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    const HIT: EventId = EventId::new(1);
    const HEAL: EventId = EventId::new(2);

    #[test]
    fn handlers_run_in_subscription_order() {
        let mut subscriptions = EventSubscriptions::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for tag in ["h1", "h2", "h3"] {
            let log = log.clone();
            subscriptions.subscribe(1, HIT, move |damage: &u32| {
                log.borrow_mut().push(format!("{tag}:{damage}"));
            });
        }

        assert_eq!(subscriptions.trigger(1, HIT, &7u32), Ok(3));
        assert_eq!(*log.borrow(), vec!["h1:7", "h2:7", "h3:7"]);
    }

    #[test]
    fn unsubscribe_removes_every_handler_of_the_event() {
        let mut subscriptions = EventSubscriptions::new();
        let calls = Rc::new(RefCell::new(0));

        let counter = calls.clone();
        subscriptions.subscribe(1, HIT, move |_: &u32| *counter.borrow_mut() += 1);
        let counter = calls.clone();
        subscriptions.subscribe(1, HIT, move |_: &u32| *counter.borrow_mut() += 1);
        let counter = calls.clone();
        subscriptions.subscribe(1, HEAL, move |_: &u32| *counter.borrow_mut() += 10);

        assert_eq!(subscriptions.unsubscribe(1, HIT), 2);
        assert_eq!(subscriptions.trigger(1, HIT, &1u32), Ok(0));
        assert_eq!(*calls.borrow(), 0);

        subscriptions.trigger(1, HEAL, &1u32).unwrap();
        assert_eq!(*calls.borrow(), 10);
    }

    #[test]
    fn subscriptions_are_isolated_per_version() {
        let mut subscriptions = EventSubscriptions::new();
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        subscriptions.subscribe(2, HIT, move |_: &()| *counter.borrow_mut() += 1);

        assert_eq!(subscriptions.trigger(5, HIT, &()), Ok(0));
        subscriptions.remove_entity(2);
        assert!(subscriptions.by_version.is_empty());
        assert_eq!(subscriptions.trigger(2, HIT, &()), Ok(0));
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn mismatched_argument_type_runs_nothing() {
        let mut subscriptions = EventSubscriptions::new();
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        subscriptions.subscribe(1, HIT, move |_: &u32| *counter.borrow_mut() += 1);
        subscriptions.subscribe(1, HIT, |_: &String| {});

        let result = subscriptions.trigger(1, HIT, &3u32);
        assert!(matches!(result, Err(EcsError::TypeMismatch { .. })));
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn dropping_subscriptions_releases_captured_state() {
        let mut subscriptions = EventSubscriptions::new();
        let state = Rc::new(());
        let captured = state.clone();
        subscriptions.subscribe(1, HIT, move |_: &()| {
            let _ = &captured;
        });
        assert_eq!(Rc::strong_count(&state), 2);

        subscriptions.unsubscribe(1, HIT);
        assert_eq!(Rc::strong_count(&state), 1);
        assert_eq!(subscriptions.handler_count(1, HIT), 0);
    }
}
