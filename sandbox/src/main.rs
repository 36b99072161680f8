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

use anyhow::{Context, Result};
use tessera_data::ecs::{Component, EntityComponentManager};
use tessera_data::{EcsSettings, EventId};

#[derive(Component, Debug, Clone, Copy)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Component, Debug, Clone, Copy)]
struct Velocity {
    dx: f32,
    dy: f32,
}

const DAMAGED: EventId = EventId::new(1);

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("debug")).init();

    let mut ecm = EntityComponentManager::new(EcsSettings::with_max_entities(4))?;

    let entities = (0..4)
        .map(|_| ecm.create_entity())
        .collect::<Result<Vec<_>, _>>()
        .context("Filling the entity table")?;
    for handle in &entities {
        log::info!("Spawned {handle}.");
    }

    match ecm.create_entity() {
        Ok(handle) => anyhow::bail!("Table should be full, got {handle}"),
        Err(err) => log::info!("Table full as expected: {err}"),
    }

    ecm.delete_entity(entities[1])?;
    let reused = ecm.create_entity()?;
    log::info!("Reused slot after delete: {reused}.");

    ecm.add_component(entities[0], Position { x: 0.0, y: 0.0 })?;
    ecm.add_component(entities[0], Velocity { dx: 1.0, dy: 0.5 })?;
    ecm.add_component(entities[2], Position { x: 10.0, y: 10.0 })?;

    ecm.subscribe_event(entities[0], DAMAGED, |amount: &u32| {
        log::info!("Entity 0 took {amount} damage.");
    })?;
    ecm.trigger_event(entities[0], DAMAGED, &25u32)?;

    for (_, (position, velocity)) in ecm.view::<(Position, Velocity)>()? {
        position.x += velocity.dx;
        position.y += velocity.dy;
    }

    for (handle, (position,)) in ecm.view::<(Position,)>()? {
        log::info!("{handle} is at ({}, {}).", position.x, position.y);
    }

    Ok(())
}
