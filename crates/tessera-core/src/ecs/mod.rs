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

//! Core ECS contracts that do not depend on any storage implementation.

pub mod entity;
pub mod error;
pub mod settings;

/// The width of the per-entity owned-component bitset.
///
/// This is the hard ceiling on distinct component types a single manager can
/// track. `EcsSettings::max_component_types` may lower it but never raise it.
pub const COMPONENT_TYPE_CEILING: usize = 64;

/// The largest entity capacity a manager accepts.
///
/// The entity table and every component array reserve `max_entities` slots
/// when they are built, so the capacity is bounded well below what the
/// allocator could ever satisfy.
pub const ENTITY_CAPACITY_CEILING: usize = 1 << 24;
