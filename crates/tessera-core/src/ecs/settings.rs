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

//! Runtime settings for an entity/component manager.

use serde::{Deserialize, Serialize};

use crate::ecs::error::{EcsError, EcsResult};
use crate::ecs::{COMPONENT_TYPE_CEILING, ENTITY_CAPACITY_CEILING};

/// The fixed capacities an entity/component manager is built with.
///
/// Both values are decided once at construction. The entity table and every
/// component array are allocated to `max_entities` up front and never grow,
/// so component references stay put while systems iterate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcsSettings {
    /// The maximum number of simultaneously live entities. Cannot exceed
    /// [`ENTITY_CAPACITY_CEILING`].
    pub max_entities: usize,
    /// The maximum number of distinct component types. Cannot exceed 64.
    pub max_component_types: usize,
}

impl EcsSettings {
    /// Settings with the given entity capacity and the full component type range.
    pub fn with_max_entities(max_entities: usize) -> Self {
        Self {
            max_entities,
            ..Self::default()
        }
    }

    /// Checks that the settings describe a usable manager.
    pub fn validate(&self) -> EcsResult<()> {
        if self.max_entities == 0 {
            return Err(EcsError::InvalidSettings(
                "max_entities must be greater than zero".to_string(),
            ));
        }
        if self.max_entities > ENTITY_CAPACITY_CEILING {
            log::warn!(
                "Rejected max_entities={} (ceiling is {ENTITY_CAPACITY_CEILING}).",
                self.max_entities
            );
            return Err(EcsError::InvalidSettings(format!(
                "max_entities must not exceed {ENTITY_CAPACITY_CEILING}, got {}",
                self.max_entities
            )));
        }
        if self.max_component_types == 0 {
            return Err(EcsError::InvalidSettings(
                "max_component_types must be greater than zero".to_string(),
            ));
        }
        if self.max_component_types > COMPONENT_TYPE_CEILING {
            log::warn!(
                "Rejected max_component_types={} (ceiling is {COMPONENT_TYPE_CEILING}).",
                self.max_component_types
            );
            return Err(EcsError::InvalidSettings(format!(
                "max_component_types must not exceed {COMPONENT_TYPE_CEILING}, got {}",
                self.max_component_types
            )));
        }
        Ok(())
    }
}

impl Default for EcsSettings {
    fn default() -> Self {
        Self {
            max_entities: 4096,
            max_component_types: COMPONENT_TYPE_CEILING,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        let settings = EcsSettings::default();
        assert_eq!(settings.max_component_types, 64);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn zero_capacities_are_rejected() {
        assert!(EcsSettings::with_max_entities(0).validate().is_err());

        let settings = EcsSettings {
            max_entities: 8,
            max_component_types: 0,
        };
        assert!(matches!(
            settings.validate(),
            Err(EcsError::InvalidSettings(_))
        ));
    }

    #[test]
    fn component_types_cannot_exceed_the_bitset() {
        let settings = EcsSettings {
            max_entities: 8,
            max_component_types: 65,
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn oversized_entity_capacity_is_rejected() {
        let at_ceiling = EcsSettings::with_max_entities(ENTITY_CAPACITY_CEILING);
        assert!(at_ceiling.validate().is_ok());

        for max_entities in [ENTITY_CAPACITY_CEILING + 1, usize::MAX / 2, usize::MAX] {
            assert!(matches!(
                EcsSettings::with_max_entities(max_entities).validate(),
                Err(EcsError::InvalidSettings(_))
            ));
        }
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: EcsSettings = serde_json::from_str(r#"{ "max_entities": 16 }"#).unwrap();
        assert_eq!(settings.max_entities, 16);
        assert_eq!(settings.max_component_types, 64);
    }
}
