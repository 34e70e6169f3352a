//! Entity state as pushed by the host application
//!
//! A `StateSnapshot` is replaced wholesale on every update; nothing in the
//! row patches it incrementally.

pub mod source;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// States that count as "not active" for badge coloring
const INACTIVE_STATES: &[&str] = &[
    "off",
    "unavailable",
    "unknown",
    "idle",
    "closed",
    "locked",
    "not_home",
    "standby",
    "paused",
    "docked",
];

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read state file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse state snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Current state of a single entity
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityState {
    #[serde(default)]
    pub entity_id: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl EntityState {
    pub fn new(entity_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// Domain part of the entity id (`light` for `light.kitchen`)
    pub fn domain(&self) -> &str {
        self.entity_id
            .split_once('.')
            .map(|(domain, _)| domain)
            .unwrap_or("")
    }

    /// Display name: `friendly_name`, else the object id with underscores as spaces
    pub fn name(&self) -> String {
        if let Some(name) = self.attributes.get("friendly_name").and_then(|v| v.as_str()) {
            return name.to_string();
        }
        let object_id = self
            .entity_id
            .split_once('.')
            .map(|(_, id)| id)
            .unwrap_or(&self.entity_id);
        object_id.replace('_', " ")
    }

    pub fn is_unavailable(&self) -> bool {
        self.state == "unavailable"
    }

    pub fn is_active(&self) -> bool {
        !INACTIVE_STATES.contains(&self.state.as_str())
    }

    /// Icon attribute set by the host, if any
    pub fn icon_attribute(&self) -> Option<&str> {
        self.attributes.get("icon").and_then(|v| v.as_str())
    }

    /// Picture attribute set by the host, if any
    pub fn picture_attribute(&self) -> Option<&str> {
        self.attributes.get("entity_picture").and_then(|v| v.as_str())
    }
}

/// Full application state: entity id -> state
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct StateSnapshot {
    states: HashMap<String, EntityState>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotRepr {
    Keyed(HashMap<String, EntityState>),
    List(Vec<EntityState>),
}

impl StateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse either `{ "light.a": {...} }` or `[ { "entity_id": "light.a", ... } ]`
    pub fn from_json(content: &str) -> Result<Self, SnapshotError> {
        let repr: SnapshotRepr = serde_json::from_str(content)?;
        let states = match repr {
            SnapshotRepr::Keyed(map) => map
                .into_iter()
                .map(|(id, mut state)| {
                    if state.entity_id.is_empty() {
                        state.entity_id = id.clone();
                    }
                    (id, state)
                })
                .collect(),
            SnapshotRepr::List(list) => list
                .into_iter()
                .filter(|s| !s.entity_id.is_empty())
                .map(|s| (s.entity_id.clone(), s))
                .collect(),
        };
        Ok(Self { states })
    }

    pub fn load(path: &std::path::Path) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path).map_err(|source| SnapshotError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn get(&self, entity_id: &str) -> Option<&EntityState> {
        self.states.get(entity_id)
    }

    pub fn insert(&mut self, state: EntityState) {
        self.states.insert(state.entity_id.clone(), state);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }
}

impl FromIterator<EntityState> for StateSnapshot {
    fn from_iter<I: IntoIterator<Item = EntityState>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for state in iter {
            snapshot.insert(state);
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_prefers_friendly_name() {
        let state = EntityState::new("light.living_room", "on")
            .with_attribute("friendly_name", "Living Room Light");
        assert_eq!(state.name(), "Living Room Light");

        let state = EntityState::new("light.living_room", "on");
        assert_eq!(state.name(), "living room");
        assert_eq!(state.domain(), "light");
    }

    #[test]
    fn test_active_states() {
        assert!(EntityState::new("light.a", "on").is_active());
        assert!(EntityState::new("sensor.t", "21.5").is_active());
        assert!(!EntityState::new("light.a", "off").is_active());
        assert!(!EntityState::new("light.a", "unavailable").is_active());
        assert!(EntityState::new("light.a", "unavailable").is_unavailable());
    }

    #[test]
    fn test_snapshot_keyed_json() {
        let json = r#"{
            "light.a": { "state": "on", "attributes": { "friendly_name": "Lamp" } },
            "switch.b": { "entity_id": "switch.b", "state": "off" }
        }"#;
        let snapshot = StateSnapshot::from_json(json).unwrap();

        assert_eq!(snapshot.len(), 2);
        let lamp = snapshot.get("light.a").unwrap();
        assert_eq!(lamp.entity_id, "light.a");
        assert_eq!(lamp.name(), "Lamp");
        assert_eq!(snapshot.get("switch.b").unwrap().state, "off");
    }

    #[test]
    fn test_snapshot_list_json() {
        let json = r#"[
            { "entity_id": "light.a", "state": "on" },
            { "state": "orphan" },
            { "entity_id": "fan.c", "state": "off" }
        ]"#;
        let snapshot = StateSnapshot::from_json(json).unwrap();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("light.a").unwrap().state, "on");
        assert_eq!(snapshot.get("fan.c").unwrap().state, "off");
    }

    #[test]
    fn test_snapshot_rejects_garbage() {
        assert!(matches!(
            StateSnapshot::from_json("\"nope\""),
            Err(SnapshotError::Parse(_))
        ));
    }
}
