//! Action configs and dispatch into the action pipeline
//!
//! The dispatcher only merges per-entity overrides over the defaults and
//! forwards the result. What an action actually does is up to the
//! `ActionPipeline` implementation.

pub mod local;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::EntityConfig;
use crate::entity::StateSnapshot;

/// Gesture kinds, as classified upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Tap,
    Hold,
    DoubleTap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionType {
    #[default]
    None,
    Toggle,
    MoreInfo,
    Navigate,
    Url,
    CallService,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Confirmation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// One action descriptor, e.g. `{ action = "call-service", service = "light.turn_on" }`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionConfig {
    pub action: ActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<Confirmation>,
}

impl ActionConfig {
    pub fn of(action: ActionType) -> Self {
        Self {
            action,
            ..Default::default()
        }
    }

    pub fn toggle() -> Self {
        Self::of(ActionType::Toggle)
    }

    pub fn more_info() -> Self {
        Self::of(ActionType::MoreInfo)
    }
}

/// True when the action is configured and does something
pub fn has_action(config: Option<&ActionConfig>) -> bool {
    config.is_some_and(|c| c.action != ActionType::None)
}

/// Effective action set for one entity: defaults overlaid with its config
#[derive(Debug, Clone, PartialEq)]
pub struct MergedActions {
    pub entity: String,
    pub tap_action: ActionConfig,
    pub hold_action: Option<ActionConfig>,
    pub double_tap_action: Option<ActionConfig>,
}

impl MergedActions {
    pub fn from_config(config: &EntityConfig) -> Self {
        Self {
            entity: config.entity.clone(),
            tap_action: config
                .tap_action
                .clone()
                .unwrap_or_else(ActionConfig::toggle),
            hold_action: config.hold_action.clone(),
            double_tap_action: config.double_tap_action.clone(),
        }
    }

    /// The action to run for a gesture; unmapped kinds fall back to more-info
    pub fn resolve(&self, kind: ActionKind) -> ActionConfig {
        match kind {
            ActionKind::Tap => self.tap_action.clone(),
            ActionKind::Hold => self
                .hold_action
                .clone()
                .unwrap_or_else(ActionConfig::more_info),
            ActionKind::DoubleTap => self
                .double_tap_action
                .clone()
                .unwrap_or_else(ActionConfig::more_info),
        }
    }
}

pub fn resolve_action(config: &EntityConfig, kind: ActionKind) -> ActionConfig {
    MergedActions::from_config(config).resolve(kind)
}

/// Where an interaction came from in the row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionOrigin {
    pub position: usize,
}

/// A classified interaction carrying the config of the button that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct ButtonEvent {
    pub origin: ActionOrigin,
    pub config: EntityConfig,
    pub kind: ActionKind,
}

/// Executes actions. Implementations own confirmation, failures and retries.
pub trait ActionPipeline {
    fn handle_action(
        &mut self,
        origin: ActionOrigin,
        states: &StateSnapshot,
        actions: &MergedActions,
        kind: ActionKind,
    );
}

pub fn dispatch(event: &ButtonEvent, states: &StateSnapshot, pipeline: &mut dyn ActionPipeline) {
    let merged = MergedActions::from_config(&event.config);
    tracing::debug!("Dispatching {:?} for {}", event.kind, merged.entity);
    pipeline.handle_action(event.origin, states, &merged, event.kind);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingPipeline {
        calls: Vec<(ActionOrigin, MergedActions, ActionKind)>,
    }

    impl ActionPipeline for RecordingPipeline {
        fn handle_action(
            &mut self,
            origin: ActionOrigin,
            _states: &StateSnapshot,
            actions: &MergedActions,
            kind: ActionKind,
        ) {
            self.calls.push((origin, actions.clone(), kind));
        }
    }

    fn entity(id: &str) -> EntityConfig {
        EntityConfig::new(id)
    }

    #[test]
    fn test_has_action() {
        assert!(!has_action(None));
        assert!(!has_action(Some(&ActionConfig::of(ActionType::None))));
        assert!(has_action(Some(&ActionConfig::toggle())));
    }

    #[test]
    fn test_tap_defaults_to_toggle() {
        let config = entity("light.a");
        assert_eq!(resolve_action(&config, ActionKind::Tap), ActionConfig::toggle());
    }

    #[test]
    fn test_explicit_tap_action_wins() {
        let mut config = entity("light.a");
        config.tap_action = Some(ActionConfig {
            action: ActionType::Navigate,
            navigation_path: Some("/lights".to_string()),
            ..Default::default()
        });

        let resolved = resolve_action(&config, ActionKind::Tap);
        assert_eq!(resolved.action, ActionType::Navigate);
        assert_eq!(resolved.navigation_path.as_deref(), Some("/lights"));
    }

    #[test]
    fn test_hold_and_double_tap_resolution() {
        let mut config = entity("light.a");
        assert_eq!(resolve_action(&config, ActionKind::Hold), ActionConfig::more_info());
        assert_eq!(
            resolve_action(&config, ActionKind::DoubleTap),
            ActionConfig::more_info()
        );

        config.hold_action = Some(ActionConfig {
            action: ActionType::CallService,
            service: Some("light.turn_on".to_string()),
            ..Default::default()
        });
        config.double_tap_action = Some(ActionConfig::of(ActionType::None));

        assert_eq!(
            resolve_action(&config, ActionKind::Hold).action,
            ActionType::CallService
        );
        assert_eq!(
            resolve_action(&config, ActionKind::DoubleTap).action,
            ActionType::None
        );
        // Tap stays on the default while other overrides are present
        assert_eq!(resolve_action(&config, ActionKind::Tap), ActionConfig::toggle());
    }

    #[test]
    fn test_dispatch_forwards_merged_config() {
        let mut config = entity("switch.b");
        config.hold_action = Some(ActionConfig::more_info());
        let event = ButtonEvent {
            origin: ActionOrigin { position: 3 },
            config,
            kind: ActionKind::Hold,
        };

        let mut pipeline = RecordingPipeline::default();
        dispatch(&event, &StateSnapshot::new(), &mut pipeline);

        assert_eq!(pipeline.calls.len(), 1);
        let (origin, merged, kind) = &pipeline.calls[0];
        assert_eq!(origin.position, 3);
        assert_eq!(merged.entity, "switch.b");
        assert_eq!(merged.tap_action, ActionConfig::toggle());
        assert_eq!(merged.hold_action, Some(ActionConfig::more_info()));
        assert_eq!(*kind, ActionKind::Hold);
    }
}
