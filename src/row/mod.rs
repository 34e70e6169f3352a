//! The button row: config + snapshot in, one rendered node per config out
//!
//! Rendering is recomputed in full for every snapshot or config change.
//! Badges are bound separately through `binder::BadgeRegistry`.

pub mod binder;
pub mod gesture;

use serde::Serialize;

use crate::action::{has_action, ActionConfig, ActionType};
use crate::config::EntityConfig;
use crate::entity::{EntityState, StateSnapshot};

/// Identifies one badge: the entity id plus its ordinal among badge-bearing
/// configs with the same id, so duplicates stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BadgeKey {
    pub entity: String,
    pub occurrence: usize,
}

/// Static part of a badge as declared by the config
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BadgeSlot {
    pub key: BadgeKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_override: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_override: Option<String>,
}

/// Which gesture detectors are armed for a button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Affordances {
    pub hold: bool,
    pub double_tap: bool,
}

impl Affordances {
    pub fn for_config(config: &EntityConfig) -> Self {
        Self {
            hold: has_action(config.hold_action.as_ref()),
            double_tap: has_action(config.double_tap_action.as_ref()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedButton {
    pub position: usize,
    pub entity: String,
    pub tooltip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<BadgeSlot>,
    pub label: String,
    pub affordances: Affordances,
    pub focusable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderedNode {
    /// Configured entity has no state in the snapshot
    Missing { position: usize, entity: String },
    Button(RenderedButton),
}

impl RenderedNode {
    pub fn position(&self) -> usize {
        match self {
            RenderedNode::Missing { position, .. } => *position,
            RenderedNode::Button(button) => button.position,
        }
    }

    pub fn entity(&self) -> &str {
        match self {
            RenderedNode::Missing { entity, .. } => entity,
            RenderedNode::Button(button) => &button.entity,
        }
    }

    pub fn as_button(&self) -> Option<&RenderedButton> {
        match self {
            RenderedNode::Button(button) => Some(button),
            RenderedNode::Missing { .. } => None,
        }
    }
}

/// Render every config against the snapshot, in config order
pub fn render_row(configs: &[EntityConfig], states: &StateSnapshot) -> Vec<RenderedNode> {
    let mut occurrences: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();

    configs
        .iter()
        .enumerate()
        .map(|(position, config)| {
            // Occurrence counting must not depend on the snapshot, or keys
            // would shift as entities appear and disappear.
            let badge_key = if config.shows_icon() {
                let count = occurrences.entry(config.entity.as_str()).or_insert(0);
                let key = BadgeKey {
                    entity: config.entity.clone(),
                    occurrence: *count,
                };
                *count += 1;
                Some(key)
            } else {
                None
            };

            let Some(state) = states.get(&config.entity) else {
                return RenderedNode::Missing {
                    position,
                    entity: config.entity.clone(),
                };
            };

            RenderedNode::Button(RenderedButton {
                position,
                entity: config.entity.clone(),
                tooltip: compute_tooltip(config, Some(state)),
                badge: badge_key.map(|key| BadgeSlot {
                    key,
                    icon_override: config.icon.clone(),
                    image_override: config.image.clone(),
                }),
                label: compute_label(config, state),
                affordances: Affordances::for_config(config),
                focusable: true,
            })
        })
        .collect()
}

/// Label shown under/next to the badge
///
/// Shown when `show_name` is true, or when a `name` is set and `show_name`
/// is not explicitly false. The explicit name wins over the computed one.
pub fn compute_label(config: &EntityConfig, state: &EntityState) -> String {
    let show = config.show_name == Some(true)
        || (config.name.is_some() && config.show_name != Some(false));
    if !show {
        return String::new();
    }
    config.name.clone().unwrap_or_else(|| state.name())
}

pub fn compute_tooltip(config: &EntityConfig, state: Option<&EntityState>) -> String {
    let state_name = state
        .map(|s| s.name())
        .unwrap_or_else(|| config.entity.clone());

    if config.tap_action.is_none() && config.hold_action.is_none() {
        return state_name;
    }

    let tap = config
        .tap_action
        .as_ref()
        .and_then(|a| action_tooltip(&state_name, a))
        .map(|t| format!("Tap: {}", t));
    let hold = config
        .hold_action
        .as_ref()
        .and_then(|a| action_tooltip(&state_name, a))
        .map(|t| format!("Hold: {}", t));

    [tap, hold].into_iter().flatten().collect::<Vec<_>>().join("\n")
}

fn action_tooltip(state_name: &str, action: &ActionConfig) -> Option<String> {
    let text = match action.action {
        ActionType::None => return None,
        ActionType::Toggle => format!("Toggle {}", state_name),
        ActionType::MoreInfo => format!("Show more info: {}", state_name),
        ActionType::Navigate => format!(
            "Navigate to {}",
            action.navigation_path.as_deref().unwrap_or("")
        ),
        ActionType::Url => format!("Open window to {}", action.url_path.as_deref().unwrap_or("")),
        ActionType::CallService => {
            format!("Call service {}", action.service.as_deref().unwrap_or(""))
        }
    };
    Some(text)
}
