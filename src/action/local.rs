//! In-process action pipeline for the terminal host
//!
//! Resolves the gesture to one action and turns it into `HostEffect`s the
//! app applies afterwards: state changes to its own store, popups, status
//! lines and url opening.

use serde_json::Value;

use super::{ActionConfig, ActionKind, ActionOrigin, ActionPipeline, ActionType, MergedActions};
use crate::entity::{EntityState, StateSnapshot};

#[derive(Debug, Clone, PartialEq)]
pub enum HostEffect {
    /// Ask the user before running `action`
    Confirm {
        text: String,
        entity: String,
        action: ActionConfig,
    },
    SetState(EntityState),
    MoreInfo(String),
    Navigate(String),
    OpenUrl(String),
    ServiceCalled {
        service: String,
        data: Option<Value>,
    },
    Status(String),
}

#[derive(Debug, Default)]
pub struct LocalPipeline {
    effects: Vec<HostEffect>,
}

impl LocalPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain_effects(&mut self) -> Vec<HostEffect> {
        std::mem::take(&mut self.effects)
    }

    /// Run an action without asking for confirmation
    pub fn execute(&mut self, entity: &str, action: &ActionConfig, states: &StateSnapshot) {
        match action.action {
            ActionType::None => {}
            ActionType::Toggle => self.toggle(entity, states),
            ActionType::MoreInfo => self.effects.push(HostEffect::MoreInfo(entity.to_string())),
            ActionType::Navigate => match &action.navigation_path {
                Some(path) => self.effects.push(HostEffect::Navigate(path.clone())),
                None => self.warn("navigate action without navigation_path"),
            },
            ActionType::Url => match &action.url_path {
                Some(url) => self.effects.push(HostEffect::OpenUrl(url.clone())),
                None => self.warn("url action without url_path"),
            },
            ActionType::CallService => match &action.service {
                Some(service) => {
                    tracing::info!("Calling service {} for {}", service, entity);
                    self.effects.push(HostEffect::ServiceCalled {
                        service: service.clone(),
                        data: action.service_data.clone(),
                    });
                }
                None => self.warn("call-service action without service"),
            },
        }
    }

    fn toggle(&mut self, entity: &str, states: &StateSnapshot) {
        let Some(current) = states.get(entity) else {
            self.effects
                .push(HostEffect::Status(format!("{} not found", entity)));
            return;
        };

        if current.is_unavailable() {
            self.effects
                .push(HostEffect::Status(format!("{} is unavailable", current.name())));
            return;
        }

        let mut next = current.clone();
        next.state = if current.is_active() { "off" } else { "on" }.to_string();
        tracing::info!("Toggling {}: {} -> {}", entity, current.state, next.state);
        self.effects.push(HostEffect::SetState(next));
    }

    fn warn(&mut self, msg: &str) {
        tracing::warn!("{}", msg);
        self.effects.push(HostEffect::Status(format!("Invalid action: {}", msg)));
    }
}

impl ActionPipeline for LocalPipeline {
    fn handle_action(
        &mut self,
        origin: ActionOrigin,
        states: &StateSnapshot,
        actions: &MergedActions,
        kind: ActionKind,
    ) {
        let action = actions.resolve(kind);
        tracing::debug!(
            "Button {} {:?} -> {:?}",
            origin.position,
            kind,
            action.action
        );

        if action.action == ActionType::None {
            return;
        }

        if let Some(confirmation) = &action.confirmation {
            let text = confirmation.text.clone().unwrap_or_else(|| {
                format!("Are you sure you want to {}?", describe(&action))
            });
            self.effects.push(HostEffect::Confirm {
                text,
                entity: actions.entity.clone(),
                action,
            });
            return;
        }

        self.execute(&actions.entity, &action, states);
    }
}

fn describe(action: &ActionConfig) -> &'static str {
    match action.action {
        ActionType::None => "do nothing",
        ActionType::Toggle => "toggle",
        ActionType::MoreInfo => "show more info",
        ActionType::Navigate => "navigate",
        ActionType::Url => "open the url",
        ActionType::CallService => "call the service",
    }
}
