//! Badge registry and state binding
//!
//! Badges are keyed by `BadgeKey`, not by position, so a binding pass can
//! never pair a badge with the wrong entity. If `bind` runs before
//! `reconcile` has seen a config change it touches only the badges that
//! exist; the next reconcile + bind converges.

use std::collections::HashMap;

use super::{BadgeKey, BadgeSlot, RenderedNode};
use crate::entity::{EntityState, StateSnapshot};

/// Live badge widget state
#[derive(Debug, Clone, PartialEq)]
pub struct BadgeHandle {
    pub slot: BadgeSlot,
    pub state: Option<EntityState>,
}

impl BadgeHandle {
    fn new(slot: BadgeSlot) -> Self {
        Self { slot, state: None }
    }

    pub fn is_active(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.is_active())
    }

    pub fn is_unavailable(&self) -> bool {
        self.state.as_ref().map_or(true, |s| s.is_unavailable())
    }

    /// Override icon first, then the entity's own icon attribute
    pub fn icon_name(&self) -> Option<&str> {
        self.slot
            .icon_override
            .as_deref()
            .or_else(|| self.state.as_ref().and_then(|s| s.icon_attribute()))
    }

    pub fn image(&self) -> Option<&str> {
        self.slot
            .image_override
            .as_deref()
            .or_else(|| self.state.as_ref().and_then(|s| s.picture_attribute()))
    }
}

#[derive(Debug, Default)]
pub struct BadgeRegistry {
    badges: HashMap<BadgeKey, BadgeHandle>,
}

impl BadgeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match the registry to the badge slots of a fresh render
    pub fn reconcile(&mut self, nodes: &[RenderedNode]) {
        let slots: Vec<&BadgeSlot> = nodes
            .iter()
            .filter_map(|n| n.as_button())
            .filter_map(|b| b.badge.as_ref())
            .collect();

        self.badges
            .retain(|key, _| slots.iter().any(|slot| &slot.key == key));

        for slot in slots {
            match self.badges.get_mut(&slot.key) {
                Some(handle) => handle.slot = slot.clone(),
                None => {
                    self.badges
                        .insert(slot.key.clone(), BadgeHandle::new(slot.clone()));
                }
            }
        }
    }

    /// Push the snapshot into every registered badge; returns how many were touched
    pub fn bind(&mut self, states: &StateSnapshot) -> usize {
        for (key, handle) in self.badges.iter_mut() {
            handle.state = states.get(&key.entity).cloned();
        }
        tracing::debug!("Bound {} badges", self.badges.len());
        self.badges.len()
    }

    pub fn get(&self, key: &BadgeKey) -> Option<&BadgeHandle> {
        self.badges.get(key)
    }

    pub fn len(&self) -> usize {
        self.badges.len()
    }
}
