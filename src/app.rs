use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};
use std::time::{Duration, Instant};

use crate::action::local::{HostEffect, LocalPipeline};
use crate::action::{dispatch, ActionConfig, ActionKind, ActionOrigin, ButtonEvent};
use crate::config::{EntityConfig, RowConfig};
use crate::entity::StateSnapshot;
use crate::row::binder::BadgeRegistry;
use crate::row::gesture::{Gesture, GestureClassifier};
use crate::row::{render_row, RenderedNode};
use crate::theme::Theme;

/// How long a status message stays in the info line
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Help,
    Confirm,
    MoreInfo,
}

/// An action waiting for the user to answer the confirmation popup
#[derive(Debug, Clone, PartialEq)]
pub struct PendingConfirm {
    pub text: String,
    pub entity: String,
    pub action: ActionConfig,
}

pub struct App {
    pub config: RowConfig,
    pub states: StateSnapshot,
    pub theme: Theme,

    // Derived view, rebuilt on every snapshot or config change
    pub nodes: Vec<RenderedNode>,
    pub badges: BadgeRegistry,

    // Position of the focused button, if any button is focusable
    pub focused: Option<usize>,
    pub popup: Popup,
    pub pending_confirm: Option<PendingConfirm>,
    pub more_info: Option<String>,

    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,

    gestures: GestureClassifier,
    pipeline: LocalPipeline,
}

impl App {
    pub fn new(config: RowConfig, states: StateSnapshot) -> Self {
        let gestures = GestureClassifier::new(
            Duration::from_millis(config.hold_ms),
            Duration::from_millis(config.double_tap_ms),
        );
        let theme = Theme::from_config(&config.theme);

        let mut app = Self {
            config,
            states,
            theme,
            nodes: Vec::new(),
            badges: BadgeRegistry::new(),
            focused: None,
            popup: Popup::None,
            pending_confirm: None,
            more_info: None,
            status_message: None,
            status_message_time: None,
            gestures,
            pipeline: LocalPipeline::new(),
        };
        app.refresh();
        app
    }

    /// Replace the state snapshot wholesale
    pub fn set_states(&mut self, states: StateSnapshot) {
        self.states = states;
        self.refresh();
    }

    /// Replace the entity list wholesale
    pub fn set_entities(&mut self, entities: Vec<EntityConfig>) {
        self.config.entities = entities;
        self.gestures.cancel();
        self.refresh();
    }

    /// Render, then reconcile badges with the render, then bind state.
    /// Binding always sees the badge set of the current config.
    fn refresh(&mut self) {
        self.nodes = render_row(&self.config.entities, &self.states);
        self.badges.reconcile(&self.nodes);
        self.badges.bind(&self.states);

        let still_focusable = self
            .focused
            .is_some_and(|p| self.nodes.get(p).is_some_and(|n| n.as_button().is_some()));
        if !still_focusable {
            self.focused = self.focusable_positions().first().copied();
        }
    }

    fn focusable_positions(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .filter_map(|n| n.as_button())
            .filter(|b| b.focusable)
            .map(|b| b.position)
            .collect()
    }

    pub fn focused_node(&self) -> Option<&RenderedNode> {
        self.focused.and_then(|p| self.nodes.get(p))
    }

    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    fn move_focus(&mut self, forward: bool) {
        let positions = self.focusable_positions();
        if positions.is_empty() {
            self.focused = None;
            return;
        }

        let current = self
            .focused
            .and_then(|p| positions.iter().position(|&q| q == p));
        let next = match current {
            None => 0,
            Some(i) if forward => (i + 1) % positions.len(),
            Some(i) => i.checked_sub(1).unwrap_or(positions.len() - 1),
        };
        self.focused = Some(positions[next]);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.popup != Popup::None {
            self.handle_popup_key(key);
            return;
        }

        match key.code {
            KeyCode::Tab | KeyCode::Right => self.move_focus(true),
            KeyCode::BackTab | KeyCode::Left => self.move_focus(false),

            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(position) = self.focused {
                    self.trigger(position, ActionKind::Tap);
                }
            }

            // Keyboard stand-ins for pointer gestures, only where armed
            KeyCode::Char('l') => {
                if let Some(button) = self.focused_node().and_then(|n| n.as_button()) {
                    if button.affordances.hold {
                        let position = button.position;
                        self.trigger(position, ActionKind::Hold);
                    }
                }
            }
            KeyCode::Char('d') => {
                if let Some(button) = self.focused_node().and_then(|n| n.as_button()) {
                    if button.affordances.double_tap {
                        let position = button.position;
                        self.trigger(position, ActionKind::DoubleTap);
                    }
                }
            }

            KeyCode::Char('?') | KeyCode::Char('h') => self.popup = Popup::Help,
            _ => {}
        }
    }

    fn handle_popup_key(&mut self, key: KeyEvent) {
        match self.popup {
            Popup::Confirm => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => self.answer_confirm(true),
                KeyCode::Char('n') | KeyCode::Esc => self.answer_confirm(false),
                _ => {}
            },
            Popup::Help | Popup::MoreInfo => {
                if matches!(
                    key.code,
                    KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Enter | KeyCode::Char('q')
                ) {
                    self.popup = Popup::None;
                    self.more_info = None;
                }
            }
            Popup::None => {}
        }
    }

    /// Feed pointer events into the gesture classifier
    pub fn handle_mouse(&mut self, mouse: MouseEvent, frame: Rect, now: Instant) {
        if self.popup != Popup::None {
            return;
        }

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let hit = crate::ui::button_at(frame, self.nodes.len(), Position::new(mouse.column, mouse.row))
                    .and_then(|p| self.nodes.get(p))
                    .and_then(|n| n.as_button())
                    .map(|b| (b.position, b.affordances));

                if let Some((position, affordances)) = hit {
                    self.focused = Some(position);
                    if let Some(flushed) = self.gestures.press(now, position, affordances) {
                        self.on_gesture(flushed);
                    }
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                for gesture in self.gestures.release(now) {
                    self.on_gesture(gesture);
                }
            }
            _ => {}
        }
    }

    /// Periodic housekeeping: flush pending taps, expire status messages
    pub fn tick(&mut self, now: Instant) {
        if let Some(gesture) = self.gestures.poll(now) {
            self.on_gesture(gesture);
        }

        if let Some(since) = self.status_message_time {
            if now.duration_since(since) >= STATUS_TIMEOUT {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }

    fn on_gesture(&mut self, gesture: Gesture) {
        self.trigger(gesture.target, gesture.kind);
    }

    /// Dispatch an action for the button at `position`
    fn trigger(&mut self, position: usize, kind: ActionKind) {
        // Placeholders carry no action handler
        if self.nodes.get(position).and_then(|n| n.as_button()).is_none() {
            return;
        }
        let Some(config) = self.config.entities.get(position) else {
            return;
        };

        let event = ButtonEvent {
            origin: ActionOrigin { position },
            config: config.clone(),
            kind,
        };
        dispatch(&event, &self.states, &mut self.pipeline);
        self.apply_effects();
    }

    fn answer_confirm(&mut self, confirmed: bool) {
        self.popup = Popup::None;
        let Some(pending) = self.pending_confirm.take() else {
            return;
        };

        if confirmed {
            self.pipeline
                .execute(&pending.entity, &pending.action, &self.states);
            self.apply_effects();
        } else {
            self.set_status("Action cancelled");
        }
    }

    fn apply_effects(&mut self) {
        let mut changed = false;

        for effect in self.pipeline.drain_effects() {
            match effect {
                HostEffect::Confirm { text, entity, action } => {
                    self.pending_confirm = Some(PendingConfirm { text, entity, action });
                    self.popup = Popup::Confirm;
                }
                HostEffect::SetState(state) => {
                    self.set_status(format!("{} turned {}", state.name(), state.state));
                    self.states.insert(state);
                    changed = true;
                }
                HostEffect::MoreInfo(entity) => {
                    self.more_info = Some(entity);
                    self.popup = Popup::MoreInfo;
                }
                HostEffect::Navigate(path) => self.set_status(format!("Navigate to {}", path)),
                HostEffect::OpenUrl(url) => match open::that(&url) {
                    Ok(()) => self.set_status(format!("Opened {}", url)),
                    Err(e) => {
                        tracing::warn!("Failed to open {}: {}", url, e);
                        self.set_status(format!("Could not open {}", url));
                    }
                },
                HostEffect::ServiceCalled { service, .. } => {
                    self.set_status(format!("Called {}", service))
                }
                HostEffect::Status(msg) => self.set_status(msg),
            }
        }

        if changed {
            self.refresh();
        }
    }
}
