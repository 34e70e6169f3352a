use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Popup};
use crate::row::binder::BadgeHandle;
use crate::row::{RenderedButton, RenderedNode};
use crate::theme::Theme;

const ALERT_GLYPH: &str = "\u{F0026}";
const IMAGE_GLYPH: &str = "\u{F02E9}";
const GENERIC_GLYPH: &str = "\u{F00C0}";

/// Frame split: info line, button row, tooltip panel, footer
fn layout(area: Rect) -> [Rect; 4] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Info line
            Constraint::Length(5), // Button row
            Constraint::Min(3),    // Tooltip of the focused button
            Constraint::Length(1), // Footer
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2], chunks[3]]
}

/// One evenly sized slot per rendered node inside the row box
fn button_areas(row: Rect, count: usize) -> Vec<Rect> {
    if count == 0 {
        return Vec::new();
    }
    let inner = Block::default().borders(Borders::ALL).inner(row);
    let constraints: Vec<Constraint> = (0..count)
        .map(|_| Constraint::Ratio(1, count as u32))
        .collect();
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(inner)
        .to_vec()
}

/// Position of the node under a screen cell, if any
pub fn button_at(frame: Rect, count: usize, cell: Position) -> Option<usize> {
    let [_, row, _, _] = layout(frame);
    button_areas(row, count)
        .iter()
        .position(|area| area.contains(cell))
}

pub fn draw(f: &mut Frame, app: &App) {
    let [info, row, tooltip, footer] = layout(f.area());

    draw_info_line(f, app, info);
    draw_row(f, app, row);
    draw_tooltip(f, app, tooltip);
    draw_footer(f, app, footer);

    match app.popup {
        Popup::None => {}
        Popup::Help => draw_help_popup(f, &app.theme),
        Popup::Confirm => draw_confirm_popup(f, app),
        Popup::MoreInfo => draw_more_info_popup(f, app),
    }
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let line = if let Some(ref status) = app.status_message {
        Line::from(Span::styled(status.as_str(), Style::default().fg(theme.active)))
    } else {
        let missing = app
            .nodes
            .iter()
            .filter(|n| matches!(n, RenderedNode::Missing { .. }))
            .count();
        let mut spans = vec![Span::styled(
            format!("{} entities · {} badges", app.nodes.len(), app.badges.len()),
            Style::default().fg(theme.text_dim),
        )];
        if missing > 0 {
            spans.push(Span::styled(" │ ", Style::default().fg(theme.text_dim)));
            spans.push(Span::styled(
                format!("{} missing", missing),
                Style::default().fg(theme.missing),
            ));
        }
        Line::from(spans)
    };

    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn draw_row(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let block = Block::default()
        .title(Span::styled(" Entities ", Style::default().fg(theme.active).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border));

    if app.nodes.is_empty() {
        let empty = Paragraph::new("No entities configured")
            .style(Style::default().fg(theme.text_dim))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    f.render_widget(block, area);

    for (node, slot) in app.nodes.iter().zip(button_areas(area, app.nodes.len())) {
        let content = match node {
            RenderedNode::Missing { .. } => Paragraph::new(vec![
                Line::from(Span::styled(ALERT_GLYPH, Style::default().fg(theme.missing))),
                Line::from(""),
            ]),
            RenderedNode::Button(button) => {
                let focused = app.focused == Some(button.position);
                button_paragraph(app, button, focused)
            }
        };
        f.render_widget(content.alignment(Alignment::Center), slot);
    }
}

fn button_paragraph<'a>(app: &'a App, button: &'a RenderedButton, focused: bool) -> Paragraph<'a> {
    let theme = &app.theme;

    let badge_line = match &button.badge {
        Some(slot) => match app.badges.get(&slot.key) {
            Some(handle) => {
                Line::from(Span::styled(badge_glyph(handle), Style::default().fg(badge_color(handle, theme))))
            }
            // Registry has not caught up with this render yet
            None => Line::from(Span::styled(GENERIC_GLYPH, Style::default().fg(theme.unavailable))),
        },
        None => Line::from(""),
    };

    let label_style = if focused {
        Style::default().fg(theme.text).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.text)
    };
    let label_line = Line::from(Span::styled(button.label.as_str(), label_style));

    let style = if focused {
        Style::default().bg(theme.focus)
    } else {
        Style::default()
    };
    Paragraph::new(vec![badge_line, label_line]).style(style)
}

fn badge_color(handle: &BadgeHandle, theme: &Theme) -> Color {
    if handle.is_unavailable() {
        theme.unavailable
    } else if handle.is_active() {
        theme.active
    } else {
        theme.inactive
    }
}

fn badge_glyph(handle: &BadgeHandle) -> &'static str {
    if handle.image().is_some() {
        return IMAGE_GLYPH;
    }
    if let Some(icon) = handle.icon_name() {
        return icon_glyph(icon.trim_start_matches("mdi:").trim_start_matches("hass:"));
    }
    let domain = handle
        .state
        .as_ref()
        .map(|s| s.domain())
        .unwrap_or_else(|| handle.slot.key.entity.split('.').next().unwrap_or(""));
    domain_glyph(domain)
}

fn icon_glyph(name: &str) -> &'static str {
    match name {
        "lightbulb" | "lamp" | "ceiling-light" => "\u{F0335}",
        "fan" => "\u{F0210}",
        "lock" => "\u{F033E}",
        "thermometer" => "\u{F050F}",
        "power" | "power-plug" => "\u{F0425}",
        "alert" => ALERT_GLYPH,
        _ => GENERIC_GLYPH,
    }
}

fn domain_glyph(domain: &str) -> &'static str {
    match domain {
        "light" => "\u{F0335}",
        "switch" | "input_boolean" => "\u{F0521}",
        "fan" => "\u{F0210}",
        "lock" => "\u{F033E}",
        "sensor" => "\u{F0208}",
        "climate" => "\u{F050F}",
        "media_player" => "\u{F040A}",
        "scene" => "\u{F03D8}",
        _ => GENERIC_GLYPH,
    }
}

fn draw_tooltip(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let block = Block::default()
        .title(Span::styled(" Details ", Style::default().fg(theme.border)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border));

    let lines: Vec<Line> = match app.focused_node().and_then(|n| n.as_button()) {
        Some(button) => {
            let mut lines: Vec<Line> = button
                .tooltip
                .lines()
                .map(|l| Line::from(Span::styled(l, Style::default().fg(theme.text))))
                .collect();
            if let Some(state) = app.states.get(&button.entity) {
                lines.push(Line::from(Span::styled(
                    format!("{} · {}", button.entity, state.state),
                    Style::default().fg(theme.text_dim),
                )));
            }
            lines
        }
        None => vec![Line::from(Span::styled(
            "Nothing focused",
            Style::default().fg(theme.text_dim),
        ))],
    };

    let content = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(content, area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let mut hints: Vec<(&str, &str)> = vec![("Tab", "Next"), ("Enter", "Tap")];

    if let Some(button) = app.focused_node().and_then(|n| n.as_button()) {
        if button.affordances.hold {
            hints.push(("l", "Hold"));
        }
        if button.affordances.double_tap {
            hints.push(("d", "Double-tap"));
        }
    }
    hints.push(("?", "Help"));
    hints.push(("q", "Quit"));

    // Responsive: show fewer hints on narrow terminals
    let max_hints = if area.width < 60 { 4 } else { hints.len() };

    let hint_spans: Vec<Span> = hints
        .iter()
        .take(max_hints)
        .flat_map(|(key, action)| {
            vec![
                Span::styled(*key, Style::default().fg(theme.active)),
                Span::styled(format!(" {} │ ", action), Style::default().fg(theme.text_dim)),
            ]
        })
        .collect();

    let footer = Paragraph::new(Line::from(hint_spans)).alignment(Alignment::Center);
    f.render_widget(footer, area);
}

fn draw_help_popup(f: &mut Frame, theme: &Theme) {
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 60 },
        if area.height < 30 { 95 } else { 60 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let heading = Style::default().fg(theme.active).add_modifier(Modifier::BOLD);
    let key = Style::default().fg(theme.active);

    let help_text = vec![
        Line::from(Span::styled("═══ Navigation ═══", heading)),
        Line::from(vec![
            Span::styled("  Tab/→     ", key),
            Span::raw("Focus next button"),
        ]),
        Line::from(vec![
            Span::styled("  S-Tab/←   ", key),
            Span::raw("Focus previous button"),
        ]),
        Line::from(""),
        Line::from(Span::styled("═══ Actions ═══", heading)),
        Line::from(vec![
            Span::styled("  Enter     ", key),
            Span::raw("Tap (toggles unless configured otherwise)"),
        ]),
        Line::from(vec![
            Span::styled("  l         ", key),
            Span::raw("Hold, when the button has a hold action"),
        ]),
        Line::from(vec![
            Span::styled("  d         ", key),
            Span::raw("Double-tap, when the button has a double-tap action"),
        ]),
        Line::from(vec![
            Span::styled("  Mouse     ", key),
            Span::raw("Click, long-press and double-click work too"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(theme.text_dim)),
            Span::styled("?", key),
            Span::styled("/", Style::default().fg(theme.text_dim)),
            Span::styled("Esc", key),
            Span::styled(" to close", Style::default().fg(theme.text_dim)),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" buttonrow Help ", key))
                .borders(Borders::ALL)
                .border_style(key),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

fn draw_confirm_popup(f: &mut Frame, app: &App) {
    let theme = &app.theme;
    let popup_area = centered_rect(40, 20, f.area());

    f.render_widget(Clear, popup_area);

    let message = app
        .pending_confirm
        .as_ref()
        .map(|p| p.text.as_str())
        .unwrap_or("Confirm?");

    let confirm = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(theme.missing))),
        Line::from(""),
        Line::from(vec![
            Span::styled("  y", Style::default().fg(theme.active).add_modifier(Modifier::BOLD)),
            Span::raw(" Yes   "),
            Span::styled("n", Style::default().fg(theme.inactive).add_modifier(Modifier::BOLD)),
            Span::raw(" No"),
        ]),
    ])
    .block(
        Block::default()
            .title(Span::styled(" Confirm ", Style::default().fg(theme.missing)))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.missing)),
    )
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });

    f.render_widget(confirm, popup_area);
}

fn draw_more_info_popup(f: &mut Frame, app: &App) {
    let theme = &app.theme;
    let popup_area = centered_rect(60, 60, f.area());

    f.render_widget(Clear, popup_area);

    let entity = app.more_info.as_deref().unwrap_or("");
    let mut lines = Vec::new();

    match app.states.get(entity) {
        Some(state) => {
            lines.push(Line::from(vec![
                Span::styled(state.name(), Style::default().fg(theme.text).add_modifier(Modifier::BOLD)),
                Span::styled(format!("  {}", state.state), Style::default().fg(theme.active)),
            ]));
            lines.push(Line::from(""));
            for (key, value) in &state.attributes {
                let value = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                lines.push(Line::from(vec![
                    Span::styled(format!("{:<20}", key), Style::default().fg(theme.text_dim)),
                    Span::styled(value, Style::default().fg(theme.text)),
                ]));
            }
        }
        None => lines.push(Line::from(Span::styled(
            "No state available",
            Style::default().fg(theme.missing),
        ))),
    }

    let info = Paragraph::new(lines)
        .block(
            Block::default()
                .title(Span::styled(format!(" {} ", entity), Style::default().fg(theme.active)))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.active)),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(info, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EntityConfig, RowConfig};
    use crate::entity::{EntityState, StateSnapshot};
    use ratatui::{backend::TestBackend, Terminal};

    fn app() -> App {
        let config = RowConfig {
            entities: vec![
                EntityConfig {
                    entity: "light.a".to_string(),
                    name: Some("Lamp".to_string()),
                    ..Default::default()
                },
                EntityConfig::new("light.gone"),
            ],
            ..Default::default()
        };
        let states: StateSnapshot = [EntityState::new("light.a", "on")].into_iter().collect();
        App::new(config, states)
    }

    #[test]
    fn test_button_at_hits_slots() {
        let frame = Rect::new(0, 0, 40, 12);
        // Row box starts at y=1, inner area at y=2, x from 1 to 38
        assert_eq!(button_at(frame, 2, Position::new(2, 2)), Some(0));
        assert_eq!(button_at(frame, 2, Position::new(30, 3)), Some(1));
        assert_eq!(button_at(frame, 2, Position::new(2, 0)), None);
        assert_eq!(button_at(frame, 0, Position::new(2, 2)), None);
    }

    #[test]
    fn test_draw_renders_label_and_placeholder() {
        let app = app();
        let mut terminal = Terminal::new(TestBackend::new(60, 14)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content.iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Lamp"));
        assert!(text.contains(ALERT_GLYPH));
        assert!(text.contains("1 missing"));
    }
}
