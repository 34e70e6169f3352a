mod action;
mod app;
mod config;
mod entity;
mod row;
mod theme;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use app::{App, Popup};
use config::RowConfig;
use entity::source::StateSource;
use entity::StateSnapshot;

#[derive(Parser, Debug)]
#[command(name = "buttonrow")]
#[command(version = "0.1.0")]
#[command(about = "A row of entity buttons bound to live state")]
struct Args {
    /// Config file (defaults to ~/.config/buttonrow/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON state snapshot file (overrides `state_file` from the config)
    #[arg(short, long)]
    states: Option<PathBuf>,

    /// Print the rendered row as JSON and exit
    #[arg(short, long)]
    render: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so they don't tear the TUI
    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    let config = match &args.config {
        Some(path) => RowConfig::load_from(path)?,
        None => RowConfig::load(),
    };

    let state_file = args.states.clone().or_else(|| config.state_file.clone());
    let states = match &state_file {
        Some(path) => StateSnapshot::load(path)
            .with_context(|| format!("Could not load states from {}", path.display()))?,
        None => {
            tracing::warn!("No state file configured, every entity will show as missing");
            StateSnapshot::new()
        }
    };

    if args.render {
        return print_render(config, states);
    }

    run_tui(config, states, state_file).await
}

fn print_render(config: RowConfig, states: StateSnapshot) -> Result<()> {
    let app = App::new(config, states);
    println!("{}", serde_json::to_string_pretty(&render_json(&app))?);
    Ok(())
}

/// Rendered nodes plus bound badges, badges in row order
fn render_json(app: &App) -> serde_json::Value {
    let badges: Vec<serde_json::Value> = app
        .nodes
        .iter()
        .filter_map(|n| n.as_button())
        .filter_map(|b| b.badge.as_ref())
        .filter_map(|slot| app.badges.get(&slot.key))
        .map(|b| {
            serde_json::json!({
                "key": b.slot.key,
                "state": b.state.as_ref().map(|s| s.state.as_str()),
                "active": b.is_active(),
                "icon": b.icon_name(),
                "image": b.image(),
            })
        })
        .collect();

    serde_json::json!({
        "nodes": app.nodes,
        "badges": badges,
    })
}

async fn run_tui(config: RowConfig, states: StateSnapshot, state_file: Option<PathBuf>) -> Result<()> {
    // Start pushing snapshots before the terminal is taken over
    let (state_rx, source_handle) = match state_file {
        Some(path) => {
            let refresh = Duration::from_millis(config.refresh_ms.max(50));
            let (rx, handle) = StateSource::new(path, refresh).spawn();
            (Some(rx), Some(handle))
        }
        None => (None, None),
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, states);

    let result = run_app(&mut terminal, &mut app, state_rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Some(handle) = source_handle {
        handle.abort();
    }

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    mut state_rx: Option<mpsc::UnboundedReceiver<StateSnapshot>>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        // Every pushed snapshot gets its own render + bind pass
        if let Some(rx) = state_rx.as_mut() {
            while let Ok(snapshot) = rx.try_recv() {
                app.set_states(snapshot);
            }
        }

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') if app.popup == Popup::None => return Ok(()),
                    KeyCode::Char('c') if key.modifiers.contains(event::KeyModifiers::CONTROL) => {
                        return Ok(())
                    }
                    _ => app.handle_key(key),
                },
                Event::Mouse(mouse) => {
                    let size = terminal.size()?;
                    let frame = Rect::new(0, 0, size.width, size.height);
                    app.handle_mouse(mouse, frame, Instant::now());
                }
                _ => {}
            }
        }

        app.tick(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::EntityConfig;
    use entity::EntityState;

    #[test]
    fn test_render_json_badges_follow_row_order() {
        let ids = ["light.e", "light.a", "light.d", "light.b", "light.a", "light.c"];
        let config = RowConfig {
            entities: ids.iter().map(|id| EntityConfig::new(*id)).collect(),
            ..Default::default()
        };
        let states: StateSnapshot = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|s| EntityState::new(format!("light.{}", s), "on"))
            .collect();

        let output = render_json(&App::new(config, states));
        let keys: Vec<(String, u64)> = output["badges"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| {
                (
                    b["key"]["entity"].as_str().unwrap().to_string(),
                    b["key"]["occurrence"].as_u64().unwrap(),
                )
            })
            .collect();

        assert_eq!(
            keys,
            vec![
                ("light.e".to_string(), 0),
                ("light.a".to_string(), 0),
                ("light.d".to_string(), 0),
                ("light.b".to_string(), 0),
                ("light.a".to_string(), 1),
                ("light.c".to_string(), 0),
            ]
        );
        assert_eq!(output["nodes"].as_array().unwrap().len(), 6);
    }
}
