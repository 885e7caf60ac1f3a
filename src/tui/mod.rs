//! Terminal host: canvas, parameter panel and status bar drawn with ratatui.
//!
//! The App struct holds all TUI state and drives the event loop.

pub mod canvas;
pub mod keybindings;
pub mod layout;
pub mod panel;
pub mod startup;
pub mod status;

pub use canvas::{CellSurface, CELL_HEIGHT, CELL_WIDTH};
pub use keybindings::{map_key, Action};
pub use layout::ScreenLayout;
pub use panel::ParamPanel;
pub use startup::{Startup, StartupRequest};
pub use status::StatusInfo;

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::engine::{Engine, PluginSwitch};
use crate::interaction::{PointerButton, PointerId, PressTarget};
use crate::param::{format_value, Handle};
use crate::plugin::PluginCatalog;

/// Input poll timeout; also bounds the frame interval.
const POLL_INTERVAL_MS: u64 = 16;

/// The terminal has a single pointer.
const MOUSE_POINTER: PointerId = 0;

/// The main TUI application state.
pub struct App {
    pub engine: Engine<CellSurface>,
    pub catalog: PluginCatalog,
    pub panel: ParamPanel,
    pub status: StatusInfo,
    pub should_quit: bool,
    /// Text typed into the focused value, while editing.
    pub editing: Option<String>,
    /// Share payload overlay contents.
    pub share_text: Option<String>,
    speeds: Vec<f64>,
    speed_index: usize,
}

impl App {
    pub fn new(engine: Engine<CellSurface>, catalog: PluginCatalog, speeds: Vec<f64>) -> Self {
        let speeds = if speeds.is_empty() { vec![1.0] } else { speeds };
        let current = engine.playback_multiplier();
        let speed_index = speeds
            .iter()
            .position(|speed| (*speed - current).abs() < f64::EPSILON)
            .unwrap_or(0);
        Self {
            engine,
            catalog,
            panel: ParamPanel::default(),
            status: StatusInfo::default(),
            should_quit: false,
            editing: None,
            share_text: None,
            speeds,
            speed_index,
        }
    }

    fn focused_key(&self) -> Option<String> {
        self.panel
            .focused_key(self.engine.definitions())
            .map(str::to_string)
    }

    fn notify(&mut self, message: impl Into<String>) {
        self.status.message = Some(message.into());
    }

    pub fn handle_action(&mut self, action: Action) {
        self.status.message = None;
        match action {
            Action::Quit => self.should_quit = true,
            Action::TogglePlayback => {
                if self.engine.is_running() {
                    self.engine.stop();
                } else {
                    self.engine.start();
                }
            }
            Action::Restart => self.engine.restart(),
            Action::CycleSpeed => {
                self.speed_index = (self.speed_index + 1) % self.speeds.len();
                self.engine
                    .set_playback_multiplier(self.speeds[self.speed_index]);
            }
            Action::NextPlugin => self.cycle_plugin(1),
            Action::PrevPlugin => self.cycle_plugin(-1),
            Action::FocusUp => self.panel.move_focus(self.engine.definitions(), -1),
            Action::FocusDown => self.panel.move_focus(self.engine.definitions(), 1),
            Action::CycleHandle => self.panel.cycle_handle(self.engine.definitions()),
            Action::Step(nav) => {
                if let Some(key) = self.focused_key() {
                    self.engine.key_step(&key, self.panel.handle, nav);
                }
            }
            Action::CycleModulation => {
                if let Some(key) = self.focused_key() {
                    if self.engine.cycle_modulation_speed(&key).is_none() {
                        self.notify(format!("{key} cannot be modulated"));
                    }
                }
            }
            Action::ResetParameters => {
                self.engine.reset_parameters();
                self.notify("parameters reset");
            }
            Action::ToggleShare => {
                if self.share_text.take().is_none() {
                    match self.engine.share_payload() {
                        Ok(payload) => self.share_text = Some(payload),
                        Err(err) => self.notify(err.to_string()),
                    }
                }
            }
            Action::ClearCanvas => self.engine.clear_surface(),
            Action::BeginEdit => self.begin_edit(),
            Action::EditInsert(c) => {
                if let Some(buffer) = self.editing.as_mut() {
                    buffer.push(c);
                }
            }
            Action::EditBackspace => {
                if let Some(buffer) = self.editing.as_mut() {
                    buffer.pop();
                }
            }
            Action::EditCommit => self.commit_edit(),
            Action::EditCancel => self.editing = None,
            Action::Escape => self.share_text = None,
        }
    }

    fn cycle_plugin(&mut self, offset: isize) {
        let Some(id) = self
            .catalog
            .cycle(self.engine.plugin_id(), offset)
            .map(str::to_string)
        else {
            return;
        };
        let switch = PluginSwitch::default();
        let result = self
            .catalog
            .create(&id)
            .and_then(|plugin| self.engine.set_plugin(plugin, switch));
        match result {
            Ok(()) => {
                self.panel = ParamPanel::default();
                self.editing = None;
                self.share_text = None;
            }
            Err(err) => self.notify(err.to_string()),
        }
    }

    fn begin_edit(&mut self) {
        let Some(key) = self.focused_key() else {
            return;
        };
        let Some(def) = self.engine.definition(&key) else {
            return;
        };
        let text = self
            .engine
            .value(&key)
            .and_then(|value| value.handle_value(self.panel.handle))
            .map(|value| format_value(value, def.step))
            .unwrap_or_default();
        self.editing = Some(text);
    }

    fn commit_edit(&mut self) {
        let (Some(buffer), Some(key)) = (self.editing.take(), self.focused_key()) else {
            return;
        };
        let committed = match self.panel.handle {
            Handle::Current => self.engine.commit_scalar_text(&key, &buffer),
            handle => match buffer.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => self.engine.set_handle_value(&key, handle, value),
                _ => false,
            },
        };
        if !committed {
            self.notify(format!("kept {key}"));
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let x = mouse.column as f64;
        match mouse.kind {
            MouseEventKind::Down(button) => {
                let Some(hit) = self.panel.hit(mouse.column, mouse.row).cloned() else {
                    return;
                };
                self.panel.focus_key(self.engine.definitions(), &hit.key);
                let button = match button {
                    MouseButton::Left => PointerButton::Primary,
                    MouseButton::Right => PointerButton::Secondary,
                    MouseButton::Middle => PointerButton::Middle,
                };
                if self.engine.pointer_down(
                    MOUSE_POINTER,
                    &hit.key,
                    PressTarget::Track,
                    x,
                    hit.track,
                    button,
                ) {
                    if let Some(handle) = self.engine.dragged_handle(MOUSE_POINTER) {
                        self.panel.handle = handle;
                    }
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                self.engine.pointer_move(MOUSE_POINTER, x);
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.engine.pointer_up(MOUSE_POINTER);
            }
            _ => {}
        }
    }

    /// Match the canvas surface to its panel, resizing the engine on change.
    fn fit_canvas(&mut self, area: Rect) {
        let surface = self.engine.surface();
        if surface.cols() == area.width && surface.rows() == area.height {
            return;
        }
        self.engine.surface_mut().resize(area.width, area.height);
        let (width, height) = self.engine.surface().logical_size();
        self.engine.resize(width, height);
    }

    fn panel_lines(&self) -> u16 {
        let definitions = self.engine.definitions();
        let groups = definitions
            .windows(2)
            .filter(|pair| pair[0].group != pair[1].group)
            .count()
            + usize::from(!definitions.is_empty());
        (definitions.len() + groups) as u16
    }

    pub fn draw(&mut self, frame: &mut Frame) {
        let size = frame.area();
        let layout = ScreenLayout::compute(size, self.panel_lines());

        self.fit_canvas(layout.canvas);
        frame.render_widget(self.engine.surface(), layout.canvas);
        self.panel
            .draw(frame, layout.panel, &self.engine, self.editing.as_deref());
        self.draw_status(frame, layout.status);

        if self.share_text.is_some() {
            self.draw_share(frame, size);
        }
    }

    fn draw_status(&mut self, frame: &mut Frame, area: Rect) {
        self.status.plugin_name = self.engine.plugin_name().to_string();
        self.status.frame = self.engine.frame();
        self.status.is_playing = self.engine.is_running();
        self.status.playback_speed = self.engine.playback_multiplier();

        let playback = if self.status.is_playing {
            Color::Green
        } else {
            Color::Red
        };
        let mut spans = vec![
            Span::styled(
                format!(" {} ", self.status.playback_display()),
                Style::default().fg(playback).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(" {} ", self.status.plugin_name)),
            Span::styled(
                format!(" {} ", self.status.speed_display()),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw(format!(" {} ", self.status.frame_display())),
        ];
        if let Some(message) = &self.status.message {
            let style = Style::default().fg(Color::Yellow);
            spans.push(Span::styled(format!(" {message} "), style));
        }
        spans.push(Span::styled(
            " q quit  space play  n/p plugin  f mod  y share ",
            Style::default().fg(Color::DarkGray),
        ));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_share(&self, frame: &mut Frame, area: Rect) {
        let Some(text) = &self.share_text else {
            return;
        };
        let width = (area.width * 70 / 100).max(30).min(area.width);
        let height = 7.min(area.height);
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        let overlay = Rect::new(x, y, width, height);

        let block = Block::default()
            .style(Style::default().bg(Color::Black))
            .borders(Borders::ALL)
            .title(" Share payload (y or Esc to close) ");
        let inner = block.inner(overlay);
        frame.render_widget(Clear, overlay);
        frame.render_widget(block, overlay);
        frame.render_widget(
            Paragraph::new(text.as_str()).wrap(Wrap { trim: false }),
            inner,
        );
    }

    /// Run the TUI event loop.
    pub fn run(
        &mut self,
        terminal: &mut ratatui::Terminal<impl ratatui::backend::Backend>,
    ) -> io::Result<()> {
        while !self.should_quit {
            let report = self.engine.tick(Instant::now());
            if report.steps > 0 {
                log::trace!("ran {} steps", report.steps);
            }
            self.engine.poll(Instant::now());

            terminal
                .draw(|frame| self.draw(frame))
                .map_err(|e| io::Error::other(e.to_string()))?;

            if event::poll(Duration::from_millis(POLL_INTERVAL_MS))? {
                match event::read()? {
                    CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                        if let Some(action) = map_key(key, self.editing.is_some()) {
                            self.handle_action(action);
                        }
                    }
                    CrosstermEvent::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Flush settings and stop the engine.
    pub fn shutdown(&mut self) {
        self.engine.destroy();
    }
}

/// Take over the terminal, run the app and hand the terminal back.
pub fn run_app(app: &mut App) -> io::Result<()> {
    let mut terminal = ratatui::init();
    execute!(io::stdout(), EnableMouseCapture)?;
    app.engine.start();
    let result = app.run(&mut terminal);
    app.shutdown();
    let _ = execute!(io::stdout(), DisableMouseCapture);
    ratatui::restore();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use crate::interaction::NavKey;
    use crate::param::{ParamValue, RangeValue};
    use crate::persist::MemoryStorage;
    use crate::plugin::{builtin_catalog, CirclesPlugin};
    use crossterm::event::KeyModifiers;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn app() -> App {
        let mut engine = Engine::new(
            Box::new(CirclesPlugin::with_seed(11)),
            CellSurface::new(40, 10),
            Box::new(MemoryStorage::new()),
            EngineConfig::default(),
        )
        .unwrap();
        let (width, height) = engine.surface().logical_size();
        engine.init(width, height);
        App::new(engine, builtin_catalog(), vec![1.0, 2.0, 4.0])
    }

    #[test]
    fn speed_cycles_through_options() {
        let mut app = app();
        app.handle_action(Action::CycleSpeed);
        assert_eq!(app.engine.playback_multiplier(), 2.0);
        app.handle_action(Action::CycleSpeed);
        app.handle_action(Action::CycleSpeed);
        assert_eq!(app.engine.playback_multiplier(), 1.0);
    }

    #[test]
    fn plugin_cycling_wraps() {
        let mut app = app();
        app.handle_action(Action::PrevPlugin);
        assert_eq!(app.engine.plugin_id(), "snakes");
        app.handle_action(Action::NextPlugin);
        assert_eq!(app.engine.plugin_id(), "circles");
    }

    #[test]
    fn typed_value_commits_to_focus() {
        let mut app = app();
        app.handle_action(Action::BeginEdit);
        app.editing = Some(String::new());
        for c in "12".chars() {
            app.handle_action(Action::EditInsert(c));
        }
        app.handle_action(Action::EditCommit);
        assert!(app.editing.is_none());
        let radius = app.engine.value("radius").and_then(ParamValue::as_range);
        assert_eq!(radius.map(|r| r.current), Some(12.0));
    }

    #[test]
    fn bad_text_keeps_value() {
        let mut app = app();
        app.editing = Some("-".into());
        app.handle_action(Action::EditCommit);
        assert_eq!(app.status.message.as_deref(), Some("kept radius"));
    }

    #[test]
    fn step_moves_focused_handle() {
        let mut app = app();
        let before = app.engine.value("radius").and_then(ParamValue::as_range);
        app.handle_action(Action::Step(NavKey::Right));
        let after = app.engine.value("radius").and_then(ParamValue::as_range);
        assert_eq!(
            after.map(|r| r.current),
            before.map(|r: RangeValue| r.current + 1.0)
        );
    }

    #[test]
    fn share_overlay_toggles() {
        let mut app = app();
        app.handle_action(Action::ToggleShare);
        assert!(app.share_text.is_some());
        app.handle_action(Action::ToggleShare);
        assert!(app.share_text.is_none());
    }

    #[test]
    fn draw_fits_canvas_and_maps_mouse() {
        let mut app = app();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        let (cols, rows) = (app.engine.surface().cols(), app.engine.surface().rows());
        assert_eq!(cols, 100);
        let logical = (cols as f64 * CELL_WIDTH, rows as f64 * CELL_HEIGHT);
        assert_eq!(app.engine.size(), logical);

        assert!(app.panel.hit(0, 0).is_none());

        let (row, left, cells) = (0..30)
            .flat_map(|row| (0..100).map(move |column| (column, row)))
            .find_map(|(column, row)| {
                app.panel
                    .hit(column, row)
                    .filter(|hit| hit.key == "radius")
                    .map(|hit| (hit.y, hit.track_left, hit.track_cells))
            })
            .expect("radius row is drawn");
        app.handle_mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: left + cells - 1,
            row,
            modifiers: KeyModifiers::NONE,
        });
        assert!(app.engine.is_dragging());
        app.handle_mouse(MouseEvent {
            kind: MouseEventKind::Up(MouseButton::Left),
            column: left + cells - 1,
            row,
            modifiers: KeyModifiers::NONE,
        });
        assert!(!app.engine.is_dragging());
    }
}
