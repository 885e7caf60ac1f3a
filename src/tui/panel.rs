//! Parameter panel: one row per definition with a track, values and
//! modulation level, plus the mouse hit map of the last draw.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::engine::Engine;
use crate::interaction::{value_to_track_x, TrackGeometry};
use crate::noise::modulation::MODULATION_LEVELS;
use crate::param::{format_value, Handle, ParamValue, ParameterDefinition};
use crate::plugin::ink::is_swatch_key;
use crate::plugin::{InkStyle, Surface};

const LABEL_WIDTH: usize = 18;
const VALUE_WIDTH: usize = 24;
const MOD_WIDTH: usize = MODULATION_LEVELS + 2;
const MIN_TRACK_WIDTH: usize = 8;

/// Track cells for one value: `[` min, `]` max, `o` current over a rail.
pub fn track_glyphs(def: &ParameterDefinition, value: &ParamValue, width: usize) -> Vec<char> {
    let mut glyphs = vec!['-'; width];
    if width == 0 {
        return glyphs;
    }
    let span = (width - 1) as f64;
    let column = |v: f64| (value_to_track_x(def, v, span).round() as usize).min(width - 1);
    match value {
        ParamValue::Scalar(v) => glyphs[column(*v)] = 'o',
        ParamValue::Range(range) => {
            for cell in &mut glyphs[column(range.min)..=column(range.max)] {
                *cell = '=';
            }
            glyphs[column(range.min)] = '[';
            glyphs[column(range.max)] = ']';
            glyphs[column(range.current)] = 'o';
        }
        ParamValue::Bounds(bounds) => {
            for cell in &mut glyphs[column(bounds.min)..=column(bounds.max)] {
                *cell = '=';
            }
            glyphs[column(bounds.min)] = '[';
            glyphs[column(bounds.max)] = ']';
        }
    }
    glyphs
}

/// Column of `handle` within a track of `width` cells.
pub fn handle_column(
    def: &ParameterDefinition,
    value: &ParamValue,
    handle: Handle,
    width: usize,
) -> Option<usize> {
    if width == 0 {
        return None;
    }
    let v = value.handle_value(handle)?;
    let x = value_to_track_x(def, v, (width - 1) as f64).round() as usize;
    Some(x.min(width - 1))
}

/// Level meter, `|` per active level.
pub fn modulation_bars(level: usize) -> String {
    let level = level.min(MODULATION_LEVELS);
    let filled = "|".repeat(level);
    let empty = ".".repeat(MODULATION_LEVELS - level);
    format!("{filled}{empty}")
}

/// Human readable value, by the definition's step.
pub fn value_text(def: &ParameterDefinition, value: &ParamValue) -> String {
    match value {
        ParamValue::Scalar(v) => format_value(*v, def.step),
        ParamValue::Range(range) => format!(
            "{} [{}, {}]",
            format_value(range.current, def.step),
            format_value(range.min, def.step),
            format_value(range.max, def.step)
        ),
        ParamValue::Bounds(bounds) => format!(
            "[{}, {}]",
            format_value(bounds.min, def.step),
            format_value(bounds.max, def.step)
        ),
    }
}

fn pad(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat(' ').take(width - len));
    out
}

/// Where a parameter row landed on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct RowHit {
    pub key: String,
    pub y: u16,
    pub track: TrackGeometry,
    pub track_left: u16,
    pub track_cells: u16,
}

/// Focus and layout state of the panel.
#[derive(Debug, Clone)]
pub struct ParamPanel {
    pub focus: usize,
    pub handle: Handle,
    scroll: usize,
    hits: Vec<RowHit>,
}

impl Default for ParamPanel {
    fn default() -> Self {
        Self {
            focus: 0,
            handle: Handle::Current,
            scroll: 0,
            hits: Vec::new(),
        }
    }
}

impl ParamPanel {
    /// Key of the focused definition.
    pub fn focused_key<'a>(&self, definitions: &'a [ParameterDefinition]) -> Option<&'a str> {
        definitions.get(self.focus).map(|def| def.key.as_str())
    }

    /// Keep focus and handle valid after the definition list changed.
    pub fn sync(&mut self, definitions: &[ParameterDefinition]) {
        if definitions.is_empty() {
            self.focus = 0;
            return;
        }
        self.focus = self.focus.min(definitions.len() - 1);
        let def = &definitions[self.focus];
        if !def.accepts_handle(self.handle) {
            self.handle = Self::first_handle(def);
        }
    }

    pub fn move_focus(&mut self, definitions: &[ParameterDefinition], delta: isize) {
        if definitions.is_empty() {
            return;
        }
        let len = definitions.len() as isize;
        self.focus = (self.focus as isize + delta).rem_euclid(len) as usize;
        self.handle = Self::first_handle(&definitions[self.focus]);
    }

    /// Next handle the focused definition accepts.
    pub fn cycle_handle(&mut self, definitions: &[ParameterDefinition]) {
        let Some(def) = definitions.get(self.focus) else {
            return;
        };
        let mut handle = self.handle;
        for _ in 0..Handle::all().len() {
            handle = handle.next();
            if def.accepts_handle(handle) {
                self.handle = handle;
                return;
            }
        }
    }

    fn first_handle(def: &ParameterDefinition) -> Handle {
        if def.accepts_handle(Handle::Current) {
            Handle::Current
        } else {
            Handle::Min
        }
    }

    /// Row under a terminal position, from the last draw.
    pub fn hit(&self, column: u16, row: u16) -> Option<&RowHit> {
        self.hits.iter().find(|hit| {
            hit.y == row && column >= hit.track_left && column < hit.track_left + hit.track_cells
        })
    }

    /// Focus the row of `key`, if drawn.
    pub fn focus_key(&mut self, definitions: &[ParameterDefinition], key: &str) {
        if let Some(index) = definitions.iter().position(|def| def.key == key) {
            self.focus = index;
            self.sync(definitions);
        }
    }

    pub fn draw<S: Surface>(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        engine: &Engine<S>,
        editing: Option<&str>,
    ) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", engine.plugin_name()));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        self.hits.clear();

        let definitions = engine.definitions();
        self.sync(definitions);
        let track_cells = (inner.width as usize)
            .saturating_sub(LABEL_WIDTH + VALUE_WIDTH + MOD_WIDTH + 3)
            .max(MIN_TRACK_WIDTH);
        let mut swatch = InkStyle::from_snapshot(&engine.snapshot()).color;
        swatch.alpha = 1.0;
        let (sr, sg, sb) = swatch.to_rgb();

        // (definition index, line); group headers carry no index
        let mut lines: Vec<(Option<usize>, Line)> = Vec::new();
        let mut group: Option<&str> = None;
        for (index, def) in definitions.iter().enumerate() {
            if group != Some(def.group.as_str()) {
                group = Some(def.group.as_str());
                lines.push((
                    None,
                    Line::from(Span::styled(
                        format!("- {} -", def.group),
                        Style::default().fg(Color::DarkGray),
                    )),
                ));
            }
            let Some(value) = engine.value(&def.key) else {
                continue;
            };
            let focused = index == self.focus;
            let mut glyph_style = Style::default();
            if focused {
                glyph_style = glyph_style.fg(Color::Yellow);
            }

            let label = pad(&def.label, LABEL_WIDTH);
            let mut spans = vec![Span::styled(
                format!("{label} "),
                if focused {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                },
            )];

            let glyphs = track_glyphs(def, value, track_cells);
            let highlighted = if focused {
                handle_column(def, value, self.handle, track_cells)
            } else {
                None
            };
            for (column, glyph) in glyphs.iter().enumerate() {
                let style = if Some(column) == highlighted {
                    glyph_style.add_modifier(Modifier::REVERSED)
                } else {
                    glyph_style
                };
                spans.push(Span::styled(glyph.to_string(), style));
            }

            let text = match editing {
                Some(buffer) if focused => format!(" > {buffer}_"),
                _ => format!(" {}", value_text(def, value)),
            };
            spans.push(Span::raw(pad(&text, VALUE_WIDTH + 1)));

            if def.allows_modulation() {
                let level = engine.modulation(&def.key).map_or(0, |m| m.speed_level);
                let color = if level > 0 {
                    Color::Green
                } else {
                    Color::DarkGray
                };
                spans.push(Span::styled(
                    format!(" {}", modulation_bars(level)),
                    Style::default().fg(color),
                ));
            }
            if is_swatch_key(&def.key) {
                let swatch_style = Style::default().fg(Color::Rgb(sr, sg, sb));
                spans.push(Span::styled(" ##", swatch_style));
            }
            lines.push((Some(index), Line::from(spans)));
        }

        let height = inner.height as usize;
        let focus = Some(self.focus);
        if let Some(focus_line) = lines.iter().position(|(index, _)| *index == focus) {
            if focus_line < self.scroll {
                self.scroll = focus_line.saturating_sub(1);
            } else if height > 0 && focus_line >= self.scroll + height {
                self.scroll = focus_line + 1 - height;
            }
        }
        self.scroll = self.scroll.min(lines.len().saturating_sub(1));

        let track_left = inner.x + LABEL_WIDTH as u16 + 1;
        let mut visible = Vec::with_capacity(height);
        let rows = lines.into_iter().skip(self.scroll).take(height);
        for (offset, (index, line)) in rows.enumerate() {
            if let Some(index) = index {
                let cells = track_cells as u16;
                self.hits.push(RowHit {
                    key: definitions[index].key.clone(),
                    y: inner.y + offset as u16,
                    track: TrackGeometry::new(track_left as f64, cells.saturating_sub(1) as f64),
                    track_left,
                    track_cells: cells,
                });
            }
            visible.push(line);
        }
        frame.render_widget(Paragraph::new(visible), inner);
    }
}
