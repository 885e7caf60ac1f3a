//! Layout: splits the screen into canvas, parameter panel and status bar.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Rows the canvas keeps before the panel may grow.
const MIN_CANVAS_ROWS: u16 = 6;

/// Screen regions for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenLayout {
    pub canvas: Rect,
    pub panel: Rect,
    pub status: Rect,
}

impl ScreenLayout {
    /// Split `area`, giving the panel `panel_lines` rows plus borders when
    /// the canvas can spare them.
    pub fn compute(area: Rect, panel_lines: u16) -> Self {
        let available = area.height.saturating_sub(1 + MIN_CANVAS_ROWS);
        let panel_height = (panel_lines + 2).min(available).min(area.height / 2 + 1);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(panel_height),
                Constraint::Length(1),
            ])
            .split(area);
        Self {
            canvas: chunks[0],
            panel: chunks[1],
            status: chunks[2],
        }
    }
}
