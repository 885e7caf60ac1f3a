//! Canvas panel: a [`Surface`] that rasterizes strokes into terminal cells.
//!
//! Each cell covers `CELL_WIDTH x CELL_HEIGHT` logical pixels and stores an
//! ink density in `[0, 1]`. Strokes composite their color's darkness over
//! the cell at the stroke's alpha; fills do the same, so a white fill erases.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::widgets::Widget;

use crate::plugin::{Hsla, Point, Stroke, Surface};

/// Logical pixels per terminal column.
pub const CELL_WIDTH: f64 = 8.0;
/// Logical pixels per terminal row.
pub const CELL_HEIGHT: f64 = 16.0;

const RAMP: [char; 10] = [' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    density: f64,
    tint: Option<(u8, u8, u8)>,
}

impl Cell {
    const BLANK: Cell = Cell {
        density: 0.0,
        tint: None,
    };

    fn composite(&mut self, color: Hsla) {
        let alpha = color.alpha.clamp(0.0, 1.0);
        self.density = self.density * (1.0 - alpha) + color.darkness() * alpha;
        if self.density < 1e-3 {
            *self = Cell::BLANK;
        } else if color.saturation > 0.0 && alpha > 0.0 {
            self.tint = Some(color.to_rgb());
        }
    }
}

/// Density grid sized in terminal cells.
#[derive(Debug, Clone)]
pub struct CellSurface {
    cols: usize,
    rows: usize,
    cells: Vec<Cell>,
}

impl CellSurface {
    pub fn new(cols: u16, rows: u16) -> Self {
        let cols = cols as usize;
        let rows = rows as usize;
        Self {
            cols,
            rows,
            cells: vec![Cell::BLANK; cols * rows],
        }
    }

    /// Reallocate for a new panel size. Contents are dropped.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        *self = Self::new(cols, rows);
    }

    pub fn cols(&self) -> u16 {
        self.cols as u16
    }

    pub fn rows(&self) -> u16 {
        self.rows as u16
    }

    /// Canvas size in logical pixels.
    pub fn logical_size(&self) -> (f64, f64) {
        (self.cols as f64 * CELL_WIDTH, self.rows as f64 * CELL_HEIGHT)
    }

    /// Ink density of a cell, 0 when out of range.
    pub fn density(&self, col: usize, row: usize) -> f64 {
        if col >= self.cols || row >= self.rows {
            return 0.0;
        }
        self.cells[row * self.cols + col].density
    }

    /// Number of cells carrying any ink.
    pub fn inked_cells(&self) -> usize {
        self.cells.iter().filter(|cell| cell.density > 0.0).count()
    }

    /// Ramp glyph for a density.
    pub fn glyph(density: f64) -> char {
        let index = (density.clamp(0.0, 1.0) * (RAMP.len() - 1) as f64).round() as usize;
        RAMP[index.min(RAMP.len() - 1)]
    }

    fn cell_center(col: usize, row: usize) -> Point {
        Point::new(
            (col as f64 + 0.5) * CELL_WIDTH,
            (row as f64 + 0.5) * CELL_HEIGHT,
        )
    }

    /// Cells whose box intersects `[min, max]` in logical pixels.
    fn cells_in(&self, min: Point, max: Point) -> impl Iterator<Item = (usize, usize)> {
        let clamp_col = |x: f64| (x / CELL_WIDTH).floor().clamp(0.0, self.cols as f64) as usize;
        let clamp_row = |y: f64| (y / CELL_HEIGHT).floor().clamp(0.0, self.rows as f64) as usize;
        let (c0, c1) = (clamp_col(min.x), (clamp_col(max.x) + 1).min(self.cols));
        let (r0, r1) = (clamp_row(min.y), (clamp_row(max.y) + 1).min(self.rows));
        (r0..r1).flat_map(move |row| (c0..c1).map(move |col| (col, row)))
    }

    /// Composite `color` over every cell whose nearest ink point is within
    /// half a cell (plus half the stroke width) of the cell center.
    fn stamp(
        &mut self,
        min: Point,
        max: Point,
        width: f64,
        color: Hsla,
        nearest: impl Fn(Point) -> Point,
    ) {
        if !(min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite()) {
            return;
        }
        let half = width.max(0.0) * 0.5;
        let reach_x = CELL_WIDTH * 0.5 + half;
        let reach_y = CELL_HEIGHT * 0.5 + half;
        let hits: Vec<(usize, usize)> = self
            .cells_in(
                Point::new(min.x - reach_x, min.y - reach_y),
                Point::new(max.x + reach_x, max.y + reach_y),
            )
            .filter(|&(col, row)| {
                let center = Self::cell_center(col, row);
                let p = nearest(center);
                (p.x - center.x).abs() <= reach_x && (p.y - center.y).abs() <= reach_y
            })
            .collect();
        for (col, row) in hits {
            self.cells[row * self.cols + col].composite(color);
        }
    }
}

fn nearest_on_segment(from: Point, to: Point, p: Point) -> Point {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let length_sq = dx * dx + dy * dy;
    if length_sq <= f64::EPSILON {
        return from;
    }
    let t = (((p.x - from.x) * dx + (p.y - from.y) * dy) / length_sq).clamp(0.0, 1.0);
    Point::new(from.x + dx * t, from.y + dy * t)
}

/// Even-odd test.
fn contains(points: &[Point], p: Point) -> bool {
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (a, b) = (points[i], points[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

impl Surface for CellSurface {
    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn stroke_line(&mut self, from: Point, to: Point, stroke: &Stroke) {
        let min = Point::new(from.x.min(to.x), from.y.min(to.y));
        let max = Point::new(from.x.max(to.x), from.y.max(to.y));
        self.stamp(min, max, stroke.width, stroke.color, |p| {
            nearest_on_segment(from, to, p)
        });
    }

    fn stroke_circle(&mut self, center: Point, radius: f64, stroke: &Stroke) {
        let radius = radius.max(0.0);
        let min = Point::new(center.x - radius, center.y - radius);
        let max = Point::new(center.x + radius, center.y + radius);
        self.stamp(min, max, stroke.width, stroke.color, |p| {
            let (dx, dy) = (p.x - center.x, p.y - center.y);
            let distance = dx.hypot(dy);
            if distance <= f64::EPSILON {
                Point::new(center.x + radius, center.y)
            } else {
                let scale = radius / distance;
                Point::new(center.x + dx * scale, center.y + dy * scale)
            }
        });
    }

    fn fill_polygon(&mut self, points: &[Point], color: Hsla) {
        if points.len() < 3 || points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return;
        }
        let min = points
            .iter()
            .fold(Point::new(f64::INFINITY, f64::INFINITY), |acc, p| {
                Point::new(acc.x.min(p.x), acc.y.min(p.y))
            });
        let max = points
            .iter()
            .fold(Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY), |acc, p| {
                Point::new(acc.x.max(p.x), acc.y.max(p.y))
            });
        let hits: Vec<(usize, usize)> = self
            .cells_in(min, max)
            .filter(|&(col, row)| contains(points, Self::cell_center(col, row)))
            .collect();
        for (col, row) in hits {
            self.cells[row * self.cols + col].composite(color);
        }
    }
}

impl Widget for &CellSurface {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let cols = (area.width as usize).min(self.cols);
        let rows = (area.height as usize).min(self.rows);
        for row in 0..rows {
            for col in 0..cols {
                let cell = self.cells[row * self.cols + col];
                let glyph = CellSurface::glyph(cell.density);
                let fg = match cell.tint {
                    Some((r, g, b)) => Color::Rgb(r, g, b),
                    None => Color::Reset,
                };
                let position = (area.x + col as u16, area.y + row as u16);
                if let Some(target) = buf.cell_mut(position) {
                    target.set_char(glyph).set_fg(fg);
                }
            }
        }
    }
}
