//! Drawing surface contract.
//!
//! Plugins draw through [`Surface`] in logical canvas pixels with the origin
//! at the top-left. The canvas background is white; colors are HSLA.

use std::fmt;

/// A point in logical canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Hue in degrees, saturation and lightness in percent, alpha in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsla {
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
    pub alpha: f64,
}

impl Hsla {
    pub const WHITE: Hsla = Hsla {
        hue: 0.0,
        saturation: 0.0,
        lightness: 100.0,
        alpha: 1.0,
    };

    pub fn new(hue: f64, saturation: f64, lightness: f64, alpha: f64) -> Self {
        Self {
            hue,
            saturation,
            lightness,
            alpha,
        }
    }

    /// How much the color darkens the white background, in `[0, 1]`.
    pub fn darkness(&self) -> f64 {
        (1.0 - self.lightness / 100.0).clamp(0.0, 1.0)
    }

    /// Convert to 8-bit RGB.
    pub fn to_rgb(&self) -> (u8, u8, u8) {
        let h = self.hue.rem_euclid(360.0) / 360.0;
        let s = (self.saturation / 100.0).clamp(0.0, 1.0);
        let l = (self.lightness / 100.0).clamp(0.0, 1.0);

        if s <= 0.0 {
            let v = (l * 255.0).round() as u8;
            return (v, v, v);
        }

        let q = if l < 0.5 {
            l * (1.0 + s)
        } else {
            l + s - l * s
        };
        let p = 2.0 * l - q;
        let channel = |t: f64| {
            let t = t.rem_euclid(1.0);
            let v = if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 0.5 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            };
            (v * 255.0).round().clamp(0.0, 255.0) as u8
        };
        (channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
    }
}

impl fmt::Display for Hsla {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsla({}, {}%, {}%, {:.3})",
            self.hue.round(),
            self.saturation.round(),
            self.lightness.round(),
            self.alpha
        )
    }
}

/// Stroke width and color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: f64,
    pub color: Hsla,
}

/// Target of plugin drawing.
pub trait Surface {
    /// Reset to the blank background.
    fn clear(&mut self);

    fn stroke_line(&mut self, from: Point, to: Point, stroke: &Stroke);

    fn stroke_circle(&mut self, center: Point, radius: f64, stroke: &Stroke);

    /// Fill a closed polygon.
    fn fill_polygon(&mut self, points: &[Point], color: Hsla);
}

/// A recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    Line {
        from: Point,
        to: Point,
        stroke: Stroke,
    },
    Circle {
        center: Point,
        radius: f64,
        stroke: Stroke,
    },
    Polygon { points: Vec<Point>, color: Hsla },
}

/// Surface that records every call, for tests and headless runs.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of clears recorded.
    pub fn clears(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| matches!(command, DrawCommand::Clear))
            .count()
    }

    /// Number of recorded drawing calls, clears excluded.
    pub fn draw_calls(&self) -> usize {
        self.commands.len() - self.clears()
    }
}

impl Surface for RecordingSurface {
    fn clear(&mut self) {
        self.commands.push(DrawCommand::Clear);
    }

    fn stroke_line(&mut self, from: Point, to: Point, stroke: &Stroke) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            stroke: *stroke,
        });
    }

    fn stroke_circle(&mut self, center: Point, radius: f64, stroke: &Stroke) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            stroke: *stroke,
        });
    }

    fn fill_polygon(&mut self, points: &[Point], color: Hsla) {
        self.commands.push(DrawCommand::Polygon {
            points: points.to_vec(),
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsla_display_matches_css() {
        let color = Hsla::new(200.4, 50.0, 40.6, 0.5);
        assert_eq!(color.to_string(), "hsla(200, 50%, 41%, 0.500)");
    }

    #[test]
    fn grey_converts_without_hue() {
        assert_eq!(Hsla::new(123.0, 0.0, 0.0, 1.0).to_rgb(), (0, 0, 0));
        assert_eq!(Hsla::WHITE.to_rgb(), (255, 255, 255));
    }

    #[test]
    fn primary_hues_convert() {
        assert_eq!(Hsla::new(0.0, 100.0, 50.0, 1.0).to_rgb(), (255, 0, 0));
        assert_eq!(Hsla::new(120.0, 100.0, 50.0, 1.0).to_rgb(), (0, 255, 0));
        assert_eq!(Hsla::new(240.0, 100.0, 50.0, 1.0).to_rgb(), (0, 0, 255));
    }

    #[test]
    fn darkness_tracks_lightness() {
        assert_eq!(Hsla::WHITE.darkness(), 0.0);
        assert_eq!(Hsla::new(0.0, 0.0, 0.0, 1.0).darkness(), 1.0);
    }

    #[test]
    fn recording_surface_counts_calls() {
        let mut surface = RecordingSurface::new();
        let stroke = Stroke {
            width: 1.0,
            color: Hsla::new(0.0, 0.0, 0.0, 1.0),
        };
        surface.clear();
        surface.stroke_line(Point::new(0.0, 0.0), Point::new(1.0, 1.0), &stroke);
        surface.stroke_circle(Point::new(2.0, 2.0), 3.0, &stroke);
        assert_eq!(surface.clears(), 1);
        assert_eq!(surface.draw_calls(), 2);
    }
}
