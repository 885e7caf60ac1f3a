//! Shared ink parameters.
//!
//! The engine appends this block to every plugin's parameter list, so stroke
//! thickness, opacity and color carry over when switching plugins.

use std::collections::HashSet;

use super::surface::{Hsla, Stroke};
use crate::param::{ParamSnapshot, ParamSpec};

pub const INK_GROUP: &str = "ink";

pub const INK_KEYS: [&str; 5] = ["lineThickness", "opacity", "hue", "saturation", "lightness"];

/// Keys whose HUD readout shows a color swatch.
pub const SWATCH_KEYS: [&str; 3] = ["hue", "saturation", "lightness"];

/// The ink parameter declarations, in display order.
pub fn ink_parameter_specs() -> Vec<ParamSpec> {
    vec![
        ParamSpec::range("lineThickness", 0.5, 10.0)
            .label("Line Thickness")
            .step(0.1)
            .default_value(1.0)
            .group(INK_GROUP),
        ParamSpec::range("opacity", 0.01, 1.0)
            .label("Opacity")
            .step(0.01)
            .default_value(0.5)
            .group(INK_GROUP),
        ParamSpec::range("hue", 0.0, 360.0)
            .label("Hue")
            .step(1.0)
            .default_value(0.0)
            .group(INK_GROUP),
        ParamSpec::range("saturation", 0.0, 100.0)
            .label("Saturation")
            .step(1.0)
            .default_value(0.0)
            .group(INK_GROUP),
        ParamSpec::range("lightness", 0.0, 100.0)
            .label("Lightness")
            .step(1.0)
            .default_value(0.0)
            .group(INK_GROUP),
    ]
}

/// Ink keys as an owned set, the preserved-key list on plugin switch.
pub fn ink_keys() -> HashSet<String> {
    INK_KEYS.iter().map(|key| key.to_string()).collect()
}

pub fn is_swatch_key(key: &str) -> bool {
    SWATCH_KEYS.contains(&key)
}

/// Resolved stroke settings for a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InkStyle {
    pub line_thickness: f64,
    pub color: Hsla,
}

impl InkStyle {
    pub fn from_snapshot(params: &ParamSnapshot) -> Self {
        let line_thickness = match params.number("lineThickness") {
            Some(value) if value.is_finite() && value != 0.0 => value.max(0.01),
            _ => 1.0,
        };
        Self {
            line_thickness,
            color: Hsla {
                hue: params.number_or("hue", 0.0).rem_euclid(360.0),
                saturation: params.number_or("saturation", 0.0).clamp(0.0, 100.0),
                lightness: params.number_or("lightness", 0.0).clamp(0.0, 100.0),
                alpha: params.number_or("opacity", 0.0).clamp(0.0, 1.0),
            },
        }
    }

    pub fn stroke(&self) -> Stroke {
        Stroke {
            width: self.line_thickness,
            color: self.color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::SnapshotValue;

    fn snapshot(values: &[(&str, f64)]) -> ParamSnapshot {
        let mut snapshot = ParamSnapshot::default();
        for (key, value) in values {
            snapshot.insert(*key, SnapshotValue::Number(*value));
        }
        snapshot
    }

    #[test]
    fn specs_cover_all_ink_keys() {
        let specs = ink_parameter_specs();
        let keys: Vec<&str> = specs.iter().map(|spec| spec.key.as_str()).collect();
        assert_eq!(keys, INK_KEYS);
        assert!(specs.iter().all(|s| s.group.as_deref() == Some(INK_GROUP)));
    }

    #[test]
    fn style_resolves_and_clamps() {
        let style = InkStyle::from_snapshot(&snapshot(&[
            ("lineThickness", 2.5),
            ("opacity", 1.5),
            ("hue", -30.0),
            ("saturation", 120.0),
            ("lightness", 40.0),
        ]));
        assert_eq!(style.line_thickness, 2.5);
        assert_eq!(style.color.alpha, 1.0);
        assert_eq!(style.color.hue, 330.0);
        assert_eq!(style.color.saturation, 100.0);
        assert_eq!(style.color.lightness, 40.0);
    }

    #[test]
    fn missing_values_fall_back() {
        let style = InkStyle::from_snapshot(&ParamSnapshot::default());
        assert_eq!(style.line_thickness, 1.0);
        assert_eq!(style.color.alpha, 0.0);
        assert_eq!(style.stroke().width, 1.0);
    }

    #[test]
    fn swatch_keys() {
        assert!(is_swatch_key("hue"));
        assert!(!is_swatch_key("opacity"));
        assert!(ink_keys().contains("lineThickness"));
    }
}
