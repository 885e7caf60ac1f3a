//! Value normalizer: clamps and snaps raw numbers into valid parameter values.
//!
//! These functions are the single gate every mutation path goes through
//! (definition refresh, drags, keyboard steps, persisted restores, share
//! payloads), so the invariants on [`ParamValue`](super::ParamValue) hold even
//! for stale or adversarial input.

use super::{BoundsValue, DefinitionKind, ParameterDefinition, RangeValue};

/// Replace non-finite numbers (`NaN`, infinities) with `fallback`.
pub fn to_finite(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Clamp `value` into `[min, max]`.
///
/// Unlike [`f64::clamp`] this never panics: when `min > max` the result is `max`.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Round `value` onto the grid `origin + k * step`.
///
/// A step that is not a positive number disables snapping.
pub fn snap(value: f64, origin: f64, step: f64) -> f64 {
    if !(step > 0.0) {
        return value;
    }
    let steps = ((value - origin) / step).round();
    origin + steps * step
}

/// Snap onto the definition's grid (anchored at `def.min`) and keep the
/// result inside the definition's absolute bounds.
fn snap_to_definition(def: &ParameterDefinition, value: f64) -> f64 {
    clamp(snap(value, def.min, def.step), def.min, def.max)
}

/// Clamp then snap a scalar value.
pub fn normalize_scalar(def: &ParameterDefinition, raw: f64) -> f64 {
    let fallback = match def.kind {
        DefinitionKind::Scalar { default_value } => default_value,
        _ => def.min,
    };
    let value = clamp(to_finite(raw, fallback), def.min, def.max);
    snap_to_definition(def, value)
}

/// Normalize a `{min, current, max}` triplet against a definition.
///
/// When the definition forbids modulation, `min`/`max` are pinned to the
/// definition's bounds and only `current` moves.
pub fn normalize_range_triplet(def: &ParameterDefinition, raw: RangeValue) -> RangeValue {
    let (default_min, default_current, default_max, allow_function) = range_defaults(def);

    let (min, max) = if allow_function {
        let min = fit(def, raw.min, default_min);
        let max = fit(def, raw.max, default_max);
        (min, max.max(min))
    } else {
        (def.min, def.max)
    };

    let current = clamp(to_finite(raw.current, default_current), min, max);
    let current = clamp(snap_to_definition(def, current), min, max);

    RangeValue { min, current, max }
}

/// Normalize a `{min, max}` pair against a definition.
pub fn normalize_bounds_pair(def: &ParameterDefinition, raw: BoundsValue) -> BoundsValue {
    let (default_min, default_max) = match def.kind {
        DefinitionKind::Bounds {
            default_min,
            default_max,
        } => (default_min, default_max),
        DefinitionKind::Range {
            default_min,
            default_max,
            ..
        } => (default_min, default_max),
        DefinitionKind::Scalar { .. } => (def.min, def.max),
    };

    let min = fit(def, raw.min, default_min);
    let max = fit(def, raw.max, default_max);

    BoundsValue {
        min,
        max: max.max(min),
    }
}

/// Finite, clamped to the definition's bounds, then snapped.
fn fit(def: &ParameterDefinition, raw: f64, fallback: f64) -> f64 {
    snap_to_definition(def, clamp(to_finite(raw, fallback), def.min, def.max))
}

fn range_defaults(def: &ParameterDefinition) -> (f64, f64, f64, bool) {
    match def.kind {
        DefinitionKind::Range {
            default_min,
            default_current,
            default_max,
            allow_function,
        } => (default_min, default_current, default_max, allow_function),
        DefinitionKind::Bounds {
            default_min,
            default_max,
        } => {
            let mid = (default_min + default_max) / 2.0;
            (default_min, mid, default_max, true)
        }
        DefinitionKind::Scalar { default_value } => (def.min, default_value, def.max, true),
    }
}
