//! Interaction controller: maps pointer positions and navigation keys onto
//! parameter handle edits.
//!
//! Everything here is pure. The engine owns the value store and the open
//! drag sessions ([`DragTracker`]) and routes the results through the
//! normalizer.

pub mod drag;

pub use drag::{DragSession, DragTracker, PointerId};

use crate::param::{
    clamp, normalize_bounds_pair, normalize_range_triplet, normalize_scalar, BoundsValue,
    DefinitionKind, Handle, ParamValue, ParameterDefinition, RangeValue,
};

/// Distance under which all three range handles count as collapsed.
const COLLAPSED_HANDLES_PX: f64 = 2.0;

/// Dead zone around `current` when picking among collapsed handles.
const COLLAPSED_PICK_SLOP_PX: f64 = 1.0;

/// Steps moved by a page key.
pub const PAGE_STEP_MULTIPLIER: f64 = 10.0;

/// Horizontal placement of a control's track, in host pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackGeometry {
    pub left: f64,
    pub width: f64,
}

impl TrackGeometry {
    pub fn new(left: f64, width: f64) -> Self {
        Self { left, width }
    }

    /// Usable width, never negative.
    pub fn span(&self) -> f64 {
        self.width.max(0.0)
    }

    /// Pointer `x` relative to the track, clamped onto it.
    pub fn local_x(&self, x: f64) -> f64 {
        clamp(x - self.left, 0.0, self.span())
    }
}

/// What a pointer press landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressTarget {
    Handle(Handle),
    Track,
}

/// Pointer button of a press. Only [`PointerButton::Primary`] starts a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Keyboard navigation on a focused handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Home,
    End,
}

/// Track-local x coordinate of `value`.
pub fn value_to_track_x(def: &ParameterDefinition, value: f64, width: f64) -> f64 {
    let span = width.max(0.0);
    if def.max <= def.min {
        return 0.0;
    }
    let ratio = clamp((value - def.min) / (def.max - def.min), 0.0, 1.0);
    ratio * span
}

/// Value under a track-local x coordinate. Linear inverse of [`value_to_track_x`].
pub fn track_x_to_value(def: &ParameterDefinition, x: f64, width: f64) -> f64 {
    let span = width.max(0.0);
    if span <= 0.0 || def.max <= def.min {
        return def.min;
    }
    let ratio = clamp(x, 0.0, span) / span;
    def.min + ratio * (def.max - def.min)
}

/// Choose the handle a press at absolute `x` on the track should grab.
///
/// Scalars always pick `current`. A range whose bounds are pinned picks
/// `current`. When the three range handles sit on top of each other the press
/// side decides between `min` and `max`, with `current` in the middle.
pub fn pick_handle(
    def: &ParameterDefinition,
    value: &ParamValue,
    x: f64,
    track: TrackGeometry,
) -> Handle {
    match (def.kind, value) {
        (DefinitionKind::Bounds { .. }, ParamValue::Bounds(bounds)) => {
            if track.span() <= 0.0 {
                return Handle::Min;
            }
            let x = track.local_x(x);
            let min_x = value_to_track_x(def, bounds.min, track.width);
            let max_x = value_to_track_x(def, bounds.max, track.width);
            if (x - min_x).abs() <= (x - max_x).abs() {
                Handle::Min
            } else {
                Handle::Max
            }
        }
        (DefinitionKind::Range { .. }, ParamValue::Range(range)) => {
            if !def.can_adjust_bounds() || track.span() <= 0.0 {
                return Handle::Current;
            }
            pick_range_handle(def, range, track.local_x(x), track.width)
        }
        _ => Handle::Current,
    }
}

fn pick_range_handle(def: &ParameterDefinition, range: &RangeValue, x: f64, width: f64) -> Handle {
    let min_x = value_to_track_x(def, range.min, width);
    let current_x = value_to_track_x(def, range.current, width);
    let max_x = value_to_track_x(def, range.max, width);

    if (min_x - current_x).abs() <= COLLAPSED_HANDLES_PX
        && (max_x - current_x).abs() <= COLLAPSED_HANDLES_PX
    {
        if x < current_x - COLLAPSED_PICK_SLOP_PX {
            return Handle::Min;
        }
        if x > current_x + COLLAPSED_PICK_SLOP_PX {
            return Handle::Max;
        }
        return Handle::Current;
    }

    let mut best = Handle::Current;
    let mut best_distance = f64::INFINITY;
    for (handle, position) in [
        (Handle::Current, current_x),
        (Handle::Min, min_x),
        (Handle::Max, max_x),
    ] {
        let distance = (x - position).abs();
        if distance < best_distance {
            best_distance = distance;
            best = handle;
        }
    }
    best
}

/// Write `raw` into `handle` of `value` and normalize the result.
///
/// Moving `min` past `max` pulls `max` along (and vice versa); `current` is
/// kept inside the new interval. Returns `None` when the handle is not
/// editable on this definition or the value's shape does not match.
pub fn apply_handle_edit(
    def: &ParameterDefinition,
    value: &ParamValue,
    handle: Handle,
    raw: f64,
) -> Option<ParamValue> {
    if !def.accepts_handle(handle) || !raw.is_finite() {
        return None;
    }

    match (def.kind, value) {
        (DefinitionKind::Scalar { .. }, ParamValue::Scalar(_)) => {
            Some(ParamValue::Scalar(normalize_scalar(def, raw)))
        }
        (DefinitionKind::Range { .. }, ParamValue::Range(range)) => {
            let mut next = *range;
            match handle {
                Handle::Min => {
                    next.min = raw;
                    next.max = next.max.max(next.min);
                    next.current = next.current.max(next.min);
                }
                Handle::Max => {
                    next.max = raw;
                    next.min = next.min.min(next.max);
                    next.current = next.current.min(next.max);
                }
                Handle::Current => next.current = raw,
            }
            Some(ParamValue::Range(normalize_range_triplet(def, next)))
        }
        (DefinitionKind::Bounds { .. }, ParamValue::Bounds(bounds)) => {
            let mut next = *bounds;
            match handle {
                Handle::Min => {
                    next.min = raw;
                    next.max = next.max.max(next.min);
                }
                Handle::Max => {
                    next.max = raw;
                    next.min = next.min.min(next.max);
                }
                Handle::Current => return None,
            }
            Some(ParamValue::Bounds(normalize_bounds_pair(
                def,
                BoundsValue {
                    min: next.min,
                    max: next.max,
                },
            )))
        }
        _ => None,
    }
}

/// Raw target of a navigation key applied to a handle sitting at `from`.
pub fn keyboard_target(def: &ParameterDefinition, from: f64, key: NavKey) -> f64 {
    match key {
        NavKey::Home => def.min,
        NavKey::End => def.max,
        NavKey::Up | NavKey::Right => from + def.step,
        NavKey::Down | NavKey::Left => from - def.step,
        NavKey::PageUp => from + def.step * PAGE_STEP_MULTIPLIER,
        NavKey::PageDown => from - def.step * PAGE_STEP_MULTIPLIER,
    }
}
