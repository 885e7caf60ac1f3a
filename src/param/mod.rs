//! Parameter model: resolved definitions, live values and the registry that
//! reconciles them.
//!
//! Plugins declare [`ParamSpec`]s; the [`ParameterRegistry`] resolves them
//! against the canvas [`LimitContext`] into [`ParameterDefinition`]s and keeps
//! one [`ParamValue`] per key, shaped to match its definition.

pub mod format;
pub mod normalize;
pub mod registry;
pub mod spec;

pub use format::format_value;
pub use normalize::{
    clamp, normalize_bounds_pair, normalize_range_triplet, normalize_scalar, snap, to_finite,
};
pub use registry::{
    resolve_definition, ParamSnapshot, ParameterRegistry, ResolveOptions, SnapshotValue,
};
pub use spec::{Bound, ParamDefault, ParamKind, ParamSpec};

/// Step used when a spec declares none (or a non-positive one).
pub const DEFAULT_STEP: f64 = 1.0;

/// Group assigned to definitions without one.
pub const DEFAULT_GROUP: &str = "algo";

/// Canvas-derived context that dynamic bounds are evaluated against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitContext {
    pub min_dim: f64,
    pub max_dim: f64,
}

impl LimitContext {
    pub fn from_size(width: f64, height: f64) -> Self {
        Self {
            min_dim: width.min(height),
            max_dim: width.max(height),
        }
    }
}

/// Variant-specific part of a resolved definition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefinitionKind {
    Scalar { default_value: f64 },
    Range {
        default_min: f64,
        default_current: f64,
        default_max: f64,
        allow_function: bool,
    },
    Bounds {
        default_min: f64,
        default_max: f64,
    },
}

/// A concrete definition with its bounds evaluated for the current canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDefinition {
    pub key: String,
    pub label: String,
    pub group: String,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub kind: DefinitionKind,
}

impl ParameterDefinition {
    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, DefinitionKind::Scalar { .. })
    }

    pub fn is_range(&self) -> bool {
        matches!(self.kind, DefinitionKind::Range { .. })
    }

    pub fn is_bounds(&self) -> bool {
        matches!(self.kind, DefinitionKind::Bounds { .. })
    }

    /// Whether noise modulation may drive this parameter's `current`.
    pub fn allows_modulation(&self) -> bool {
        matches!(
            self.kind,
            DefinitionKind::Range {
                allow_function: true,
                ..
            }
        )
    }

    /// Whether the `min`/`max` handles are editable.
    pub fn can_adjust_bounds(&self) -> bool {
        self.is_bounds() || self.allows_modulation()
    }

    /// Whether `handle` exists and is editable on this definition.
    pub fn accepts_handle(&self, handle: Handle) -> bool {
        match (self.kind, handle) {
            (DefinitionKind::Scalar { .. }, Handle::Current) => true,
            (DefinitionKind::Scalar { .. }, _) => false,
            (DefinitionKind::Bounds { .. }, Handle::Current) => false,
            (DefinitionKind::Range { .. }, Handle::Current) => true,
            (_, Handle::Min | Handle::Max) => self.can_adjust_bounds(),
        }
    }

    /// The normalized default value for this definition.
    pub fn default_value(&self) -> ParamValue {
        match self.kind {
            DefinitionKind::Scalar { default_value } => {
                ParamValue::Scalar(normalize_scalar(self, default_value))
            }
            DefinitionKind::Range {
                default_min,
                default_current,
                default_max,
                ..
            } => ParamValue::Range(normalize_range_triplet(
                self,
                RangeValue {
                    min: default_min,
                    current: default_current,
                    max: default_max,
                },
            )),
            DefinitionKind::Bounds {
                default_min,
                default_max,
            } => ParamValue::Bounds(normalize_bounds_pair(
                self,
                BoundsValue {
                    min: default_min,
                    max: default_max,
                },
            )),
        }
    }

    /// Re-normalize an existing value against this definition.
    ///
    /// Returns `None` when the value's shape does not fit the variant. A range
    /// triplet is accepted where a bounds pair is expected (its `current` is
    /// dropped).
    pub fn normalize(&self, value: &ParamValue) -> Option<ParamValue> {
        match (self.kind, value) {
            (DefinitionKind::Scalar { .. }, ParamValue::Scalar(raw)) => {
                Some(ParamValue::Scalar(normalize_scalar(self, *raw)))
            }
            (DefinitionKind::Range { .. }, ParamValue::Range(raw)) => {
                Some(ParamValue::Range(normalize_range_triplet(self, *raw)))
            }
            (DefinitionKind::Bounds { .. }, ParamValue::Bounds(raw)) => {
                Some(ParamValue::Bounds(normalize_bounds_pair(self, *raw)))
            }
            (DefinitionKind::Bounds { .. }, ParamValue::Range(raw)) => {
                Some(ParamValue::Bounds(normalize_bounds_pair(
                    self,
                    BoundsValue {
                        min: raw.min,
                        max: raw.max,
                    },
                )))
            }
            _ => None,
        }
    }
}

/// Live value of a range parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeValue {
    pub min: f64,
    pub current: f64,
    pub max: f64,
}

/// Live value of a bounds parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsValue {
    pub min: f64,
    pub max: f64,
}

/// Live value for a key, shaped to match its definition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Scalar(f64),
    Range(RangeValue),
    Bounds(BoundsValue),
}

impl ParamValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_range(&self) -> Option<RangeValue> {
        match self {
            Self::Range(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bounds(&self) -> Option<BoundsValue> {
        match self {
            Self::Bounds(value) => Some(*value),
            _ => None,
        }
    }

    /// Read the field addressed by `handle`, if the variant has it.
    pub fn handle_value(&self, handle: Handle) -> Option<f64> {
        match (self, handle) {
            (Self::Scalar(value), Handle::Current) => Some(*value),
            (Self::Range(value), Handle::Min) => Some(value.min),
            (Self::Range(value), Handle::Current) => Some(value.current),
            (Self::Range(value), Handle::Max) => Some(value.max),
            (Self::Bounds(value), Handle::Min) => Some(value.min),
            (Self::Bounds(value), Handle::Max) => Some(value.max),
            _ => None,
        }
    }
}

/// One editable field of a parameter's control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    Min,
    Current,
    Max,
}

impl Handle {
    pub fn all() -> &'static [Handle] {
        &[Handle::Min, Handle::Current, Handle::Max]
    }

    /// Cycle `min -> current -> max -> min`.
    pub fn next(self) -> Self {
        match self {
            Self::Min => Self::Current,
            Self::Current => Self::Max,
            Self::Max => Self::Min,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Current => "current",
            Self::Max => "max",
        }
    }
}
