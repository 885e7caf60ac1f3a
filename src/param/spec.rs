//! Plugin-declared parameter schema.
//!
//! A [`ParamSpec`] is what a plugin returns from `init`. Bounds and defaults
//! may depend on the canvas through a [`LimitContext`], so specs are resolved
//! into concrete [`ParameterDefinition`](super::ParameterDefinition)s every
//! time the plugin is initialized or the canvas is resized.

use std::fmt;
use std::sync::Arc;

use super::normalize::to_finite;
use super::LimitContext;

type BoundFn = dyn Fn(&LimitContext) -> f64 + Send + Sync;

/// A number that is either constant or computed from the canvas limits.
#[derive(Clone)]
pub enum Bound {
    Fixed(f64),
    Dynamic(Arc<BoundFn>),
}

impl Bound {
    /// Build a bound computed from the canvas limits.
    pub fn dynamic(f: impl Fn(&LimitContext) -> f64 + Send + Sync + 'static) -> Self {
        Self::Dynamic(Arc::new(f))
    }

    /// Evaluate against `ctx`, replacing non-finite results with `fallback`.
    pub fn resolve(&self, ctx: &LimitContext, fallback: f64) -> f64 {
        let raw = match self {
            Self::Fixed(value) => *value,
            Self::Dynamic(f) => f(ctx),
        };
        to_finite(raw, fallback)
    }
}

impl From<f64> for Bound {
    fn from(value: f64) -> Self {
        Self::Fixed(value)
    }
}

impl fmt::Debug for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(value) => write!(f, "Fixed({value})"),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Declared default for a parameter.
///
/// - `Unset`: scalars default to `min`; ranges use the full bounds with
///   `current` at the midpoint; bounds use the full bounds.
/// - `Value`: a single number. For ranges this is the default `current`.
/// - `Fields`: any of `min`/`current`/`max` may override the above.
#[derive(Debug, Clone, Default)]
pub enum ParamDefault {
    #[default]
    Unset,
    Value(Bound),
    Fields {
        min: Option<Bound>,
        current: Option<Bound>,
        max: Option<Bound>,
    },
}

/// The three parameter variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Number,
    Range,
    Bounds,
}

/// A raw parameter declaration.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub kind: ParamKind,
    pub key: String,
    pub label: Option<String>,
    pub group: Option<String>,
    pub min: Bound,
    pub max: Bound,
    pub step: Option<f64>,
    pub default: ParamDefault,
    /// Whether noise modulation (and with it, editing the range bounds) is allowed.
    pub allow_function: bool,
}

impl ParamSpec {
    fn new(kind: ParamKind, key: impl Into<String>, min: Bound, max: Bound) -> Self {
        Self {
            kind,
            key: key.into(),
            label: None,
            group: None,
            min,
            max,
            step: None,
            default: ParamDefault::Unset,
            allow_function: true,
        }
    }

    /// A scalar parameter with a default value.
    pub fn number(
        key: impl Into<String>,
        min: impl Into<Bound>,
        max: impl Into<Bound>,
        default: impl Into<Bound>,
    ) -> Self {
        let mut spec = Self::new(ParamKind::Number, key, min.into(), max.into());
        spec.default = ParamDefault::Value(default.into());
        spec
    }

    /// A range parameter (`min`, `current`, `max`).
    pub fn range(key: impl Into<String>, min: impl Into<Bound>, max: impl Into<Bound>) -> Self {
        Self::new(ParamKind::Range, key, min.into(), max.into())
    }

    /// A bounds parameter (`min`, `max`).
    pub fn bounds(key: impl Into<String>, min: impl Into<Bound>, max: impl Into<Bound>) -> Self {
        Self::new(ParamKind::Bounds, key, min.into(), max.into())
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    /// Single-number default (the `current` position for ranges).
    pub fn default_value(mut self, value: impl Into<Bound>) -> Self {
        self.default = ParamDefault::Value(value.into());
        self
    }

    /// Per-field default for ranges and bounds.
    pub fn default_fields(
        mut self,
        min: Option<f64>,
        current: Option<f64>,
        max: Option<f64>,
    ) -> Self {
        self.default = ParamDefault::Fields {
            min: min.map(Bound::Fixed),
            current: current.map(Bound::Fixed),
            max: max.map(Bound::Fixed),
        };
        self
    }

    /// Forbid modulation; the range bounds stay pinned to the definition limits.
    pub fn fixed_bounds(mut self) -> Self {
        self.allow_function = false;
        self
    }
}
