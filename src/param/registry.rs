//! Parameter registry: resolves plugin specs into definitions and reconciles
//! the live value store with them.
//!
//! Resolution runs on plugin init, plugin switch, restart and canvas resize.
//! Values survive a refresh when their key is unchanged and their shape still
//! fits; they are re-normalized against the new bounds so a canvas-dependent
//! range keeps the user's position clamped into its new limits.

use std::collections::{HashMap, HashSet};

use super::normalize::clamp;
use super::spec::{Bound, ParamDefault, ParamKind, ParamSpec};
use super::{
    DefinitionKind, LimitContext, ParamValue, ParameterDefinition, RangeValue, DEFAULT_GROUP,
    DEFAULT_STEP,
};

/// How existing values are treated during a resolve pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions<'a> {
    /// Reset values to definition defaults instead of preserving them.
    pub use_defaults: bool,
    /// Keys that keep their value even when `use_defaults` is set.
    pub preserve_keys: Option<&'a HashSet<String>>,
}

impl<'a> ResolveOptions<'a> {
    /// Keep every structurally valid value.
    pub fn preserve() -> Self {
        Self::default()
    }

    /// Reset every value to its default.
    pub fn defaults() -> Self {
        Self {
            use_defaults: true,
            preserve_keys: None,
        }
    }

    /// Reset every value except those in `keys`.
    pub fn defaults_keeping(keys: &'a HashSet<String>) -> Self {
        Self {
            use_defaults: true,
            preserve_keys: Some(keys),
        }
    }

    fn keeps(&self, key: &str) -> bool {
        !self.use_defaults || self.preserve_keys.is_some_and(|keys| keys.contains(key))
    }
}

/// Resolve one spec against the canvas limits.
pub fn resolve_definition(spec: &ParamSpec, limits: &LimitContext) -> ParameterDefinition {
    let min = spec.min.resolve(limits, 0.0);
    let max = spec.max.resolve(limits, min).max(min);
    let step = match spec.step {
        Some(step) if step > 0.0 => step,
        _ => DEFAULT_STEP,
    };

    let kind = match spec.kind {
        ParamKind::Number => {
            let raw = match &spec.default {
                ParamDefault::Unset => min,
                ParamDefault::Value(bound) => bound.resolve(limits, min),
                ParamDefault::Fields { current, .. } => resolve_field(current, limits, min),
            };
            DefinitionKind::Scalar {
                default_value: clamp(raw, min, max),
            }
        }
        ParamKind::Range => {
            let mut default_min = min;
            let mut default_max = max;
            let mut default_current = (min + max) / 2.0;
            match &spec.default {
                ParamDefault::Unset => {}
                ParamDefault::Value(bound) => {
                    default_current = bound.resolve(limits, default_current);
                }
                ParamDefault::Fields {
                    min: field_min,
                    current,
                    max: field_max,
                } => {
                    default_min = resolve_field(field_min, limits, min);
                    default_max = resolve_field(field_max, limits, max).max(default_min);
                    default_current = resolve_field(current, limits, default_current);
                }
            }
            DefinitionKind::Range {
                default_min,
                default_current,
                default_max,
                allow_function: spec.allow_function,
            }
        }
        ParamKind::Bounds => {
            let (default_min, default_max) = match &spec.default {
                ParamDefault::Fields {
                    min: field_min,
                    max: field_max,
                    ..
                } => {
                    let default_min = resolve_field(field_min, limits, min);
                    (default_min, resolve_field(field_max, limits, max).max(default_min))
                }
                _ => (min, max),
            };
            DefinitionKind::Bounds {
                default_min,
                default_max,
            }
        }
    };

    ParameterDefinition {
        key: spec.key.clone(),
        label: spec.label.clone().unwrap_or_else(|| spec.key.clone()),
        group: spec
            .group
            .clone()
            .filter(|group| !group.is_empty())
            .unwrap_or_else(|| DEFAULT_GROUP.to_string()),
        min,
        max,
        step,
        kind,
    }
}

fn resolve_field(field: &Option<Bound>, limits: &LimitContext, fallback: f64) -> f64 {
    field
        .as_ref()
        .map_or(fallback, |bound| bound.resolve(limits, fallback))
}

/// A plugin-facing value: ranges collapse to their `current`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnapshotValue {
    Number(f64),
    Bounds { min: f64, max: f64 },
}

/// Immutable copy of the parameter values handed to a plugin step, in
/// declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSnapshot {
    entries: Vec<(String, SnapshotValue)>,
    index: HashMap<String, usize>,
}

impl ParamSnapshot {
    pub fn get(&self, key: &str) -> Option<SnapshotValue> {
        self.index.get(key).map(|&slot| self.entries[slot].1)
    }

    /// The number for a scalar or range key.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            SnapshotValue::Number(value) => Some(value),
            SnapshotValue::Bounds { .. } => None,
        }
    }

    pub fn number_or(&self, key: &str, fallback: f64) -> f64 {
        self.number(key)
            .filter(|value| value.is_finite())
            .unwrap_or(fallback)
    }

    /// The `(min, max)` pair for a bounds key.
    pub fn bounds(&self, key: &str) -> Option<(f64, f64)> {
        match self.get(key)? {
            SnapshotValue::Bounds { min, max } => Some((min, max)),
            SnapshotValue::Number(_) => None,
        }
    }

    /// Entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, SnapshotValue)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Set `key`, keeping its position when it is already present.
    pub fn insert(&mut self, key: impl Into<String>, value: SnapshotValue) {
        let key = key.into();
        match self.index.get(&key) {
            Some(&slot) => self.entries[slot].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }
}

/// Authoritative definitions plus the live value store.
#[derive(Debug, Clone, Default)]
pub struct ParameterRegistry {
    definitions: Vec<ParameterDefinition>,
    index: HashMap<String, usize>,
    values: HashMap<String, ParamValue>,
}

impl ParameterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `specs` and reconcile the value store.
    ///
    /// A later spec with an already-seen key replaces the earlier definition in
    /// place. Values whose key disappeared are dropped.
    pub fn resolve(
        &mut self,
        specs: &[ParamSpec],
        limits: &LimitContext,
        options: ResolveOptions<'_>,
    ) {
        let mut definitions: Vec<ParameterDefinition> = Vec::with_capacity(specs.len());
        let mut index = HashMap::with_capacity(specs.len());

        for spec in specs.iter().filter(|spec| !spec.key.is_empty()) {
            let definition = resolve_definition(spec, limits);
            match index.get(&definition.key) {
                Some(&slot) => definitions[slot] = definition,
                None => {
                    index.insert(definition.key.clone(), definitions.len());
                    definitions.push(definition);
                }
            }
        }

        let mut values = HashMap::with_capacity(definitions.len());
        for definition in &definitions {
            let preserved = if options.keeps(&definition.key) {
                self.values
                    .get(&definition.key)
                    .and_then(|existing| definition.normalize(existing))
            } else {
                None
            };
            let value = preserved.unwrap_or_else(|| definition.default_value());
            values.insert(definition.key.clone(), value);
        }

        let dropped = self
            .values
            .keys()
            .filter(|key| !index.contains_key(*key))
            .count();
        if dropped > 0 {
            log::debug!("dropped {dropped} stale parameter values");
        }

        self.definitions = definitions;
        self.index = index;
        self.values = values;
    }

    /// Definitions in declaration order.
    pub fn definitions(&self) -> &[ParameterDefinition] {
        &self.definitions
    }

    pub fn definition(&self, key: &str) -> Option<&ParameterDefinition> {
        self.index.get(key).map(|&slot| &self.definitions[slot])
    }

    pub fn value(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    /// Normalize `value` against the key's definition and store it.
    ///
    /// Returns `false` for unknown keys or values of the wrong shape.
    pub fn set_value(&mut self, key: &str, value: &ParamValue) -> bool {
        let Some(normalized) = self.definition(key).and_then(|def| def.normalize(value)) else {
            return false;
        };
        self.values.insert(key.to_string(), normalized);
        true
    }

    /// Replace only the `current` field of a range value.
    ///
    /// The caller is responsible for keeping `current` inside `[min, max]`.
    pub fn set_range_current(&mut self, key: &str, current: f64) -> bool {
        match self.values.get_mut(key) {
            Some(ParamValue::Range(range)) => {
                range.current = clamp(current, range.min, range.max);
                true
            }
            _ => false,
        }
    }

    pub fn range_value(&self, key: &str) -> Option<RangeValue> {
        self.values.get(key).and_then(ParamValue::as_range)
    }

    /// Reset every value to its definition default.
    pub fn reset_to_defaults(&mut self) {
        for definition in &self.definitions {
            self.values
                .insert(definition.key.clone(), definition.default_value());
        }
    }

    /// Copy the values into the shape plugins consume.
    pub fn snapshot(&self) -> ParamSnapshot {
        let mut snapshot = ParamSnapshot::default();
        for definition in &self.definitions {
            let Some(value) = self.values.get(&definition.key) else {
                continue;
            };
            let entry = match value {
                ParamValue::Scalar(number) => SnapshotValue::Number(*number),
                ParamValue::Range(range) => SnapshotValue::Number(range.current),
                ParamValue::Bounds(bounds) => SnapshotValue::Bounds {
                    min: bounds.min,
                    max: bounds.max,
                },
            };
            snapshot.insert(definition.key.clone(), entry);
        }
        snapshot
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::BoundsValue;

    fn limits(width: f64, height: f64) -> LimitContext {
        LimitContext::from_size(width, height)
    }

    fn specs() -> Vec<ParamSpec> {
        vec![
            ParamSpec::range("spread", 0.0, 100.0)
                .step(1.0)
                .default_fields(Some(20.0), Some(50.0), Some(80.0)),
            ParamSpec::bounds("window", 0.0, Bound::dynamic(|l| l.min_dim)).step(10.0),
            ParamSpec::number("count", 1.0, 10.0, 3.0),
        ]
    }

    #[test]
    fn range_default_object_resolves() {
        let mut registry = ParameterRegistry::new();
        registry.resolve(&specs(), &limits(400.0, 300.0), ResolveOptions::defaults());
        assert_eq!(
            registry.range_value("spread"),
            Some(RangeValue {
                min: 20.0,
                current: 50.0,
                max: 80.0
            })
        );
    }

    #[test]
    fn range_without_default_uses_midpoint() {
        let spec = ParamSpec::range("radius", 0.0, 10.0);
        let def = resolve_definition(&spec, &limits(100.0, 100.0));
        assert_eq!(
            def.kind,
            DefinitionKind::Range {
                default_min: 0.0,
                default_current: 5.0,
                default_max: 10.0,
                allow_function: true
            }
        );
    }

    #[test]
    fn range_number_default_sets_current_only() {
        let spec = ParamSpec::range("radius", 0.0, 10.0).default_value(2.0);
        let def = resolve_definition(&spec, &limits(100.0, 100.0));
        assert_eq!(
            def.default_value(),
            ParamValue::Range(RangeValue {
                min: 0.0,
                current: 2.0,
                max: 10.0
            })
        );
    }

    #[test]
    fn inverted_default_fields_are_ordered() {
        let spec = ParamSpec::range("radius", 0.0, 10.0).default_fields(Some(8.0), None, Some(3.0));
        let def = resolve_definition(&spec, &limits(100.0, 100.0));
        match def.kind {
            DefinitionKind::Range {
                default_min,
                default_max,
                ..
            } => {
                assert_eq!(default_min, 8.0);
                assert_eq!(default_max, 8.0);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn inverted_bounds_collapse_and_step_defaults() {
        let spec = ParamSpec::number("n", 10.0, 2.0, 4.0)
            .step(0.0)
            .label("N")
            .group("");
        let def = resolve_definition(&spec, &limits(100.0, 100.0));
        assert_eq!(def.min, 10.0);
        assert_eq!(def.max, 10.0);
        assert_eq!(def.step, DEFAULT_STEP);
        assert_eq!(def.group, DEFAULT_GROUP);
        assert_eq!(def.default_value(), ParamValue::Scalar(10.0));
    }

    #[test]
    fn missing_label_uses_key() {
        let def = resolve_definition(&ParamSpec::range("hue", 0.0, 360.0), &limits(1.0, 1.0));
        assert_eq!(def.label, "hue");
    }

    #[test]
    fn resize_preserves_values_within_new_bounds() {
        let mut registry = ParameterRegistry::new();
        registry.resolve(&specs(), &limits(800.0, 600.0), ResolveOptions::defaults());
        registry.set_value(
            "window",
            &ParamValue::Bounds(BoundsValue {
                min: 100.0,
                max: 500.0,
            }),
        );

        registry.resolve(&specs(), &limits(400.0, 300.0), ResolveOptions::preserve());
        assert_eq!(registry.definition("window").unwrap().max, 300.0);
        assert_eq!(
            registry.value("window"),
            Some(&ParamValue::Bounds(BoundsValue {
                min: 100.0,
                max: 300.0
            }))
        );
    }

    #[test]
    fn defaults_pass_resets_except_preserved_keys() {
        let mut registry = ParameterRegistry::new();
        registry.resolve(&specs(), &limits(400.0, 300.0), ResolveOptions::defaults());
        registry.set_value("count", &ParamValue::Scalar(9.0));
        registry.set_value(
            "spread",
            &ParamValue::Range(RangeValue {
                min: 0.0,
                current: 10.0,
                max: 90.0,
            }),
        );

        let keep: HashSet<String> = ["count".to_string()].into_iter().collect();
        let options = ResolveOptions::defaults_keeping(&keep);
        registry.resolve(&specs(), &limits(400.0, 300.0), options);
        assert_eq!(registry.value("count"), Some(&ParamValue::Scalar(9.0)));
        assert_eq!(registry.range_value("spread").unwrap().current, 50.0);
    }

    #[test]
    fn shape_change_resets_value() {
        let mut registry = ParameterRegistry::new();
        registry.resolve(
            &[ParamSpec::number("size", 0.0, 10.0, 4.0)],
            &limits(1.0, 1.0),
            ResolveOptions::defaults(),
        );
        registry.resolve(
            &[ParamSpec::range("size", 0.0, 10.0).default_value(7.0)],
            &limits(1.0, 1.0),
            ResolveOptions::preserve(),
        );
        assert_eq!(registry.range_value("size").unwrap().current, 7.0);
    }

    #[test]
    fn stale_keys_are_dropped() {
        let mut registry = ParameterRegistry::new();
        registry.resolve(&specs(), &limits(1.0, 1.0), ResolveOptions::defaults());
        registry.resolve(
            &[ParamSpec::number("count", 1.0, 10.0, 3.0)],
            &limits(1.0, 1.0),
            ResolveOptions::preserve(),
        );
        assert!(registry.value("spread").is_none());
        assert!(registry.definition("window").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_key_keeps_position_takes_latest() {
        let mut registry = ParameterRegistry::new();
        registry.resolve(
            &[
                ParamSpec::range("opacity", 0.0, 1.0).step(0.01),
                ParamSpec::number("count", 1.0, 10.0, 3.0),
                ParamSpec::range("opacity", 0.01, 1.0)
                    .step(0.01)
                    .group("ink"),
            ],
            &limits(1.0, 1.0),
            ResolveOptions::defaults(),
        );
        let keys: Vec<&str> = registry.definitions().iter().map(|d| &*d.key).collect();
        assert_eq!(keys, vec!["opacity", "count"]);
        assert_eq!(registry.definition("opacity").unwrap().group, "ink");
    }

    #[test]
    fn snapshot_collapses_shapes() {
        let mut registry = ParameterRegistry::new();
        registry.resolve(&specs(), &limits(400.0, 300.0), ResolveOptions::defaults());
        let snapshot = registry.snapshot();
        assert_eq!(snapshot.number("spread"), Some(50.0));
        assert_eq!(snapshot.bounds("window"), Some((0.0, 300.0)));
        assert_eq!(snapshot.number("count"), Some(3.0));
        assert_eq!(snapshot.number("window"), None);
        assert_eq!(snapshot.number_or("missing", 1.5), 1.5);
    }

    #[test]
    fn snapshot_keeps_declaration_order() {
        let mut registry = ParameterRegistry::new();
        registry.resolve(&specs(), &limits(400.0, 300.0), ResolveOptions::defaults());
        let mut snapshot = registry.snapshot();
        let keys: Vec<&str> = snapshot.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["spread", "window", "count"]);

        snapshot.insert("spread", SnapshotValue::Number(1.0));
        snapshot.insert("extra", SnapshotValue::Number(2.0));
        let keys: Vec<&str> = snapshot.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["spread", "window", "count", "extra"]);
        assert_eq!(snapshot.number("spread"), Some(1.0));
        assert_eq!(snapshot.len(), 4);
    }

    #[test]
    fn set_range_current_clamps_into_interval() {
        let mut registry = ParameterRegistry::new();
        registry.resolve(&specs(), &limits(1.0, 1.0), ResolveOptions::defaults());
        assert!(registry.set_range_current("spread", 95.0));
        assert_eq!(registry.range_value("spread").unwrap().current, 80.0);
        assert!(!registry.set_range_current("count", 1.0));
    }

    #[test]
    fn set_value_rejects_unknown_keys_and_shapes() {
        let mut registry = ParameterRegistry::new();
        registry.resolve(&specs(), &limits(1.0, 1.0), ResolveOptions::defaults());
        assert!(!registry.set_value("missing", &ParamValue::Scalar(1.0)));
        let bounds = ParamValue::Bounds(BoundsValue { min: 1.0, max: 2.0 });
        assert!(!registry.set_value("count", &bounds));
    }
}
