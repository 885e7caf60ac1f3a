//! Persisted parameter settings.
//!
//! The record covers every plugin visited so far:
//!
//! ```json
//! {"version": 1,
//!  "plugins": {"circles": {"params": {"radius": {"min": 1, "current": 5, "max": 40}},
//!                          "functions": {"radius": {"noiseSpeedIndex": 2}}}},
//!  "selected": "circles"}
//! ```
//!
//! Phase domains are not stored; they are reallocated on load. Parsing is
//! fail-soft at every level: a bad envelope yields no settings, a bad plugin
//! entry or parameter entry is skipped on its own.

pub mod debounce;
pub mod share;
pub mod store;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::noise::ModulationBank;
use crate::param::{BoundsValue, ParamValue, ParameterRegistry, RangeValue};

pub use debounce::Debouncer;
pub use share::{
    decode_share, encode_share, read_share, CompactSettings, SharePayload, SHARE_VERSION,
};
pub use store::{FileStorage, MemoryStorage, SettingsStorage, SettingsStore};

/// Version written into the storage envelope.
pub const STORAGE_VERSION: u32 = 1;

/// One stored parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    Range { min: f64, current: f64, max: f64 },
    Bounds { min: f64, max: f64 },
    Number(f64),
}

impl From<ParamValue> for StoredValue {
    fn from(value: ParamValue) -> Self {
        match value {
            ParamValue::Scalar(number) => Self::Number(number),
            ParamValue::Range(range) => Self::Range {
                min: range.min,
                current: range.current,
                max: range.max,
            },
            ParamValue::Bounds(bounds) => Self::Bounds {
                min: bounds.min,
                max: bounds.max,
            },
        }
    }
}

impl From<StoredValue> for ParamValue {
    fn from(value: StoredValue) -> Self {
        match value {
            StoredValue::Number(number) => Self::Scalar(number),
            StoredValue::Range { min, current, max } => {
                Self::Range(RangeValue { min, current, max })
            }
            StoredValue::Bounds { min, max } => Self::Bounds(BoundsValue { min, max }),
        }
    }
}

/// Stored modulation settings for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSettings {
    pub noise_speed_index: i64,
}

/// Stored settings for one plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginSettings {
    #[serde(default)]
    pub params: BTreeMap<String, StoredValue>,
    #[serde(default)]
    pub functions: BTreeMap<String, FunctionSettings>,
}

impl PluginSettings {
    /// Lenient parse: entries that do not fit are dropped individually.
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let mut settings = Self::default();

        if let Some(params) = object.get("params").and_then(Value::as_object) {
            for (key, raw) in params {
                if let Some(stored) = parse_stored_value(raw) {
                    settings.params.insert(key.clone(), stored);
                }
            }
        }

        if let Some(functions) = object.get("functions").and_then(Value::as_object) {
            for (key, raw) in functions {
                let level = raw
                    .get("noiseSpeedIndex")
                    .and_then(|index| index.as_f64())
                    .filter(|index| index.is_finite());
                if let Some(level) = level {
                    settings.functions.insert(
                        key.clone(),
                        FunctionSettings {
                            noise_speed_index: level.trunc() as i64,
                        },
                    );
                }
            }
        }

        Some(settings)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.functions.is_empty()
    }
}

fn parse_stored_value(raw: &Value) -> Option<StoredValue> {
    serde_json::from_value(raw.clone()).ok()
}

/// Versioned record of every plugin's settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsEnvelope {
    pub version: u32,
    #[serde(default)]
    pub plugins: BTreeMap<String, PluginSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
}

impl Default for SettingsEnvelope {
    fn default() -> Self {
        Self {
            version: STORAGE_VERSION,
            plugins: BTreeMap::new(),
            selected: None,
        }
    }
}

impl SettingsEnvelope {
    /// Parse stored text. Anything unreadable, or written by another version,
    /// yields an empty envelope.
    pub fn parse(text: &str) -> Self {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("ignoring unreadable parameter settings: {err}");
                return Self::default();
            }
        };

        let version = value.get("version").and_then(Value::as_u64);
        if version != Some(u64::from(STORAGE_VERSION)) {
            log::warn!("ignoring parameter settings with version {version:?}");
            return Self::default();
        }

        let mut envelope = Self::default();
        if let Some(plugins) = value.get("plugins").and_then(Value::as_object) {
            for (id, raw) in plugins {
                match PluginSettings::from_json(raw) {
                    Some(settings) => {
                        envelope.plugins.insert(id.clone(), settings);
                    }
                    None => log::warn!("skipping malformed settings for plugin '{id}'"),
                }
            }
        }
        envelope.selected = value
            .get("selected")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        envelope
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Capture the registry's values and the bank's speed levels.
pub fn capture_settings(
    registry: &ParameterRegistry,
    modulation: &ModulationBank,
) -> PluginSettings {
    let mut settings = PluginSettings::default();
    for definition in registry.definitions() {
        if let Some(value) = registry.value(&definition.key) {
            settings
                .params
                .insert(definition.key.clone(), StoredValue::from(*value));
        }
        if definition.allows_modulation() {
            if let Some(state) = modulation.state(&definition.key) {
                settings.functions.insert(
                    definition.key.clone(),
                    FunctionSettings {
                        noise_speed_index: state.speed_level as i64,
                    },
                );
            }
        }
    }
    settings
}

/// Restore stored settings into the registry and bank.
///
/// Keys the current definitions do not know, and values of the wrong shape,
/// are skipped. Returns the number of parameter values applied.
pub fn apply_settings(
    settings: &PluginSettings,
    registry: &mut ParameterRegistry,
    modulation: &mut ModulationBank,
) -> usize {
    let mut applied = 0;
    let keys: Vec<String> = registry
        .definitions()
        .iter()
        .map(|def| def.key.clone())
        .collect();

    for key in &keys {
        if let Some(stored) = settings.params.get(key) {
            if registry.set_value(key, &ParamValue::from(*stored)) {
                applied += 1;
            }
        }
    }

    for key in &keys {
        let allows = registry
            .definition(key)
            .is_some_and(|def| def.allows_modulation());
        if !allows {
            continue;
        }
        if let Some(function) = settings.functions.get(key) {
            modulation.set_speed_level(key, function.noise_speed_index);
        }
    }

    applied
}
