//! Share payload codec.
//!
//! A payload is `{"v": 1, "a": <plugin id>, "s": {"p": {...}, "f": {...}}}`
//! serialized as JSON and encoded with URL-safe base64 without padding, so it
//! fits in a URL fragment or on a command line.

use std::collections::BTreeMap;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{FunctionSettings, PluginSettings, StoredValue};
use crate::error::{GenSynthError, Result};

/// Schema version of share payloads.
pub const SHARE_VERSION: u32 = 1;

/// Values and modulation levels, with short field names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompactSettings {
    #[serde(default, rename = "p")]
    pub params: BTreeMap<String, StoredValue>,
    #[serde(default, rename = "f", skip_serializing_if = "BTreeMap::is_empty")]
    pub speeds: BTreeMap<String, i64>,
}

impl CompactSettings {
    /// Lenient parse: unusable entries are dropped.
    pub fn from_json(value: &Value) -> Self {
        let mut compact = Self::default();
        if let Some(params) = value.get("p").and_then(Value::as_object) {
            for (key, raw) in params {
                if let Ok(stored) = serde_json::from_value::<StoredValue>(raw.clone()) {
                    compact.params.insert(key.clone(), stored);
                }
            }
        }
        if let Some(speeds) = value.get("f").and_then(Value::as_object) {
            for (key, raw) in speeds {
                if let Some(level) = raw.as_f64().filter(|level| level.is_finite()) {
                    compact.speeds.insert(key.clone(), level.trunc() as i64);
                }
            }
        }
        compact
    }
}

impl From<&PluginSettings> for CompactSettings {
    fn from(settings: &PluginSettings) -> Self {
        Self {
            params: settings.params.clone(),
            speeds: settings
                .functions
                .iter()
                .filter(|(_, function)| function.noise_speed_index != 0)
                .map(|(key, function)| (key.clone(), function.noise_speed_index))
                .collect(),
        }
    }
}

impl From<&CompactSettings> for PluginSettings {
    fn from(compact: &CompactSettings) -> Self {
        Self {
            params: compact.params.clone(),
            functions: compact
                .speeds
                .iter()
                .map(|(key, level)| {
                    (
                        key.clone(),
                        FunctionSettings {
                            noise_speed_index: *level,
                        },
                    )
                })
                .collect(),
        }
    }
}

/// Decoded share payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharePayload {
    #[serde(rename = "v")]
    pub version: u32,
    #[serde(rename = "a")]
    pub plugin_id: String,
    #[serde(rename = "s")]
    pub settings: CompactSettings,
}

impl SharePayload {
    pub fn new(plugin_id: impl Into<String>, settings: CompactSettings) -> Self {
        Self {
            version: SHARE_VERSION,
            plugin_id: plugin_id.into(),
            settings,
        }
    }
}

/// Encode a payload as URL-safe base64 JSON.
pub fn encode_share(payload: &SharePayload) -> Result<String> {
    let json = serde_json::to_vec(payload).map_err(|err| GenSynthError::share(err.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a payload produced by [`encode_share`].
///
/// Leading `#` and trailing padding are tolerated. Individual settings
/// entries that do not parse are dropped; a wrong version, a missing plugin
/// id or undecodable text is an error.
pub fn decode_share(text: &str) -> Result<SharePayload> {
    let trimmed = text.trim().trim_start_matches('#').trim_end_matches('=');
    if trimmed.is_empty() {
        return Err(GenSynthError::share("empty payload"));
    }
    let bytes = URL_SAFE_NO_PAD
        .decode(trimmed)
        .map_err(|err| GenSynthError::share(format!("invalid base64: {err}")))?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|err| GenSynthError::share(format!("invalid json: {err}")))?;

    let version = value.get("v").and_then(Value::as_u64);
    if version != Some(u64::from(SHARE_VERSION)) {
        let message = format!("unsupported version {version:?}");
        return Err(GenSynthError::share(message));
    }
    let plugin_id = value
        .get("a")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| GenSynthError::share("missing plugin id"))?;
    let settings = value
        .get("s")
        .map(CompactSettings::from_json)
        .unwrap_or_default();

    Ok(SharePayload::new(plugin_id, settings))
}

/// Decode a payload handed in from outside the program. Unusable payloads
/// are logged and dropped so the caller carries on with its own settings.
pub fn read_share(text: &str) -> Option<SharePayload> {
    match decode_share(text) {
        Ok(payload) => Some(payload),
        Err(err) => {
            log::warn!("ignoring {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SharePayload {
        let mut settings = CompactSettings::default();
        settings.params.insert(
            "radius".into(),
            StoredValue::Range {
                min: 2.0,
                current: 10.5,
                max: 40.0,
            },
        );
        let count = StoredValue::Number(3.0);
        settings.params.insert("count".into(), count);
        settings.speeds.insert("radius".into(), 4);
        SharePayload::new("circles", settings)
    }

    #[test]
    fn encoded_payload_is_url_safe() {
        let encoded = encode_share(&sample()).unwrap();
        assert!(encoded
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn decode_restores_payload() {
        let payload = sample();
        let decoded = decode_share(&encode_share(&payload).unwrap()).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn decode_tolerates_fragment_marker() {
        let encoded = format!("#{}", encode_share(&sample()).unwrap());
        assert_eq!(decode_share(&encoded).unwrap().plugin_id, "circles");
    }

    #[test]
    fn decode_drops_bad_entries() {
        let json = r#"{"v":1,"a":"lines","s":{"p":{"good":2,"bad":"x"},"f":{"good":1,"no":null}}}"#;
        let decoded = decode_share(&URL_SAFE_NO_PAD.encode(json)).unwrap();
        assert_eq!(decoded.settings.params.len(), 1);
        assert_eq!(decoded.settings.speeds.get("good"), Some(&1));
        assert_eq!(decoded.settings.speeds.len(), 1);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_share("").is_err());
        assert!(decode_share("!!!not base64!!!").is_err());
        assert!(decode_share(&URL_SAFE_NO_PAD.encode("[1,2]")).is_err());
        let future = URL_SAFE_NO_PAD.encode(r#"{"v":9,"a":"x","s":{}}"#);
        assert!(decode_share(&future).is_err());
        let anonymous = URL_SAFE_NO_PAD.encode(r#"{"v":1,"s":{}}"#);
        assert!(decode_share(&anonymous).is_err());
    }

    #[test]
    fn read_share_drops_unusable_payloads() {
        assert_eq!(read_share("not-a-payload!!"), None);
        let future = URL_SAFE_NO_PAD.encode(r#"{"v":7,"a":"circles","s":{"p":{}}}"#);
        assert_eq!(read_share(&future), None);
        let encoded = encode_share(&sample()).unwrap();
        assert_eq!(read_share(&encoded), Some(sample()));
    }

    #[test]
    fn compact_conversion_skips_disabled_speeds() {
        let mut settings = PluginSettings::default();
        settings.functions.insert(
            "a".into(),
            FunctionSettings {
                noise_speed_index: 0,
            },
        );
        settings.functions.insert(
            "b".into(),
            FunctionSettings {
                noise_speed_index: 2,
            },
        );
        let compact = CompactSettings::from(&settings);
        assert_eq!(compact.speeds.len(), 1);
        let restored = PluginSettings::from(&compact);
        assert_eq!(restored.functions["b"].noise_speed_index, 2);
    }
}
