//! Which plugin the host opens, and with which shared settings.

use crate::persist::{read_share, CompactSettings};
use crate::plugin::PluginCatalog;

/// Launch inputs, strongest first: a share payload, an explicit plugin, the
/// remembered selection, then the configured default.
#[derive(Debug, Clone, Copy, Default)]
pub struct StartupRequest<'a> {
    pub share: Option<&'a str>,
    pub plugin: Option<&'a str>,
    pub stored: Option<&'a str>,
    pub default_plugin: &'a str,
}

/// The resolved launch plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Startup {
    pub plugin_id: String,
    /// Shared settings for `plugin_id`, when the payload targets it.
    pub shared: Option<CompactSettings>,
}

impl StartupRequest<'_> {
    /// Pick the plugin to open. A malformed or foreign share payload is
    /// logged and ignored. Returns `None` only for an empty catalog.
    pub fn resolve(&self, catalog: &PluginCatalog) -> Option<Startup> {
        let payload = self.share.and_then(read_share);
        let share_id = payload.as_ref().map(|p| p.plugin_id.as_str());
        let default = Some(self.default_plugin);
        let candidates = [share_id, self.plugin, self.stored, default];
        let plugin_id = catalog.resolve(candidates)?.to_string();

        if let Some(requested) = self.plugin.filter(|id| !catalog.contains(id)) {
            log::warn!("unknown plugin '{requested}', opening '{plugin_id}'");
        }

        let shared = match payload {
            Some(payload) if payload.plugin_id == plugin_id => Some(payload.settings),
            Some(payload) => {
                let target = payload.plugin_id;
                log::warn!("share payload targets unknown plugin '{target}'");
                None
            }
            None => None,
        };
        Some(Startup { plugin_id, shared })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::{encode_share, SharePayload, StoredValue};
    use crate::plugin::builtin_catalog;

    fn payload(plugin: &str) -> String {
        let mut settings = CompactSettings::default();
        let radius = StoredValue::Number(12.0);
        settings.params.insert("radius".into(), radius);
        encode_share(&SharePayload::new(plugin, settings)).unwrap()
    }

    #[test]
    fn defaults_to_the_configured_plugin() {
        let request = StartupRequest {
            default_plugin: "lines",
            ..Default::default()
        };
        let startup = request.resolve(&builtin_catalog()).unwrap();
        assert_eq!(startup.plugin_id, "lines");
        assert!(startup.shared.is_none());
    }

    #[test]
    fn share_payload_wins_over_everything() {
        let encoded = payload("snakes");
        let request = StartupRequest {
            share: Some(&encoded),
            plugin: Some("lines"),
            stored: Some("circles"),
            default_plugin: "circles",
        };
        let startup = request.resolve(&builtin_catalog()).unwrap();
        assert_eq!(startup.plugin_id, "snakes");
        assert_eq!(startup.shared.unwrap().params.len(), 1);
    }

    #[test]
    fn malformed_share_falls_back_to_stored_plugin() {
        let request = StartupRequest {
            share: Some("not-a-payload!!"),
            stored: Some("snakes"),
            default_plugin: "circles",
            ..Default::default()
        };
        let startup = request.resolve(&builtin_catalog()).unwrap();
        assert_eq!(startup.plugin_id, "snakes");
        assert!(startup.shared.is_none());
    }

    #[test]
    fn foreign_share_opens_default_without_settings() {
        let encoded = payload("spirals");
        let request = StartupRequest {
            share: Some(&encoded),
            stored: Some("gone"),
            default_plugin: "lines",
            ..Default::default()
        };
        let startup = request.resolve(&builtin_catalog()).unwrap();
        assert_eq!(startup.plugin_id, "lines");
        assert!(startup.shared.is_none());
    }

    #[test]
    fn empty_catalog_resolves_nothing() {
        let request = StartupRequest::default();
        assert!(request.resolve(&PluginCatalog::new()).is_none());
    }
}
