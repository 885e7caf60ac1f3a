//! Settings persistence integration tests: file I/O, debounced writes and
//! restoring values across sessions and plugin switches.

use std::path::Path;
use std::time::{Duration, Instant};

use gensynth::engine::{Engine, EngineConfig, PluginSwitch};
use gensynth::param::{Handle, ParamValue, RangeValue};
use gensynth::persist::{FileStorage, MemoryStorage, SettingsStorage};
use gensynth::plugin::{CirclesPlugin, LinesPlugin, RecordingSurface};
use serde_json::Value;

fn open(storage: Box<dyn SettingsStorage>) -> Engine<RecordingSurface> {
    let mut engine = Engine::new(
        Box::new(CirclesPlugin::with_seed(1)),
        RecordingSurface::new(),
        storage,
        EngineConfig::default(),
    )
    .unwrap();
    engine.init(400.0, 300.0);
    engine
}

fn open_file(path: &Path) -> Engine<RecordingSurface> {
    open(Box::new(FileStorage::new(path)))
}

fn radius(engine: &Engine<RecordingSurface>) -> RangeValue {
    engine
        .value("radius")
        .and_then(ParamValue::as_range)
        .unwrap()
}

fn read_json(path: &Path) -> Value {
    let text = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&text).unwrap()
}

fn speed_level(engine: &Engine<RecordingSurface>, key: &str) -> Option<usize> {
    engine.modulation(key).map(|state| state.speed_level)
}

#[test]
fn edits_are_written_after_the_debounce() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let mut engine = open_file(&path);
    let t0 = Instant::now();

    assert!(engine.set_handle_value("radius", Handle::Current, 42.0));
    assert!(engine.has_pending_write());
    assert!(!engine.poll(t0));
    assert!(!path.exists());

    assert!(engine.poll(t0 + Duration::from_secs(1)));
    assert!(!engine.has_pending_write());
    let json = read_json(&path);
    assert_eq!(json["version"], 1);
    assert_eq!(json["selected"], "circles");
    let circles = &json["plugins"]["circles"];
    assert_eq!(circles["params"]["radius"]["current"], 42.0);
    assert_eq!(circles["functions"]["radius"]["noiseSpeedIndex"], 0);
}

#[test]
fn values_and_speeds_survive_a_new_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    {
        let mut engine = open_file(&path);
        engine.set_handle_value("radius", Handle::Min, 10.0);
        engine.set_handle_value("radius", Handle::Current, 42.0);
        engine.cycle_modulation_speed("hue");
        engine.cycle_modulation_speed("hue");
        engine.destroy();
    }

    let engine = open_file(&path);
    assert_eq!(
        radius(&engine),
        RangeValue {
            min: 10.0,
            current: 42.0,
            max: 400.0
        }
    );
    assert_eq!(speed_level(&engine, "hue"), Some(2));
    assert_eq!(engine.stored_selection(), Some("circles"));
}

#[test]
fn corrupt_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{ not json").unwrap();

    let mut engine = open_file(&path);
    assert_eq!(radius(&engine).current, 100.0);
    assert!(engine.flush_settings());
    assert_eq!(read_json(&path)["version"], 1);
}

#[test]
fn other_versions_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let json = concat!(
        r#"{"version":99,"plugins":{"circles":{"params":"#,
        r#"{"radius":{"min":0,"current":42,"max":400}}}}}"#,
    );
    std::fs::write(&path, json).unwrap();

    let engine = open_file(&path);
    assert_eq!(radius(&engine).current, 100.0);
}

#[test]
fn stored_values_are_normalized_on_restore() {
    let storage = MemoryStorage::with_contents(
        r#"{"version":1,"plugins":{"circles":{
            "params":{
                "radius":{"min":-50,"current":9999,"max":9999},
                "opacity":"loud",
                "gone":{"min":1,"current":2,"max":3}
            },
            "functions":{"hue":{"noiseSpeedIndex":8}}
        }}}"#,
    );
    let engine = open(Box::new(storage));
    assert_eq!(
        radius(&engine),
        RangeValue {
            min: 0.0,
            current: 400.0,
            max: 400.0
        }
    );
    assert!(engine.value("gone").is_none());
    // levels wrap into the speed table
    assert_eq!(speed_level(&engine, "hue"), Some(2));
}

#[test]
fn each_plugin_keeps_its_own_settings() {
    let storage = MemoryStorage::new();
    let mut engine = open(Box::new(storage.clone()));
    engine.set_handle_value("radius", Handle::Current, 42.0);

    let lines = Box::new(LinesPlugin::with_seed(2));
    engine.set_plugin(lines, PluginSwitch::default()).unwrap();
    // the outgoing plugin is written at once
    let json: Value = serde_json::from_str(&storage.contents().unwrap()).unwrap();
    let circles = &json["plugins"]["circles"];
    assert_eq!(circles["params"]["radius"]["current"], 42.0);

    engine.set_handle_value("lineLength", Handle::Current, 300.0);
    let circles = Box::new(CirclesPlugin::with_seed(3));
    engine.set_plugin(circles, PluginSwitch::default()).unwrap();
    assert_eq!(radius(&engine).current, 42.0);

    engine.destroy();
    let json: Value = serde_json::from_str(&storage.contents().unwrap()).unwrap();
    let lines = &json["plugins"]["lines"];
    assert_eq!(lines["params"]["lineLength"]["current"], 300.0);
    assert_eq!(json["selected"], "circles");
}

#[test]
fn clearing_removes_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("settings.json");
    let mut engine = open_file(&path);
    assert!(engine.flush_settings());
    assert!(path.exists());

    engine.clear_stored_settings().unwrap();
    assert!(!path.exists());
    assert!(!engine.has_pending_write());
}

#[test]
fn write_failures_are_swallowed() {
    let mut engine = open(Box::new(MemoryStorage::failing()));
    engine.set_handle_value("radius", Handle::Current, 42.0);
    assert!(!engine.flush_settings());
    assert_eq!(radius(&engine).current, 42.0);
    engine.destroy();
}
