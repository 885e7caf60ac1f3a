//! Storage backends and the debounced settings store.

use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;

use super::debounce::Debouncer;
use super::{PluginSettings, SettingsEnvelope};

/// Durable key-less text slot holding the settings record.
pub trait SettingsStorage {
    /// Read the stored record, `None` when nothing has been written yet.
    fn read(&self) -> io::Result<Option<String>>;
    fn write(&mut self, contents: &str) -> io::Result<()>;
    fn remove(&mut self) -> io::Result<()>;
}

/// Default location of the settings file.
pub fn default_settings_path() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".gensynth");
    path.push("param-settings.json");
    path
}

/// JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileStorage {
    fn default() -> Self {
        Self::new(default_settings_path())
    }
}

impl SettingsStorage for FileStorage {
    fn read(&self) -> io::Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        std::fs::read_to_string(&self.path).map(Some)
    }

    fn write(&mut self, contents: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, contents)
    }

    fn remove(&mut self) -> io::Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// In-memory slot. Clones share the same contents, so a test can keep a
/// handle while the engine owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    contents: Rc<RefCell<Option<String>>>,
    writes: Rc<RefCell<usize>>,
    fail_writes: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated slot.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        let storage = Self::default();
        *storage.contents.borrow_mut() = Some(contents.into());
        storage
    }

    /// Every write fails, like a full or read-only store.
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.borrow().clone()
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        *self.writes.borrow()
    }
}

impl SettingsStorage for MemoryStorage {
    fn read(&self) -> io::Result<Option<String>> {
        Ok(self.contents.borrow().clone())
    }

    fn write(&mut self, contents: &str) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::other("storage is read-only"));
        }
        *self.contents.borrow_mut() = Some(contents.to_string());
        *self.writes.borrow_mut() += 1;
        Ok(())
    }

    fn remove(&mut self) -> io::Result<()> {
        *self.contents.borrow_mut() = None;
        Ok(())
    }
}

/// The in-memory settings record plus its storage and write debouncer.
pub struct SettingsStore {
    storage: Box<dyn SettingsStorage>,
    envelope: SettingsEnvelope,
    debouncer: Debouncer,
}

impl SettingsStore {
    /// Load the record from `storage`. Never fails: unreadable data yields
    /// an empty record.
    pub fn load(storage: Box<dyn SettingsStorage>, debouncer: Debouncer) -> Self {
        let envelope = match storage.read() {
            Ok(Some(text)) => SettingsEnvelope::parse(&text),
            Ok(None) => SettingsEnvelope::default(),
            Err(err) => {
                log::warn!("could not read parameter settings: {err}");
                SettingsEnvelope::default()
            }
        };
        Self {
            storage,
            envelope,
            debouncer,
        }
    }

    pub fn envelope(&self) -> &SettingsEnvelope {
        &self.envelope
    }

    pub fn plugin(&self, id: &str) -> Option<&PluginSettings> {
        self.envelope.plugins.get(id)
    }

    /// Replace the stored settings for one plugin (in memory only).
    pub fn record(&mut self, id: &str, settings: PluginSettings) {
        self.envelope.plugins.insert(id.to_string(), settings);
    }

    pub fn selected(&self) -> Option<&str> {
        self.envelope.selected.as_deref()
    }

    pub fn set_selected(&mut self, id: &str) {
        self.envelope.selected = Some(id.to_string());
    }

    /// Request a write after the debounce window. Without a clock reading
    /// the window starts at the next [`poll`](Self::poll).
    pub fn schedule(&mut self, now: Option<Instant>) {
        match now {
            Some(now) => self.debouncer.schedule(now),
            None => self.debouncer.schedule_unanchored(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Write now, cancelling any pending debounced write.
    ///
    /// Failures are logged and swallowed. Returns whether the write succeeded.
    pub fn flush(&mut self) -> bool {
        self.debouncer.cancel();
        let text = match self.envelope.to_json() {
            Ok(text) => text,
            Err(err) => {
                log::warn!("could not encode parameter settings: {err}");
                return false;
            }
        };
        match self.storage.write(&text) {
            Ok(()) => {
                let count = self.envelope.plugins.len();
                log::debug!("flushed settings for {count} plugins");
                true
            }
            Err(err) => {
                log::warn!("could not write parameter settings: {err}");
                false
            }
        }
    }

    /// Flush if the debounce deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.debouncer.take_due(now) {
            self.flush()
        } else {
            false
        }
    }

    /// Forget every plugin's settings and delete the stored record.
    pub fn clear(&mut self) -> io::Result<()> {
        self.debouncer.cancel();
        self.envelope = SettingsEnvelope::default();
        self.storage.remove()
    }
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("envelope", &self.envelope)
            .field("debouncer", &self.debouncer)
            .finish_non_exhaustive()
    }
}
