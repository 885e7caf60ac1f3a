//! Plugin contract and catalog.
//!
//! A plugin declares its parameters in [`Plugin::init`] and draws one step in
//! [`Plugin::run`] from an immutable [`ParamSnapshot`]. Simulation state a
//! plugin keeps between steps lives in the plugin value itself and is reset
//! by `init`, `restart` or `on_resize` as the plugin sees fit.

pub mod circles;
pub mod ink;
pub mod lines;
pub mod snakes;
pub mod surface;

pub use circles::CirclesPlugin;
pub use ink::{ink_keys, ink_parameter_specs, InkStyle};
pub use lines::LinesPlugin;
pub use snakes::SnakesPlugin;
pub use surface::{DrawCommand, Hsla, Point, RecordingSurface, Stroke, Surface};

use crate::error::{GenSynthError, Result};
use crate::param::{LimitContext, ParamSnapshot, ParamSpec};

/// Canvas information handed to `init`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitContext {
    pub width: f64,
    pub height: f64,
    pub limits: LimitContext,
}

impl InitContext {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            limits: LimitContext::from_size(width, height),
        }
    }
}

/// What `init` returns.
#[derive(Debug, Clone, Default)]
pub struct PluginSetup {
    pub parameters: Vec<ParamSpec>,
}

/// Everything a plugin step can see.
pub struct RunContext<'a> {
    pub surface: &'a mut dyn Surface,
    pub width: f64,
    pub height: f64,
    pub frame: u64,
    pub delta_ms: f64,
    pub timestamp_ms: f64,
    pub params: &'a ParamSnapshot,
}

/// A generative drawing algorithm.
pub trait Plugin {
    /// Stable identifier, used as the persistence key.
    fn id(&self) -> &str;

    /// Human-readable name.
    fn name(&self) -> &str;

    /// Declare parameters for the given canvas. Called on load, plugin
    /// switch, restart and resize.
    fn init(&mut self, ctx: &InitContext) -> PluginSetup;

    /// Draw one step.
    fn run(&mut self, ctx: &mut RunContext<'_>);

    /// Called after a restart has cleared the surface.
    fn restart(&mut self, _ctx: &mut RunContext<'_>) {}

    /// Called after a resize has cleared the surface.
    fn on_resize(&mut self, _ctx: &mut RunContext<'_>) {}
}

/// Reject plugins that cannot be hosted.
pub fn validate_plugin(plugin: &dyn Plugin) -> Result<()> {
    let id = plugin.id();
    if id.trim().is_empty() {
        return Err(GenSynthError::InvalidPlugin("plugin id is empty".into()));
    }
    if id.chars().any(char::is_whitespace) {
        let message = format!("plugin id '{id}' contains whitespace");
        return Err(GenSynthError::InvalidPlugin(message));
    }
    if plugin.name().trim().is_empty() {
        return Err(GenSynthError::InvalidPlugin(format!("plugin '{id}' has no name")));
    }
    Ok(())
}

type PluginFactory = Box<dyn Fn() -> Box<dyn Plugin>>;

struct CatalogEntry {
    id: String,
    name: String,
    factory: PluginFactory,
}

/// Registry of plugin constructors, in registration order.
#[derive(Default)]
pub struct PluginCatalog {
    entries: Vec<CatalogEntry>,
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory. The produced plugin is validated and its id must
    /// be new to the catalog.
    pub fn register(&mut self, factory: impl Fn() -> Box<dyn Plugin> + 'static) -> Result<()> {
        let sample = factory();
        validate_plugin(sample.as_ref())?;
        let id = sample.id().to_string();
        if self.contains(&id) {
            return Err(GenSynthError::DuplicatePlugin(id));
        }
        self.entries.push(CatalogEntry {
            id,
            name: sample.name().to_string(),
            factory: Box::new(factory),
        });
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    /// `(id, name)` pairs in registration order.
    pub fn list(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .map(|entry| (entry.id.as_str(), entry.name.as_str()))
            .collect()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a fresh instance of `id`.
    pub fn create(&self, id: &str) -> Result<Box<dyn Plugin>> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| (entry.factory)())
            .ok_or_else(|| GenSynthError::UnknownPlugin(id.to_string()))
    }

    /// First candidate the catalog provides, else the first entry.
    pub fn resolve<'a>(
        &self,
        candidates: impl IntoIterator<Item = Option<&'a str>>,
    ) -> Option<&str> {
        candidates
            .into_iter()
            .flatten()
            .find_map(|id| self.entries.iter().find(|entry| entry.id == id))
            .or_else(|| self.entries.first())
            .map(|entry| entry.id.as_str())
    }

    /// The id `offset` entries away from `id`, wrapping around.
    pub fn cycle(&self, id: &str, offset: isize) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        let len = self.entries.len() as isize;
        let index = self
            .entries
            .iter()
            .position(|entry| entry.id == id)
            .map_or(0, |index| index as isize);
        let next = (index + offset).rem_euclid(len) as usize;
        Some(self.entries[next].id.as_str())
    }
}

/// Catalog of the bundled plugins.
pub fn builtin_catalog() -> PluginCatalog {
    let mut catalog = PluginCatalog::new();
    let factories: [fn() -> Box<dyn Plugin>; 3] = [
        || Box::new(CirclesPlugin::new()) as Box<dyn Plugin>,
        || Box::new(LinesPlugin::new()) as Box<dyn Plugin>,
        || Box::new(SnakesPlugin::new()) as Box<dyn Plugin>,
    ];
    for factory in factories {
        if let Err(err) = catalog.register(factory) {
            log::warn!("skipping bundled plugin: {err}");
        }
    }
    catalog
}
