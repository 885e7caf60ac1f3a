//! Engine: the owned context that hosts one plugin.
//!
//! The engine holds the plugin, its drawing surface, the parameter registry,
//! the modulation bank, open drag sessions, the frame scheduler and the
//! settings store. Everything runs on the caller's thread; the host drives it
//! by calling [`Engine::tick`] and [`Engine::poll`] from its event loop and
//! routing input through the handlers in [`input`].

pub mod input;

use std::time::{Duration, Instant};

use crate::error::{GenSynthError, Result};
use crate::interaction::DragTracker;
use crate::noise::{ModulationBank, ModulationState};
use crate::param::{
    ParamSnapshot, ParamValue, ParameterDefinition, ParameterRegistry, ResolveOptions,
};
use crate::persist::debounce::PERSIST_DEBOUNCE;
use crate::persist::{
    apply_settings, capture_settings, encode_share, CompactSettings, Debouncer, PluginSettings,
    SettingsStorage, SettingsStore, SharePayload,
};
use crate::plugin::{
    ink_keys, ink_parameter_specs, validate_plugin, InitContext, Plugin, RunContext, Surface,
};
use crate::scheduler::{FrameScheduler, SchedulerConfig, StepInfo};

/// Runtime tunables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub scheduler: SchedulerConfig,
    pub persist_debounce: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            persist_debounce: PERSIST_DEBOUNCE,
        }
    }
}

/// How [`Engine::set_plugin`] treats the incoming plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginSwitch {
    /// Start from definition defaults (ink keys kept) and apply the
    /// plugin's stored settings. Otherwise values are carried over by key.
    pub use_defaults: bool,
    /// Clear the surface before the first step.
    pub clear: bool,
}

impl Default for PluginSwitch {
    fn default() -> Self {
        Self {
            use_defaults: true,
            clear: true,
        }
    }
}

/// What one [`Engine::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub steps: usize,
    /// Modulation visibly moved at least one value.
    pub params_changed: bool,
}

pub struct Engine<S: Surface> {
    plugin: Box<dyn Plugin>,
    surface: S,
    registry: ParameterRegistry,
    modulation: ModulationBank,
    drags: DragTracker,
    scheduler: FrameScheduler,
    store: SettingsStore,
    /// Last instant the host passed to `tick` or `poll`.
    clock: Option<Instant>,
    width: f64,
    height: f64,
    initialized: bool,
    destroyed: bool,
}

impl<S: Surface> Engine<S> {
    /// Build an engine around a validated plugin. Stored settings are loaded
    /// fail-soft; nothing is drawn until [`init`](Self::init).
    pub fn new(
        plugin: Box<dyn Plugin>,
        surface: S,
        storage: Box<dyn SettingsStorage>,
        config: EngineConfig,
    ) -> Result<Self> {
        validate_plugin(plugin.as_ref())?;
        Ok(Self {
            plugin,
            surface,
            registry: ParameterRegistry::new(),
            modulation: ModulationBank::new(),
            drags: DragTracker::new(),
            scheduler: FrameScheduler::new(config.scheduler),
            store: SettingsStore::load(storage, Debouncer::new(config.persist_debounce)),
            clock: None,
            width: 1.0,
            height: 1.0,
            initialized: false,
            destroyed: false,
        })
    }

    /// Size the canvas and initialize the plugin from its defaults and
    /// stored settings.
    pub fn init(&mut self, width: f64, height: f64) {
        if self.destroyed {
            return;
        }
        self.set_size(width, height);
        self.initialize_plugin(ResolveOptions::defaults(), true);
        self.store.set_selected(self.plugin.id());
        self.initialized = true;
        log::info!(
            "initialized {} at {}x{} with {} parameters",
            self.plugin.id(),
            self.width,
            self.height,
            self.registry.len()
        );
    }

    pub fn start(&mut self) {
        if self.destroyed || !self.initialized {
            return;
        }
        if self.scheduler.start() {
            log::info!("started {}", self.plugin.id());
        }
    }

    pub fn stop(&mut self) {
        if self.scheduler.stop() {
            let frame = self.scheduler.frame();
            log::info!("stopped {} at frame {frame}", self.plugin.id());
        }
    }

    /// Restart the plugin's simulation from a blank surface. Parameter values
    /// are kept. Always leaves the engine running.
    pub fn restart(&mut self) {
        if self.destroyed || !self.initialized {
            return;
        }
        self.scheduler.stop();
        self.scheduler.reset_clock();
        self.scheduler.reset_accumulator();
        self.initialize_plugin(ResolveOptions::preserve(), false);
        self.surface.clear();
        let info = self.hook_step();
        self.with_run_context(info, |plugin, ctx| plugin.restart(ctx));
        self.scheduler.start();
        log::info!("restarted {}", self.plugin.id());
    }

    /// Re-resolve definitions for a new canvas size, keeping values.
    pub fn resize(&mut self, width: f64, height: f64) {
        if self.destroyed || !self.initialized {
            return;
        }
        self.set_size(width, height);
        self.initialize_plugin(ResolveOptions::preserve(), false);
        self.scheduler.reset_frame();
        self.surface.clear();
        let info = self.hook_step();
        self.with_run_context(info, |plugin, ctx| plugin.on_resize(ctx));
        if self.scheduler.is_running() {
            self.scheduler.reset_accumulator();
        }
        log::debug!("resized to {}x{}", self.width, self.height);
    }

    /// Flush settings, stop and end every drag. Later calls are no-ops.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        if self.initialized {
            self.record_settings();
        }
        self.store.flush();
        self.scheduler.stop();
        self.end_all_drags();
        self.destroyed = true;
        log::info!("destroyed engine for {}", self.plugin.id());
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Swap in another plugin.
    ///
    /// The outgoing plugin's settings are written immediately. Switching to
    /// the plugin that is already active does nothing.
    pub fn set_plugin(&mut self, plugin: Box<dyn Plugin>, switch: PluginSwitch) -> Result<()> {
        validate_plugin(plugin.as_ref())?;
        if self.destroyed || plugin.id() == self.plugin.id() {
            return Ok(());
        }

        if self.initialized {
            self.record_settings();
        }
        self.store.flush();

        let was_running = self.scheduler.is_running();
        self.scheduler.stop();
        self.end_all_drags();

        let previous = std::mem::replace(&mut self.plugin, plugin);
        self.scheduler.reset_frame();
        self.scheduler.reset_accumulator();
        if switch.clear {
            self.surface.clear();
        }

        if switch.use_defaults {
            let keep = ink_keys();
            self.initialize_plugin(ResolveOptions::defaults_keeping(&keep), true);
        } else {
            self.initialize_plugin(ResolveOptions::preserve(), false);
        }
        self.store.set_selected(self.plugin.id());
        self.initialized = true;
        log::info!("switched plugin {} -> {}", previous.id(), self.plugin.id());

        if was_running {
            self.scheduler.start();
        }
        Ok(())
    }

    /// Put every parameter back to its definition default and switch all
    /// modulation off. The reset is persisted.
    pub fn reset_parameters(&mut self) {
        if self.destroyed || !self.initialized {
            return;
        }
        self.registry.reset_to_defaults();
        self.modulation.reset_speeds();
        self.persist_later();
        log::info!("reset parameters of {}", self.plugin.id());
    }

    /// Scale the step rate. Non-finite and non-positive values are ignored.
    pub fn set_playback_multiplier(&mut self, multiplier: f64) -> bool {
        self.scheduler.set_multiplier(multiplier)
    }

    /// Run whatever steps are owed at `now`: modulation first, then one
    /// plugin step against a fresh snapshot.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        if self.destroyed || !self.initialized {
            return TickReport::default();
        }
        self.clock = Some(now);

        let steps = self.scheduler.advance(now);
        let mut params_changed = false;
        for _ in 0..steps {
            let info = self.scheduler.next_step();
            let drags = &self.drags;
            params_changed |= self
                .modulation
                .apply(info.frame, &mut self.registry, |key| drags.holds_key(key));
            self.with_run_context(info, |plugin, ctx| plugin.run(ctx));
        }
        TickReport {
            steps,
            params_changed,
        }
    }

    /// Write settings once the debounce deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        self.clock = Some(now);
        self.store.poll(now)
    }

    /// Capture and write settings now.
    pub fn flush_settings(&mut self) -> bool {
        if self.initialized {
            self.record_settings();
        }
        self.store.flush()
    }

    pub fn has_pending_write(&self) -> bool {
        self.store.is_pending()
    }

    /// Forget stored settings for every plugin.
    pub fn clear_stored_settings(&mut self) -> Result<()> {
        self.store.clear().map_err(GenSynthError::from)
    }

    pub fn clear_surface(&mut self) {
        self.surface.clear();
    }

    /// Encode the active plugin's values and modulation speeds.
    pub fn share_payload(&self) -> Result<String> {
        let settings = capture_settings(&self.registry, &self.modulation);
        let payload = SharePayload::new(self.plugin.id(), CompactSettings::from(&settings));
        encode_share(&payload)
    }

    /// Apply shared settings to the active plugin.
    ///
    /// Modulation is switched off first, since the compact form leaves out
    /// keys whose speed is off. Unknown or malformed keys are skipped.
    /// Returns the number of values applied.
    pub fn apply_shared_settings(&mut self, settings: &CompactSettings) -> usize {
        if self.destroyed || !self.initialized {
            return 0;
        }
        self.modulation.reset_speeds();
        let settings = PluginSettings::from(settings);
        let applied = apply_settings(&settings, &mut self.registry, &mut self.modulation);
        self.persist_later();
        log::info!("applied {applied} shared values to {}", self.plugin.id());
        applied
    }

    pub fn definitions(&self) -> &[ParameterDefinition] {
        self.registry.definitions()
    }

    pub fn definition(&self, key: &str) -> Option<&ParameterDefinition> {
        self.registry.definition(key)
    }

    pub fn value(&self, key: &str) -> Option<&ParamValue> {
        self.registry.value(key)
    }

    pub fn snapshot(&self) -> ParamSnapshot {
        self.registry.snapshot()
    }

    pub fn modulation(&self, key: &str) -> Option<&ModulationState> {
        self.modulation.state(key)
    }

    pub fn frame(&self) -> u64 {
        self.scheduler.frame()
    }

    pub fn timestamp_ms(&self) -> f64 {
        self.scheduler.timestamp_ms()
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn playback_multiplier(&self) -> f64 {
        self.scheduler.multiplier()
    }

    pub fn plugin_id(&self) -> &str {
        self.plugin.id()
    }

    pub fn plugin_name(&self) -> &str {
        self.plugin.name()
    }

    /// Plugin id remembered by the settings record, if any.
    pub fn stored_selection(&self) -> Option<&str> {
        self.store.selected()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn set_size(&mut self, width: f64, height: f64) {
        self.width = sanitize_dimension(width);
        self.height = sanitize_dimension(height);
    }

    /// Run the plugin's `init`, append the ink block and reconcile values.
    fn initialize_plugin(&mut self, options: ResolveOptions<'_>, apply_stored: bool) {
        let ctx = InitContext::new(self.width, self.height);
        let mut specs = self.plugin.init(&ctx).parameters;
        specs.extend(ink_parameter_specs());

        self.registry.resolve(&specs, &ctx.limits, options);
        self.modulation.normalize(self.registry.definitions());

        if apply_stored {
            if let Some(settings) = self.store.plugin(self.plugin.id()).cloned() {
                let applied = apply_settings(&settings, &mut self.registry, &mut self.modulation);
                log::debug!("restored {applied} stored values for {}", self.plugin.id());
            }
        }
    }

    /// Clock values handed to lifecycle hooks.
    fn hook_step(&self) -> StepInfo {
        StepInfo {
            frame: self.scheduler.frame(),
            timestamp_ms: self.scheduler.timestamp_ms(),
            delta_ms: 0.0,
        }
    }

    fn with_run_context(
        &mut self,
        info: StepInfo,
        f: impl FnOnce(&mut dyn Plugin, &mut RunContext<'_>),
    ) {
        let params = self.registry.snapshot();
        let mut ctx = RunContext {
            surface: &mut self.surface,
            width: self.width,
            height: self.height,
            frame: info.frame,
            delta_ms: info.delta_ms,
            timestamp_ms: info.timestamp_ms,
            params: &params,
        };
        f(self.plugin.as_mut(), &mut ctx);
    }

    fn record_settings(&mut self) {
        let settings = capture_settings(&self.registry, &self.modulation);
        self.store.record(self.plugin.id(), settings);
    }

    /// Record the active plugin's settings and schedule a debounced write,
    /// timed from the host's clock.
    fn persist_later(&mut self) {
        self.record_settings();
        self.store.schedule(self.clock);
    }

    fn end_all_drags(&mut self) {
        let ended = self.drags.clear();
        if !ended.is_empty() {
            log::trace!("ended {} drag sessions", ended.len());
        }
        self.modulation.release_all();
    }
}

impl<S: Surface> std::fmt::Debug for Engine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("plugin", &self.plugin.id())
            .field("size", &(self.width, self.height))
            .field("frame", &self.scheduler.frame())
            .field("running", &self.scheduler.is_running())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

/// Canvas dimensions are at least one pixel.
fn sanitize_dimension(value: f64) -> f64 {
    if value.is_finite() {
        value.max(1.0)
    } else {
        1.0
    }
}
