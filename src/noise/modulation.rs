//! Noise self-modulation of range parameters.
//!
//! Every range definition that allows modulation owns a [`ModulationState`]:
//! a speed level indexing [`NOISE_SPEEDS`] (level 0 is off) and a phase domain
//! that offsets it into the shared noise input space. Each scheduler step
//! samples `noise1(frame * speed + domain)` and maps it into the value's
//! `[min, max]` interval. Only `current` is ever written.

use std::collections::{HashMap, HashSet};

use super::noise1;
use crate::param::{clamp, ParameterDefinition, ParameterRegistry};

/// Noise speeds per level. Index 0 disables modulation.
pub const NOISE_SPEEDS: [f64; 6] = [0.0, 0.001, 0.005, 0.01, 0.1, 0.5];

/// Number of non-off levels.
pub const MODULATION_LEVELS: usize = NOISE_SPEEDS.len() - 1;

/// Spacing between successive phase domains.
pub const PHASE_DOMAIN_STEP: f64 = 127.91831;

/// Smallest change of `current` that counts as visible.
pub const MODULATION_EPSILON: f64 = 1e-6;

/// Wrap any integer level into the speed table.
pub fn normalize_speed_level(level: i64) -> usize {
    let len = NOISE_SPEEDS.len() as i64;
    level.rem_euclid(len) as usize
}

/// Per-parameter modulation settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModulationState {
    pub speed_level: usize,
    pub phase_domain: f64,
}

impl ModulationState {
    /// Noise speed for the current level.
    pub fn speed(&self) -> f64 {
        NOISE_SPEEDS[self.speed_level % NOISE_SPEEDS.len()]
    }

    pub fn is_active(&self) -> bool {
        self.speed() > 0.0
    }
}

/// All modulation states of the active plugin.
#[derive(Debug, Clone)]
pub struct ModulationBank {
    states: HashMap<String, ModulationState>,
    next_domain_seed: u64,
    current_drags: usize,
}

impl Default for ModulationBank {
    fn default() -> Self {
        Self {
            states: HashMap::new(),
            next_domain_seed: 1,
            current_drags: 0,
        }
    }
}

impl ModulationBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the next phase domain from the monotonically increasing counter.
    fn allocate_domain(&mut self) -> f64 {
        let domain = self.next_domain_seed as f64 * PHASE_DOMAIN_STEP;
        self.next_domain_seed += 1;
        domain
    }

    /// Rebuild the state set for `definitions`.
    ///
    /// Existing keys keep their speed level and, when still unique, their
    /// domain. New keys start switched off. Keys that no longer allow
    /// modulation are pruned.
    pub fn normalize(&mut self, definitions: &[ParameterDefinition]) {
        let mut next = HashMap::with_capacity(definitions.len());
        let mut claimed = HashSet::new();

        for definition in definitions.iter().filter(|def| def.allows_modulation()) {
            let existing = self.states.get(&definition.key).copied();
            let speed_level = existing.map_or(0, |state| state.speed_level % NOISE_SPEEDS.len());
            let mut phase_domain = match existing {
                Some(state) if state.phase_domain.is_finite() => state.phase_domain,
                _ => self.allocate_domain(),
            };
            while claimed.contains(&phase_domain.to_bits()) {
                phase_domain = self.allocate_domain();
            }
            claimed.insert(phase_domain.to_bits());
            next.insert(
                definition.key.clone(),
                ModulationState {
                    speed_level,
                    phase_domain,
                },
            );
        }

        self.states = next;
    }

    /// Drop every state. Domains keep counting up.
    pub fn clear(&mut self) {
        self.states.clear();
    }

    pub fn state(&self, key: &str) -> Option<&ModulationState> {
        self.states.get(key)
    }

    /// Speed level for `key`, 0 when it has no state.
    pub fn speed_level(&self, key: &str) -> usize {
        self.states.get(key).map_or(0, |state| state.speed_level)
    }

    /// Advance the speed level of a modulatable definition circularly.
    ///
    /// Returns the new level, or `None` when the definition does not allow
    /// modulation.
    pub fn cycle_speed(&mut self, definition: &ParameterDefinition) -> Option<usize> {
        if !definition.allows_modulation() {
            return None;
        }
        if !self.states.contains_key(&definition.key) {
            let phase_domain = self.allocate_domain();
            self.states.insert(
                definition.key.clone(),
                ModulationState {
                    speed_level: 0,
                    phase_domain,
                },
            );
        }
        let state = self.states.get_mut(&definition.key)?;
        state.speed_level = normalize_speed_level(state.speed_level as i64 + 1);
        Some(state.speed_level)
    }

    /// Set the level of an existing state. Out-of-table levels wrap.
    pub fn set_speed_level(&mut self, key: &str, level: i64) -> bool {
        match self.states.get_mut(key) {
            Some(state) => {
                state.speed_level = normalize_speed_level(level);
                true
            }
            None => false,
        }
    }

    /// Switch every state off.
    pub fn reset_speeds(&mut self) {
        for state in self.states.values_mut() {
            state.speed_level = 0;
        }
    }

    /// `(key, level)` pairs, sorted by key.
    pub fn speed_levels(&self) -> Vec<(String, usize)> {
        let mut levels: Vec<_> = self
            .states
            .iter()
            .map(|(key, state)| (key.clone(), state.speed_level))
            .collect();
        levels.sort();
        levels
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Register a `current`-handle drag. Reentrant.
    pub fn suspend(&mut self) {
        self.current_drags += 1;
    }

    /// Release one `current`-handle drag.
    pub fn resume(&mut self) {
        self.current_drags = self.current_drags.saturating_sub(1);
    }

    pub fn is_suspended(&self) -> bool {
        self.current_drags > 0
    }

    /// Drop all suspensions, used when every drag session is torn down at once.
    pub fn release_all(&mut self) {
        self.current_drags = 0;
    }

    /// Apply one step of modulation at `frame`.
    ///
    /// Keys for which `is_held` returns true are skipped. Returns whether any
    /// `current` moved by more than [`MODULATION_EPSILON`].
    pub fn apply(
        &self,
        frame: u64,
        registry: &mut ParameterRegistry,
        is_held: impl Fn(&str) -> bool,
    ) -> bool {
        if self.is_suspended() {
            return false;
        }

        let mut updates = Vec::new();
        for definition in registry.definitions() {
            if !definition.allows_modulation() || is_held(&definition.key) {
                continue;
            }
            let Some(state) = self.states.get(&definition.key) else {
                continue;
            };
            let speed = state.speed();
            if !(speed > 0.0) {
                continue;
            }
            let Some(value) = registry.range_value(&definition.key) else {
                continue;
            };

            let sample = noise1(frame as f64 * speed + state.phase_domain);
            let span = value.max - value.min;
            let next = clamp(value.min + span * sample, value.min, value.max);
            if (next - value.current).abs() > MODULATION_EPSILON {
                updates.push((definition.key.clone(), next));
            }
        }

        let changed = !updates.is_empty();
        for (key, current) in updates {
            registry.set_range_current(&key, current);
        }
        changed
    }
}
