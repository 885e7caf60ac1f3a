//! Fixed-step frame scheduler.
//!
//! The host calls [`FrameScheduler::advance`] once per display callback with
//! the current instant. Elapsed wall time is converted into whole plugin steps
//! at `steps_per_second * multiplier`; the fractional remainder carries over
//! so long sessions do not drift. A per-callback cap bounds catch-up after a
//! stall.

use std::time::Instant;

/// Base step rate before the playback multiplier.
pub const BASE_STEPS_PER_SECOND: f64 = 5.0;

/// Upper bound on steps drained in one callback.
pub const MAX_STEPS_PER_TICK: usize = 120;

/// Tunables for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerConfig {
    pub steps_per_second: f64,
    pub max_steps_per_tick: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            steps_per_second: BASE_STEPS_PER_SECOND,
            max_steps_per_tick: MAX_STEPS_PER_TICK,
        }
    }
}

/// Run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Running,
}

/// Logical clock values for one plugin step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepInfo {
    /// Frame counter before this step.
    pub frame: u64,
    /// Logical timestamp after this step, in milliseconds.
    pub timestamp_ms: f64,
    /// Duration of one step at the current rate.
    pub delta_ms: f64,
}

/// Accumulator-driven step clock.
#[derive(Debug)]
pub struct FrameScheduler {
    config: SchedulerConfig,
    state: RunState,
    multiplier: f64,
    /// Steps owed, in step units so a rate change keeps partial progress.
    pending: f64,
    last_tick: Option<Instant>,
    frame: u64,
    timestamp_ms: f64,
}

impl FrameScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let rate = config.steps_per_second;
        let config = SchedulerConfig {
            steps_per_second: if rate > 0.0 && rate.is_finite() {
                rate
            } else {
                BASE_STEPS_PER_SECOND
            },
            max_steps_per_tick: config.max_steps_per_tick.max(1),
        };
        Self {
            config,
            state: RunState::Stopped,
            multiplier: 1.0,
            pending: 0.0,
            last_tick: None,
            frame: 0,
            timestamp_ms: 0.0,
        }
    }

    /// Begin running with one step owed. No-op when already running.
    ///
    /// The next [`advance`](Self::advance) anchors the wall clock, so the
    /// first callback after a start always yields exactly one step.
    pub fn start(&mut self) -> bool {
        if self.state == RunState::Running {
            return false;
        }
        self.state = RunState::Running;
        self.pending = 1.0;
        self.last_tick = None;
        true
    }

    /// Stop running. Logical frame and timestamp are kept.
    pub fn stop(&mut self) -> bool {
        if self.state == RunState::Stopped {
            return false;
        }
        self.state = RunState::Stopped;
        self.last_tick = None;
        true
    }

    /// Owe exactly one step and re-anchor the wall clock.
    pub fn reset_accumulator(&mut self) {
        self.pending = 1.0;
        self.last_tick = None;
    }

    /// Zero the frame counter and logical timestamp.
    pub fn reset_clock(&mut self) {
        self.frame = 0;
        self.timestamp_ms = 0.0;
    }

    pub fn reset_frame(&mut self) {
        self.frame = 0;
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn timestamp_ms(&self) -> f64 {
        self.timestamp_ms
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn pending(&self) -> f64 {
        self.pending
    }

    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    /// Change the playback multiplier.
    ///
    /// Non-finite and non-positive values are ignored. Partial progress
    /// toward the next step is kept.
    pub fn set_multiplier(&mut self, multiplier: f64) -> bool {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return false;
        }
        self.multiplier = multiplier;
        true
    }

    /// Effective steps per second.
    pub fn steps_per_second(&self) -> f64 {
        self.config.steps_per_second * self.multiplier
    }

    /// Duration of one step in milliseconds.
    pub fn step_interval_ms(&self) -> f64 {
        1000.0 / self.steps_per_second()
    }

    /// Account for wall time up to `now` and return the number of steps to run.
    ///
    /// The caller must call [`next_step`](Self::next_step) once per returned step.
    /// When the cap is hit the backlog collapses to at most one step.
    pub fn advance(&mut self, now: Instant) -> usize {
        if self.state == RunState::Stopped {
            return 0;
        }

        let last = *self.last_tick.get_or_insert(now);
        let elapsed = now.saturating_duration_since(last).as_secs_f64();
        self.last_tick = Some(now);
        self.pending += elapsed * self.steps_per_second();

        let cap = self.config.max_steps_per_tick;
        let steps = (self.pending.floor().max(0.0) as usize).min(cap);
        self.pending -= steps as f64;

        if steps == cap && self.pending > 1.0 {
            log::debug!(
                "step cap of {cap} reached, dropping {:.1} owed steps",
                self.pending - 1.0
            );
            self.pending = 1.0;
        }
        steps
    }

    /// Advance the logical clock by one step.
    pub fn next_step(&mut self) -> StepInfo {
        let delta_ms = self.step_interval_ms();
        self.timestamp_ms += delta_ms;
        let info = StepInfo {
            frame: self.frame,
            timestamp_ms: self.timestamp_ms,
            delta_ms,
        };
        self.frame += 1;
        info
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::time::Duration;

    fn drain(scheduler: &mut FrameScheduler, now: Instant) -> usize {
        let steps = scheduler.advance(now);
        for _ in 0..steps {
            scheduler.next_step();
        }
        steps
    }

    #[test]
    fn stopped_scheduler_yields_nothing() {
        let mut s = FrameScheduler::default();
        assert_eq!(s.advance(Instant::now()), 0);
        assert!(!s.is_running());
    }

    #[test]
    fn first_tick_after_start_runs_one_step() {
        let mut s = FrameScheduler::default();
        let t0 = Instant::now();
        assert!(s.start());
        assert!(!s.start());
        assert_eq!(drain(&mut s, t0), 1);
        assert_eq!(s.frame(), 1);
    }

    #[test]
    fn one_second_at_base_rate_runs_five_steps() {
        let mut s = FrameScheduler::default();
        let t0 = Instant::now();
        s.start();
        drain(&mut s, t0);
        assert_eq!(drain(&mut s, t0 + Duration::from_millis(1000)), 5);
        assert!(s.pending() < 1.0);
    }

    #[test]
    fn fractional_progress_accumulates() {
        let mut s = FrameScheduler::default();
        let t0 = Instant::now();
        s.start();
        drain(&mut s, t0);
        // 100ms at 5/s is half a step
        assert_eq!(drain(&mut s, t0 + Duration::from_millis(100)), 0);
        assert_eq!(drain(&mut s, t0 + Duration::from_millis(200)), 1);
    }

    #[test]
    fn cap_bounds_steps_and_collapses_backlog() {
        let mut s = FrameScheduler::default();
        let t0 = Instant::now();
        s.start();
        drain(&mut s, t0);
        let steps = drain(&mut s, t0 + Duration::from_secs(3600));
        assert_eq!(steps, MAX_STEPS_PER_TICK);
        assert!(s.pending() <= 1.0);
    }

    #[test]
    fn multiplier_scales_rate() {
        let mut s = FrameScheduler::default();
        let t0 = Instant::now();
        s.start();
        drain(&mut s, t0);
        assert!(s.set_multiplier(4.0));
        assert_eq!(drain(&mut s, t0 + Duration::from_millis(1000)), 20);
        assert_approx_eq!(s.step_interval_ms(), 50.0, 1e-9);
    }

    #[test]
    fn invalid_multipliers_are_ignored() {
        let mut s = FrameScheduler::default();
        assert!(!s.set_multiplier(0.0));
        assert!(!s.set_multiplier(-2.0));
        assert!(!s.set_multiplier(f64::NAN));
        assert!(!s.set_multiplier(f64::INFINITY));
        assert_eq!(s.multiplier(), 1.0);
    }

    #[test]
    fn multiplier_change_keeps_partial_progress() {
        let mut s = FrameScheduler::default();
        let t0 = Instant::now();
        s.start();
        drain(&mut s, t0);
        drain(&mut s, t0 + Duration::from_millis(100));
        let before = s.pending();
        s.set_multiplier(2.0);
        assert_eq!(s.pending(), before);
    }

    #[test]
    fn stop_keeps_logical_clock() {
        let mut s = FrameScheduler::default();
        let t0 = Instant::now();
        s.start();
        drain(&mut s, t0);
        drain(&mut s, t0 + Duration::from_millis(400));
        let frame = s.frame();
        let ts = s.timestamp_ms();
        s.stop();
        assert_eq!(s.frame(), frame);
        assert_eq!(s.timestamp_ms(), ts);
        assert_eq!(s.advance(t0 + Duration::from_secs(5)), 0);
    }

    #[test]
    fn resume_does_not_replay_stopped_time() {
        let mut s = FrameScheduler::default();
        let t0 = Instant::now();
        s.start();
        drain(&mut s, t0);
        s.stop();
        s.start();
        assert_eq!(drain(&mut s, t0 + Duration::from_secs(60)), 1);
    }

    #[test]
    fn logical_timestamp_advances_by_step_interval() {
        let mut s = FrameScheduler::default();
        s.start();
        let info = s.next_step();
        assert_eq!(info.frame, 0);
        assert!((info.delta_ms - 200.0).abs() < 1e-9);
        assert_approx_eq!(info.timestamp_ms, 200.0, 1e-9);
        s.reset_clock();
        assert_eq!(s.frame(), 0);
        assert_eq!(s.timestamp_ms(), 0.0);
    }

    #[test]
    fn backwards_clock_counts_as_zero_elapsed() {
        let mut s = FrameScheduler::default();
        let t1 = Instant::now() + Duration::from_secs(10);
        s.start();
        drain(&mut s, t1);
        assert_eq!(drain(&mut s, t1 - Duration::from_secs(5)), 0);
    }

    #[test]
    fn long_sessions_do_not_drift() {
        let mut s = FrameScheduler::default();
        let t0 = Instant::now();
        s.start();
        drain(&mut s, t0);
        let mut total = 0;
        for i in 1..=10_000u64 {
            total += drain(&mut s, t0 + Duration::from_micros(i * 16_667));
        }
        // 166.67s at 5/s
        let expected = (10_000.0 * 0.016_667 * 5.0_f64).floor() as i64;
        let drift = (total as i64 - expected).abs();
        assert!(drift <= 1, "got {total}, expected ~{expected}");
    }
}
