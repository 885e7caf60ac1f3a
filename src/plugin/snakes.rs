//! Snakes: a ribbon steered by value noise that wraps around the canvas.
//!
//! The head position, heading and noise offsets are plugin-owned state. They
//! are re-seeded on `init`, `restart` and `on_resize`.

use std::f64::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::ink::InkStyle;
use super::surface::{Hsla, Point};
use super::{InitContext, Plugin, PluginSetup, RunContext};
use crate::noise::{noise1, noise2};
use crate::param::ParamSpec;

const DIRECTION_NOISE_SCALE: f64 = 0.003;
const DRIFT_NOISE_SPEED: f64 = 0.01;
const DRIFT_RATIO: f64 = 0.25;
const WRAP_MARGIN: f64 = 40.0;
const OFFSET_RANGE: f64 = 100_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct SnakeState {
    x: f64,
    y: f64,
    theta: f64,
    t: f64,
    dir_offset_x: f64,
    dir_offset_y: f64,
    drift_offset: f64,
}

impl SnakeState {
    fn spawn(rng: &mut ChaCha8Rng, width: f64, height: f64) -> Self {
        Self {
            x: width * 0.5,
            y: height * 0.5,
            theta: rng.gen_range(0.0..TAU),
            t: rng.gen_range(0.0..OFFSET_RANGE),
            dir_offset_x: rng.gen_range(0.0..OFFSET_RANGE),
            dir_offset_y: rng.gen_range(0.0..OFFSET_RANGE),
            drift_offset: rng.gen_range(0.0..OFFSET_RANGE),
        }
    }

    fn is_valid(&self) -> bool {
        [
            self.x,
            self.y,
            self.theta,
            self.t,
            self.dir_offset_x,
            self.dir_offset_y,
            self.drift_offset,
        ]
        .iter()
        .all(|value| value.is_finite())
    }
}

/// Jump to the opposite side once a coordinate leaves `[-margin, max + margin]`.
fn wrap(value: f64, max: f64, margin: f64) -> f64 {
    if value < -margin {
        max + margin
    } else if value > max + margin {
        -margin
    } else {
        value
    }
}

pub struct SnakesPlugin {
    seed: u64,
    rng: ChaCha8Rng,
    state: Option<SnakeState>,
}

impl SnakesPlugin {
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            state: None,
        }
    }

    fn respawn(&mut self, width: f64, height: f64) {
        self.state = Some(SnakeState::spawn(&mut self.rng, width, height));
    }

    /// Current head position, if the snake has been spawned.
    pub fn head(&self) -> Option<Point> {
        self.state.map(|state| Point::new(state.x, state.y))
    }
}

impl Default for SnakesPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for SnakesPlugin {
    fn id(&self) -> &str {
        "snakes"
    }

    fn name(&self) -> &str {
        "Snakes"
    }

    fn init(&mut self, ctx: &InitContext) -> PluginSetup {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.respawn(ctx.width, ctx.height);

        let parameters = vec![
            ParamSpec::range("speed", 1.0, 10.0)
                .label("Speed (Step)")
                .step(0.1)
                .default_value(5.0),
            ParamSpec::range("turnRate", 0.0001, 0.1)
                .label("Turn Rate")
                .step(0.0001)
                .default_value(0.01),
            ParamSpec::range("width", 1.0, 50.0)
                .label("Width (Spacing)")
                .step(1.0)
                .default_value(5.0),
            ParamSpec::range("stripeProbability", 0.0, 1.0)
                .label("Stripe Probability")
                .step(0.01)
                .default_value(0.5),
        ];
        PluginSetup { parameters }
    }

    fn run(&mut self, ctx: &mut RunContext<'_>) {
        let mut state = match self.state {
            Some(state) if state.is_valid() => state,
            _ => SnakeState::spawn(&mut self.rng, ctx.width, ctx.height),
        };

        let params = ctx.params;
        let step = params.number_or("speed", 0.0).max(0.0);
        if !(step > 0.0) {
            self.state = Some(state);
            return;
        }
        let turn_rate = params.number_or("turnRate", 0.0).max(0.0);
        let half_spacing = params.number_or("width", 0.0).max(0.0) * 0.5;
        let stripe_probability = params.number_or("stripeProbability", 0.0).clamp(0.0, 1.0);

        let direction = noise2(
            state.x * DIRECTION_NOISE_SCALE + state.dir_offset_x,
            state.y * DIRECTION_NOISE_SCALE + state.dir_offset_y,
        );
        let wobble = (direction * 2.0 - 1.0) * turn_rate;
        let drift = (noise1(state.t * DRIFT_NOISE_SPEED + state.drift_offset) * 2.0 - 1.0)
            * turn_rate
            * DRIFT_RATIO;
        state.theta += wobble + drift;

        let (sin, cos) = state.theta.sin_cos();
        let next_x = state.x + cos * step;
        let next_y = state.y + sin * step;
        let (perp_x, perp_y) = (-sin * half_spacing, cos * half_spacing);

        let a1 = Point::new(state.x + perp_x, state.y + perp_y);
        let a2 = Point::new(next_x + perp_x, next_y + perp_y);
        let b1 = Point::new(state.x - perp_x, state.y - perp_y);
        let b2 = Point::new(next_x - perp_x, next_y - perp_y);

        // knock out what the ribbon passes over
        ctx.surface.fill_polygon(&[a1, a2, b2, b1], Hsla::WHITE);

        let stroke = InkStyle::from_snapshot(params).stroke();
        ctx.surface.stroke_line(a1, a2, &stroke);
        ctx.surface.stroke_line(b1, b2, &stroke);
        if stripe_probability >= 1.0 || self.rng.gen::<f64>() < stripe_probability {
            ctx.surface.stroke_line(a2, b2, &stroke);
        }

        state.x = wrap(next_x, ctx.width, WRAP_MARGIN);
        state.y = wrap(next_y, ctx.height, WRAP_MARGIN);
        state.t += 1.0;
        self.state = Some(state);
    }

    fn restart(&mut self, ctx: &mut RunContext<'_>) {
        self.respawn(ctx.width, ctx.height);
    }

    fn on_resize(&mut self, ctx: &mut RunContext<'_>) {
        self.respawn(ctx.width, ctx.height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{
        LimitContext, ParamSnapshot, ParameterRegistry, ResolveOptions, SnapshotValue,
    };
    use crate::plugin::surface::{DrawCommand, RecordingSurface};

    fn snapshot_for(plugin: &mut SnakesPlugin, width: f64, height: f64) -> ParamSnapshot {
        let setup = plugin.init(&InitContext::new(width, height));
        let mut registry = ParameterRegistry::new();
        registry.resolve(
            &setup.parameters,
            &LimitContext::from_size(width, height),
            ResolveOptions::defaults(),
        );
        registry.snapshot()
    }

    fn step(plugin: &mut SnakesPlugin, surface: &mut RecordingSurface, params: &ParamSnapshot) {
        plugin.run(&mut RunContext {
            surface,
            width: 300.0,
            height: 200.0,
            frame: 0,
            delta_ms: 200.0,
            timestamp_ms: 0.0,
            params,
        });
    }

    #[test]
    fn wrap_jumps_past_margin() {
        assert_eq!(wrap(-41.0, 100.0, 40.0), 140.0);
        assert_eq!(wrap(141.0, 100.0, 40.0), -40.0);
        assert_eq!(wrap(50.0, 100.0, 40.0), 50.0);
    }

    #[test]
    fn spawns_at_canvas_center() {
        let mut plugin = SnakesPlugin::with_seed(9);
        plugin.init(&InitContext::new(300.0, 200.0));
        assert_eq!(plugin.head(), Some(Point::new(150.0, 100.0)));
    }

    #[test]
    fn head_advances_by_speed() {
        let mut plugin = SnakesPlugin::with_seed(9);
        let params = snapshot_for(&mut plugin, 300.0, 200.0);
        let mut surface = RecordingSurface::new();
        step(&mut plugin, &mut surface, &params);
        let head = plugin.head().unwrap();
        let moved = (head.x - 150.0).hypot(head.y - 100.0);
        assert!((moved - 5.0).abs() < 1e-9);
        assert!(matches!(surface.commands[0], DrawCommand::Polygon { .. }));
    }

    #[test]
    fn certain_stripes_close_each_segment() {
        let mut plugin = SnakesPlugin::with_seed(9);
        let mut params = snapshot_for(&mut plugin, 300.0, 200.0);
        params.insert("stripeProbability", SnapshotValue::Number(1.0));
        let mut surface = RecordingSurface::new();
        step(&mut plugin, &mut surface, &params);
        // polygon + two rails + stripe
        assert_eq!(surface.commands.len(), 4);
    }

    #[test]
    fn zero_speed_draws_nothing() {
        let mut plugin = SnakesPlugin::with_seed(9);
        let mut params = snapshot_for(&mut plugin, 300.0, 200.0);
        params.insert("speed", SnapshotValue::Number(0.0));
        let mut surface = RecordingSurface::new();
        step(&mut plugin, &mut surface, &params);
        assert!(surface.commands.is_empty());
    }

    #[test]
    fn restart_returns_head_to_center() {
        let mut plugin = SnakesPlugin::with_seed(9);
        let params = snapshot_for(&mut plugin, 300.0, 200.0);
        let mut surface = RecordingSurface::new();
        for _ in 0..5 {
            step(&mut plugin, &mut surface, &params);
        }
        plugin.restart(&mut RunContext {
            surface: &mut surface,
            width: 300.0,
            height: 200.0,
            frame: 0,
            delta_ms: 0.0,
            timestamp_ms: 0.0,
            params: &params,
        });
        assert_eq!(plugin.head(), Some(Point::new(150.0, 100.0)));
    }
}
