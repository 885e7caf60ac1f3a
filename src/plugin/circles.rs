//! Circles: random outlines scattered around and past the canvas edges.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::ink::InkStyle;
use super::surface::Point;
use super::{InitContext, Plugin, PluginSetup, RunContext};
use crate::param::{Bound, ParamSpec};

const CIRCLES_PER_STEP: usize = 3;

pub struct CirclesPlugin {
    seed: u64,
    rng: ChaCha8Rng,
}

impl CirclesPlugin {
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Coordinate within `[-r/2, dimension + r/2]`.
    fn around(&mut self, dimension: f64, radius: f64) -> f64 {
        let offset = radius * 0.5;
        self.rng.gen_range(-offset..=dimension + offset)
    }
}

impl Default for CirclesPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for CirclesPlugin {
    fn id(&self) -> &str {
        "circles"
    }

    fn name(&self) -> &str {
        "Circles"
    }

    fn init(&mut self, _ctx: &InitContext) -> PluginSetup {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        let parameters = vec![ParamSpec::range("radius", 0.0, Bound::dynamic(|l| l.max_dim))
            .label("Radius")
            .step(1.0)
            .default_value(Bound::dynamic(|l| (l.max_dim * 0.25).round()))];
        PluginSetup { parameters }
    }

    fn run(&mut self, ctx: &mut RunContext<'_>) {
        let radius = ctx.params.number_or("radius", 0.0).max(0.0);
        let stroke = InkStyle::from_snapshot(ctx.params).stroke();

        for _ in 0..CIRCLES_PER_STEP {
            let x = self.around(ctx.width, radius);
            let y = self.around(ctx.height, radius);
            ctx.surface.stroke_circle(Point::new(x, y), radius, &stroke);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{LimitContext, ParameterRegistry, ResolveOptions};
    use crate::plugin::surface::{DrawCommand, RecordingSurface};

    fn run_once(plugin: &mut CirclesPlugin, width: f64, height: f64) -> RecordingSurface {
        let setup = plugin.init(&InitContext::new(width, height));
        let mut registry = ParameterRegistry::new();
        registry.resolve(
            &setup.parameters,
            &LimitContext::from_size(width, height),
            ResolveOptions::defaults(),
        );
        let snapshot = registry.snapshot();
        let mut surface = RecordingSurface::new();
        let mut ctx = RunContext {
            surface: &mut surface,
            width,
            height,
            frame: 0,
            delta_ms: 200.0,
            timestamp_ms: 200.0,
            params: &snapshot,
        };
        plugin.run(&mut ctx);
        surface
    }

    #[test]
    fn radius_bound_follows_canvas() {
        let mut plugin = CirclesPlugin::with_seed(7);
        let setup = plugin.init(&InitContext::new(400.0, 200.0));
        let mut registry = ParameterRegistry::new();
        registry.resolve(
            &setup.parameters,
            &LimitContext::from_size(400.0, 200.0),
            ResolveOptions::defaults(),
        );
        let radius = registry.definition("radius").unwrap();
        assert_eq!(radius.max, 400.0);
        assert_eq!(registry.range_value("radius").unwrap().current, 100.0);
    }

    #[test]
    fn draws_three_circles_near_canvas() {
        let mut plugin = CirclesPlugin::with_seed(7);
        let surface = run_once(&mut plugin, 400.0, 200.0);
        assert_eq!(surface.draw_calls(), CIRCLES_PER_STEP);
        for command in &surface.commands {
            if let DrawCommand::Circle { center, radius, .. } = command {
                assert_eq!(*radius, 100.0);
                assert!(center.x >= -50.0 && center.x <= 450.0);
                assert!(center.y >= -50.0 && center.y <= 250.0);
            }
        }
    }

    #[test]
    fn same_seed_draws_the_same_circles() {
        let a = run_once(&mut CirclesPlugin::with_seed(42), 300.0, 300.0);
        let b = run_once(&mut CirclesPlugin::with_seed(42), 300.0, 300.0);
        assert_eq!(a.commands, b.commands);
    }
}
