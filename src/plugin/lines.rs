//! Lines: short segments whose placement density ramps linearly along a
//! direction across the canvas.

use std::f64::consts::{PI, TAU};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::ink::InkStyle;
use super::surface::Point;
use super::{InitContext, Plugin, PluginSetup, RunContext};
use crate::param::ParamSpec;

const LINES_PER_STEP: usize = 10;

/// Sample `t` in `[0, 1]` with density rising linearly from `start` to `end`.
///
/// Inverts the CDF of the trapezoid; flat or empty densities sample uniformly.
pub fn weighted_unit_sample(start: f64, end: f64, u: f64) -> f64 {
    let start = start.max(0.0);
    let end = end.max(0.0);
    if start <= 0.0 && end <= 0.0 {
        return u;
    }
    let delta = end - start;
    if delta.abs() < 1e-9 {
        return u;
    }

    let area = (start + end) * 0.5;
    let a = 0.5 * delta;
    let b = start;
    let c = -u * area;
    let discriminant = (b * b - 4.0 * a * c).max(0.0);
    ((-b + discriminant.sqrt()) / (2.0 * a)).clamp(0.0, 1.0)
}

pub struct LinesPlugin {
    seed: u64,
    rng: ChaCha8Rng,
}

impl LinesPlugin {
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Default for LinesPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for LinesPlugin {
    fn id(&self) -> &str {
        "lines"
    }

    fn name(&self) -> &str {
        "Lines"
    }

    fn init(&mut self, _ctx: &InitContext) -> PluginSetup {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        let parameters = vec![
            ParamSpec::range("lineLength", 0.0, 1000.0)
                .label("Line Length")
                .step(1.0)
                .default_value(100.0),
            ParamSpec::range("startDensity", 0.0, 100.0)
                .label("Start Density")
                .step(1.0)
                .default_value(0.0)
                .fixed_bounds(),
            ParamSpec::range("endDensity", 0.0, 100.0)
                .label("End Density")
                .step(1.0)
                .default_value(100.0)
                .fixed_bounds(),
            ParamSpec::range("densityDirection", 0.0, 360.0)
                .label("Density Direction")
                .step(1.0)
                .default_value(180.0)
                .fixed_bounds(),
        ];
        PluginSetup { parameters }
    }

    fn run(&mut self, ctx: &mut RunContext<'_>) {
        let params = ctx.params;
        let line_length = params.number_or("lineLength", 0.0).max(0.0);
        let start_density = params.number_or("startDensity", 0.0);
        let end_density = params.number_or("endDensity", 0.0);
        let direction = params.number_or("densityDirection", 0.0).rem_euclid(360.0) * PI / 180.0;
        let stroke = InkStyle::from_snapshot(params).stroke();

        let (axis_y, axis_x) = direction.sin_cos();
        let (perp_x, perp_y) = (-axis_y, axis_x);
        let center = Point::new(ctx.width * 0.5, ctx.height * 0.5);
        let half_axis = ctx.width.hypot(ctx.height) * 0.5;
        let half_length = line_length * 0.5;

        for _ in 0..LINES_PER_STEP {
            let t = weighted_unit_sample(start_density, end_density, self.rng.gen::<f64>());
            let along = (t * 2.0 - 1.0) * half_axis;
            let across = self.rng.gen_range(-half_axis..=half_axis);
            let mid_x = center.x + axis_x * along + perp_x * across;
            let mid_y = center.y + axis_y * along + perp_y * across;

            let (dy, dx) = self.rng.gen_range(0.0..TAU).sin_cos();
            let (dx, dy) = (dx * half_length, dy * half_length);
            ctx.surface.stroke_line(
                Point::new(mid_x - dx, mid_y - dy),
                Point::new(mid_x + dx, mid_y + dy),
                &stroke,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{LimitContext, ParameterRegistry, ResolveOptions};
    use crate::plugin::surface::RecordingSurface;

    #[test]
    fn uniform_when_flat_or_empty() {
        assert_eq!(weighted_unit_sample(0.0, 0.0, 0.3), 0.3);
        assert_eq!(weighted_unit_sample(50.0, 50.0, 0.7), 0.7);
    }

    #[test]
    fn sample_is_monotonic_and_bounded() {
        let mut previous = 0.0;
        for i in 0..=100 {
            let u = i as f64 / 100.0;
            let t = weighted_unit_sample(0.0, 100.0, u);
            assert!((0.0..=1.0).contains(&t));
            assert!(t >= previous - 1e-12);
            previous = t;
        }
    }

    #[test]
    fn rising_density_skews_samples_late() {
        // CDF of density 2t is t², so the median sits at sqrt(0.5)
        let t = weighted_unit_sample(0.0, 100.0, 0.5);
        assert!((t - 0.5_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn density_parameters_forbid_modulation() {
        let mut plugin = LinesPlugin::with_seed(1);
        let setup = plugin.init(&InitContext::new(100.0, 100.0));
        let mut registry = ParameterRegistry::new();
        registry.resolve(
            &setup.parameters,
            &LimitContext::from_size(100.0, 100.0),
            ResolveOptions::defaults(),
        );
        let line_length = registry.definition("lineLength").unwrap();
        assert!(line_length.allows_modulation());
        for key in ["startDensity", "endDensity", "densityDirection"] {
            assert!(!registry.definition(key).unwrap().allows_modulation());
        }
    }

    #[test]
    fn draws_ten_lines_per_step() {
        let mut plugin = LinesPlugin::with_seed(3);
        let setup = plugin.init(&InitContext::new(200.0, 100.0));
        let mut registry = ParameterRegistry::new();
        registry.resolve(
            &setup.parameters,
            &LimitContext::from_size(200.0, 100.0),
            ResolveOptions::defaults(),
        );
        let snapshot = registry.snapshot();
        let mut surface = RecordingSurface::new();
        plugin.run(&mut RunContext {
            surface: &mut surface,
            width: 200.0,
            height: 100.0,
            frame: 0,
            delta_ms: 200.0,
            timestamp_ms: 200.0,
            params: &snapshot,
        });
        assert_eq!(surface.draw_calls(), LINES_PER_STEP);
    }
}
