//! Hash-based value noise.
//!
//! `noise1` and `noise2` interpolate pseudo-random lattice values with a
//! smoothstep weight. Output lies in `[0, 1)`, is continuous in its input and
//! reproducible for the same input. It is a fast approximation, not a
//! statistically rigorous generator.

pub mod modulation;

pub use modulation::{ModulationBank, ModulationState, NOISE_SPEEDS};

const HASH_FREQUENCY: f64 = 127.1;
const HASH_AMPLITUDE: f64 = 43758.5453123;
const LATTICE_MIX_X: f64 = 15731.0;
const LATTICE_MIX_Y: f64 = 789221.0;

/// Fractional part, always in `[0, 1)`.
pub fn fract(value: f64) -> f64 {
    value - value.floor()
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Hermite interpolation: `3t² - 2t³`.
pub fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

/// Pseudo-random value in `[0, 1)` for a lattice index.
pub fn hash1(index: f64) -> f64 {
    fract((index * HASH_FREQUENCY).sin() * HASH_AMPLITUDE)
}

/// 1D value noise.
pub fn noise1(x: f64) -> f64 {
    let i0 = x.floor();
    let t = smoothstep(fract(x));
    lerp(hash1(i0), hash1(i0 + 1.0), t)
}

/// 2D value noise, bilinear over four hashed lattice corners.
pub fn noise2(x: f64, y: f64) -> f64 {
    let x0 = x.floor();
    let y0 = y.floor();
    let tx = smoothstep(fract(x));
    let ty = smoothstep(fract(y));

    let corner = |cx: f64, cy: f64| hash1(cx * LATTICE_MIX_X + cy * LATTICE_MIX_Y);
    let top = lerp(corner(x0, y0), corner(x0 + 1.0, y0), tx);
    let bottom = lerp(corner(x0, y0 + 1.0), corner(x0 + 1.0, y0 + 1.0), tx);
    lerp(top, bottom, ty)
}
