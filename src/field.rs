//! Flow-field generation from coherent noise, modulated by audio features.
//!
//! The field is a 30x30 grid of direction vectors rebuilt in full every
//! tick from 3D Perlin noise. The z coordinate is a time offset that only
//! ever moves forward; its advance rate is driven by loudness and the
//! percussive holds, so the field boils during energetic passages and
//! nearly freezes during quiet ones.

use glam::Vec2;
use noise::{NoiseFn, Perlin};
use std::f32::consts::TAU;

use crate::features::ReactiveState;
use crate::math::map_range;
use crate::params::SimulationConfig;

/// Baseline z drift per tick (the field never fully freezes)
const BASE_DRIFT: f64 = 0.00005;

/// Grid of steering vectors, flat-indexed as `x + y * cols`
pub struct FlowField {
    vectors: Vec<Vec2>,
    rows: usize,
    cols: usize,
}

impl FlowField {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            vectors: vec![Vec2::ZERO; rows * cols],
            rows,
            cols,
        }
    }

    /// Steering vector for cell (x, y); callers must pass in-bounds indices
    pub fn get(&self, x: usize, y: usize) -> Vec2 {
        self.vectors[x + y * self.cols]
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// All cell vectors in flat index order
    pub fn vectors(&self) -> &[Vec2] {
        &self.vectors
    }
}

/// Rebuilds a `FlowField` each tick from Perlin noise and reactive state
pub struct FlowFieldGenerator {
    perlin: Perlin,
    noise_step: f64,
    zoff: f64,
}

impl FlowFieldGenerator {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            perlin: Perlin::new(config.noise_seed),
            noise_step: config.noise_step,
            zoff: 0.0,
        }
    }

    /// Sample 3D Perlin noise remapped from [-1, 1] into [0, 1)
    fn noise3(&self, x: f64, y: f64, z: f64) -> f32 {
        self.perlin.get([x, y, z]) as f32 * 0.5 + 0.5
    }

    /// Rebuild every cell of `field`, then advance the time offset.
    ///
    /// Per cell: noise picks an angle in [0, 2π), and the vector length is
    /// `map(overall, [0,1], [1,6]) + kick_hold * 3 + snare_hold * 3` — the
    /// magnitude floor rises with the percussive holds and never drops
    /// below 1.
    pub fn generate(&mut self, field: &mut FlowField, state: &ReactiveState) {
        let magnitude = map_range(state.overall, 0.0, 1.0, 1.0, 6.0)
            + state.kick_hold * 3.0
            + state.snare_hold * 3.0;

        let mut yoff = 0.0;
        for y in 0..field.rows {
            let mut xoff = 0.0;
            for x in 0..field.cols {
                let angle = self.noise3(xoff, yoff, self.zoff) * TAU;
                field.vectors[x + y * field.cols] = Vec2::from_angle(angle) * magnitude;
                xoff += self.noise_step;
            }
            yoff += self.noise_step;
        }

        self.zoff += BASE_DRIFT
            + state.overall as f64 * 0.008
            + state.kick_hold as f64 * 0.01
            + state.snare_hold as f64 * 0.01;
    }

    /// Current noise-time offset (monotonically non-decreasing)
    pub fn zoff(&self) -> f64 {
        self.zoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make() -> (FlowFieldGenerator, FlowField) {
        let config = SimulationConfig::default();
        (
            FlowFieldGenerator::new(&config),
            FlowField::new(config.rows(), config.cols()),
        )
    }

    fn state(overall: f32, kick: f32, snare: f32) -> ReactiveState {
        ReactiveState {
            overall,
            kick_hold: kick,
            snare_hold: snare,
        }
    }

    #[test]
    fn test_field_dimensions() {
        let (mut gen, mut field) = make();
        gen.generate(&mut field, &state(0.0, 0.0, 0.0));
        assert_eq!(field.rows(), 30);
        assert_eq!(field.cols(), 30);
        assert_eq!(field.vectors().len(), 900);
    }

    #[test]
    fn test_silence_gives_unit_magnitude() {
        let (mut gen, mut field) = make();
        gen.generate(&mut field, &state(0.0, 0.0, 0.0));
        for v in field.vectors() {
            assert!((v.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_vectors_finite_and_positive() {
        let (mut gen, mut field) = make();
        gen.generate(&mut field, &state(0.7, 0.9, 0.4));
        for v in field.vectors() {
            assert!(v.length().is_finite());
            assert!(v.length() > 0.0);
        }
    }

    #[test]
    fn test_magnitude_monotone_in_each_signal() {
        let (mut gen, mut field) = make();

        let mag_at = |gen: &mut FlowFieldGenerator, field: &mut FlowField, s: ReactiveState| {
            gen.generate(field, &s);
            field.get(0, 0).length()
        };

        // Holding the other two signals fixed, raising any one signal must
        // not shrink the magnitude.
        let base = mag_at(&mut gen, &mut field, state(0.2, 0.2, 0.2));
        assert!(mag_at(&mut gen, &mut field, state(0.8, 0.2, 0.2)) >= base - 1e-5);
        assert!(mag_at(&mut gen, &mut field, state(0.2, 0.8, 0.2)) >= base - 1e-5);
        assert!(mag_at(&mut gen, &mut field, state(0.2, 0.2, 0.8)) >= base - 1e-5);
    }

    #[test]
    fn test_expected_magnitude_formula() {
        let (mut gen, mut field) = make();
        gen.generate(&mut field, &state(0.5, 1.0, 0.5));
        // map(0.5,[0,1],[1,6]) + 1.0*3 + 0.5*3 = 3.5 + 3 + 1.5
        for v in field.vectors() {
            assert!((v.length() - 8.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_zoff_baseline_drift_in_silence() {
        let (mut gen, mut field) = make();
        for _ in 0..100 {
            gen.generate(&mut field, &state(0.0, 0.0, 0.0));
        }
        assert!((gen.zoff() - 100.0 * BASE_DRIFT).abs() < 1e-12);
    }

    #[test]
    fn test_zoff_strictly_increases_with_loudness() {
        let (mut gen, mut field) = make();
        let mut prev = gen.zoff();
        for _ in 0..10 {
            gen.generate(&mut field, &state(0.5, 0.0, 0.0));
            assert!(gen.zoff() > prev);
            prev = gen.zoff();
        }
        // Louder input advances faster than the silent baseline
        assert!(prev > 10.0 * BASE_DRIFT);
    }

    #[test]
    fn test_same_zoff_same_field() {
        // The field is a pure function of (x, y, zoff, state): two
        // generators with the same seed walk through identical grids.
        let config = SimulationConfig::default();
        let mut gen_a = FlowFieldGenerator::new(&config);
        let mut gen_b = FlowFieldGenerator::new(&config);
        let mut field_a = FlowField::new(config.rows(), config.cols());
        let mut field_b = FlowField::new(config.rows(), config.cols());

        let s = state(0.3, 0.6, 0.1);
        gen_a.generate(&mut field_a, &s);
        gen_b.generate(&mut field_b, &s);

        for (a, b) in field_a.vectors().iter().zip(field_b.vectors()) {
            assert_eq!(a, b);
        }
    }
}
