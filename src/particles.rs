//! Particle population: field following, integration, edge wrap, trails.
//!
//! Particles are created once at startup at uniform-random positions and
//! live for the whole process. Each tick every particle samples its field
//! cell, integrates, wraps at the canvas edges and emits one trail segment
//! from its previous position to its new one.

use glam::Vec2;
use rand::Rng;

use crate::field::FlowField;
use crate::intensity::StrokeStyle;
use crate::params::SimulationConfig;

/// One line segment handed to the renderer, in canvas pixel coordinates.
/// Color is pure green; `green` and `alpha` are on the 0-255 scale.
#[derive(Clone, Copy, Debug)]
pub struct DrawSegment {
    pub from: Vec2,
    pub to: Vec2,
    pub stroke_width: f32,
    pub green: f32,
    pub alpha: f32,
}

#[derive(Clone, Copy, Debug)]
struct Particle {
    pos: Vec2,
    vel: Vec2,
    force: Vec2,
    prev_pos: Vec2,
}

impl Particle {
    fn new(pos: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            force: Vec2::ZERO,
            prev_pos: pos,
        }
    }

    /// Accumulate the steering vector of the containing field cell.
    ///
    /// Cell indices are clamped to the grid: a particle sitting exactly on
    /// the far wrap boundary (pos == width, legal until its next update)
    /// would otherwise index one past the last column.
    fn follow(&mut self, field: &FlowField, cell_size: f32) {
        let x = ((self.pos.x / cell_size).floor() as usize).min(field.cols() - 1);
        let y = ((self.pos.y / cell_size).floor() as usize).min(field.rows() - 1);
        self.force += field.get(x, y);
    }

    fn update(&mut self, wind_speed: f32, max_speed: f32, width: f32, height: f32) {
        self.vel += self.force;
        self.vel = self.vel.clamp_length_max(max_speed * wind_speed * 1.5);
        self.pos += self.vel;
        self.force = Vec2::ZERO;

        // Hard edge reset, not modulo: an escaping particle re-enters at
        // exactly the opposite boundary coordinate.
        if self.pos.x > width {
            self.pos.x = 0.0;
        }
        if self.pos.x < 0.0 {
            self.pos.x = width;
        }
        if self.pos.y > height {
            self.pos.y = 0.0;
        }
        if self.pos.y < 0.0 {
            self.pos.y = height;
        }
    }

    /// Emit the trail segment for this tick and advance the trail anchor.
    ///
    /// `prev_pos` is updated unconditionally, wrap or no wrap — a wrap tick
    /// produces one long segment crossing the canvas, which is part of the
    /// look.
    fn render(&mut self, style: &StrokeStyle) -> DrawSegment {
        let segment = DrawSegment {
            from: self.prev_pos,
            to: self.pos,
            stroke_width: style.stroke_width,
            green: style.green,
            alpha: style.alpha,
        };
        self.prev_pos = self.pos;
        segment
    }
}

/// Fixed-size particle population over one canvas
pub struct ParticleSystem {
    particles: Vec<Particle>,
    cell_size: f32,
    max_speed: f32,
    width: f32,
    height: f32,
}

impl ParticleSystem {
    /// Create the population at uniform-random positions
    pub fn new(config: &SimulationConfig) -> Self {
        let mut rng = rand::thread_rng();
        let particles = (0..config.particle_count)
            .map(|_| {
                Particle::new(Vec2::new(
                    rng.gen_range(0.0..config.canvas_width),
                    rng.gen_range(0.0..config.canvas_height),
                ))
            })
            .collect();

        Self {
            particles,
            cell_size: config.cell_size,
            max_speed: config.max_speed,
            width: config.canvas_width,
            height: config.canvas_height,
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Phase 1: every particle accumulates its local field vector
    pub fn follow(&mut self, field: &FlowField) {
        for p in &mut self.particles {
            p.follow(field, self.cell_size);
        }
    }

    /// Phase 2: integrate velocities/positions under the given wind factor
    pub fn update(&mut self, wind_speed: f32) {
        for p in &mut self.particles {
            p.update(wind_speed, self.max_speed, self.width, self.height);
        }
    }

    /// Phase 3: emit one trail segment per particle into `out`
    pub fn render(&mut self, style: &StrokeStyle, out: &mut Vec<DrawSegment>) {
        for p in &mut self.particles {
            out.push(p.render(style));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ReactiveState;
    use crate::field::FlowFieldGenerator;

    const W: f32 = 600.0;
    const H: f32 = 600.0;

    fn style() -> StrokeStyle {
        StrokeStyle {
            stroke_width: 2.0,
            green: 60.0,
            alpha: 30.0,
        }
    }

    fn field() -> FlowField {
        let config = SimulationConfig::default();
        let mut gen = FlowFieldGenerator::new(&config);
        let mut field = FlowField::new(config.rows(), config.cols());
        gen.generate(
            &mut field,
            &ReactiveState {
                overall: 0.5,
                kick_hold: 0.0,
                snare_hold: 0.0,
            },
        );
        field
    }

    #[test]
    fn test_population_size_and_bounds() {
        let config = SimulationConfig::default();
        let system = ParticleSystem::new(&config);
        assert_eq!(system.len(), 250);
        for p in &system.particles {
            assert!(p.pos.x >= 0.0 && p.pos.x < W);
            assert!(p.pos.y >= 0.0 && p.pos.y < H);
        }
    }

    #[test]
    fn test_wrap_is_hard_reset_not_modulo() {
        let mut p = Particle::new(Vec2::new(0.0, 300.0));
        p.pos.x = W + 0.01;
        p.update(1.0, 1.0, W, H);
        assert_eq!(p.pos.x, 0.0);

        let mut p = Particle::new(Vec2::new(0.0, 300.0));
        p.pos.x = -0.5;
        p.update(1.0, 1.0, W, H);
        assert_eq!(p.pos.x, W);
    }

    #[test]
    fn test_wrap_vertical() {
        let mut p = Particle::new(Vec2::new(300.0, 0.0));
        p.pos.y = H + 2.0;
        p.update(1.0, 1.0, W, H);
        assert_eq!(p.pos.y, 0.0);

        p.pos.y = -1.0;
        p.update(1.0, 1.0, W, H);
        assert_eq!(p.pos.y, H);
    }

    #[test]
    fn test_velocity_limited_by_wind() {
        let mut p = Particle::new(Vec2::new(300.0, 300.0));
        p.force = Vec2::new(100.0, 0.0);
        let wind = 2.0;
        p.update(wind, 1.0, W, H);
        assert!(p.vel.length() <= 1.0 * wind * 1.5 + 1e-4);
    }

    #[test]
    fn test_force_reset_after_update() {
        let mut p = Particle::new(Vec2::new(300.0, 300.0));
        p.force = Vec2::new(1.0, 1.0);
        p.update(1.0, 1.0, W, H);
        assert_eq!(p.force, Vec2::ZERO);
    }

    #[test]
    fn test_follow_clamps_boundary_cell() {
        // pos == width is reachable after a negative-edge wrap; the cell
        // lookup must clamp instead of indexing out of range.
        let f = field();
        let mut p = Particle::new(Vec2::new(W, H));
        p.follow(&f, 20.0);
        assert_eq!(p.force, f.get(29, 29));
    }

    #[test]
    fn test_positions_stay_in_bounds_under_simulation() {
        let config = SimulationConfig::default();
        let f = field();
        let mut system = ParticleSystem::new(&config);
        for _ in 0..500 {
            system.follow(&f);
            system.update(12.0);
            for p in &system.particles {
                assert!(p.pos.x >= 0.0 && p.pos.x <= W);
                assert!(p.pos.y >= 0.0 && p.pos.y <= H);
            }
        }
    }

    #[test]
    fn test_one_segment_per_particle_per_tick() {
        let config = SimulationConfig::default();
        let f = field();
        let mut system = ParticleSystem::new(&config);
        let mut out = Vec::new();
        for _ in 0..3 {
            out.clear();
            system.follow(&f);
            system.update(1.0);
            system.render(&style(), &mut out);
            assert_eq!(out.len(), 250);
        }
    }

    #[test]
    fn test_trail_anchor_advances_every_tick() {
        let mut p = Particle::new(Vec2::new(100.0, 100.0));
        p.vel = Vec2::new(1.0, 0.0);
        p.update(10.0, 1.0, W, H);
        let seg = p.render(&style());
        assert_eq!(seg.from, Vec2::new(100.0, 100.0));
        assert_eq!(seg.to, p.pos);
        assert_eq!(p.prev_pos, p.pos);
    }

    #[test]
    fn test_trail_segment_spans_canvas_on_wrap() {
        // The anchor update is unconditional: a wrap tick emits one long
        // segment from the old edge to the new one.
        let mut p = Particle::new(Vec2::new(599.5, 300.0));
        p.vel = Vec2::new(1.0, 0.0);
        p.update(10.0, 1.0, W, H); // 600.5 > width → x = 0
        let seg = p.render(&style());
        assert_eq!(seg.from, Vec2::new(599.5, 300.0));
        assert_eq!(seg.to.x, 0.0);
        assert_eq!(p.prev_pos.x, 0.0);
    }
}
