//! Particle pool for visual effects
//!
//! Particles are purely cosmetic: nothing outside the pool reads or writes
//! them except through an immutable slice. Each particle evolves on its own,
//! so an update is a single pass followed by a compaction.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::consts::PARTICLE_LIFE;
use crate::error::ConfigError;
use crate::{per_frame_to_rate, rate_to_probability};

/// RGB color tag handed through to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    pub const BLACK: Color = Color(0, 0, 0);
    pub const RED: Color = Color(255, 0, 0);
    pub const GREEN: Color = Color(0, 255, 0);
    pub const GREY: Color = Color(128, 128, 128);
    pub const LIGHT_GREY: Color = Color(200, 200, 200);
    pub const ORANGE: Color = Color(255, 165, 0);
}

/// How a burst picks particle colors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColorPolicy {
    Fixed(Color),
    /// Uniform pick per particle
    Palette(Vec<Color>),
}

impl ColorPolicy {
    fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Color {
        match self {
            ColorPolicy::Fixed(c) => *c,
            ColorPolicy::Palette(colors) => colors.choose(rng).copied().unwrap_or(Color::BLACK),
        }
    }
}

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: Color,
    /// Seconds of life left at decay rate 1.0; removed at <= 0
    pub life: f32,
    pub size: f32,
}

/// Randomization envelope for newly emitted particles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmitShape {
    /// Half-extent of the uniform position offset around the origin
    pub jitter: Vec2,
    pub vel_min: Vec2,
    pub vel_max: Vec2,
    pub size_min: f32,
    pub size_max: f32,
}

impl EmitShape {
    /// Velocity symmetric around zero on both axes
    pub fn radial(jitter: f32, speed: f32, size: f32) -> Self {
        Self {
            jitter: Vec2::splat(jitter),
            vel_min: Vec2::splat(-speed),
            vel_max: Vec2::splat(speed),
            size_min: size,
            size_max: size,
        }
    }

    /// Every range must be ordered with a finite width; sizes are positive
    pub fn validate(&self) -> Result<(), ConfigError> {
        let jitter = self.jitter * 2.0;
        if !(self.jitter.cmpge(Vec2::ZERO).all() && jitter.is_finite()) {
            return Err(ConfigError::InvalidEmitShape("jitter"));
        }
        let spread = self.vel_max - self.vel_min;
        if !(spread.cmpge(Vec2::ZERO).all() && spread.is_finite()) {
            return Err(ConfigError::InvalidEmitShape("velocity"));
        }
        let width = self.size_max - self.size_min;
        if !(self.size_min > 0.0 && width >= 0.0 && width.is_finite()) {
            return Err(ConfigError::InvalidEmitShape("size"));
        }
        Ok(())
    }
}

/// Per-scenario particle behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleConfig {
    /// Life lost per second
    pub decay_rate: f32,
    /// Multiplicative size factor applied once per advancing tick
    pub shrink: f32,
    /// Downward acceleration (units/s², 0 disables)
    #[serde(default)]
    pub gravity: f32,
    /// Emission is refused once the pool holds this many particles
    #[serde(default)]
    pub cap: Option<usize>,
    /// Particles per burst
    pub burst: usize,
    pub shape: EmitShape,
}

impl ParticleConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.decay_rate > 0.0) {
            return Err(ConfigError::NonPositiveDecay(self.decay_rate));
        }
        if !(self.shrink > 0.0 && self.shrink <= 1.0) {
            return Err(ConfigError::InvalidShrink(self.shrink));
        }
        self.shape.validate()
    }
}

/// Frame-rate independent random trigger
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmissionPolicy {
    /// Expected emissions per second
    pub rate: f32,
}

impl EmissionPolicy {
    /// Build from a per-frame chance tuned at `fps`
    pub fn per_frame(probability: f32, fps: f32) -> Self {
        Self {
            rate: per_frame_to_rate(probability, fps),
        }
    }

    /// Roll for an emission over a tick of length `dt`
    pub fn fires<R: Rng + ?Sized>(&self, dt: f32, rng: &mut R) -> bool {
        let p = rate_to_probability(self.rate, dt);
        p > 0.0 && rng.random::<f32>() < p
    }
}

/// Owns every live particle
#[derive(Debug, Clone)]
pub struct ParticlePool {
    particles: Vec<Particle>,
    config: ParticleConfig,
}

impl ParticlePool {
    pub fn new(config: ParticleConfig) -> Self {
        Self {
            particles: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &ParticleConfig {
        &self.config
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Emit a burst of the configured size
    pub fn burst<R: Rng + ?Sized>(&mut self, origin: Vec2, colors: &ColorPolicy, rng: &mut R) -> usize {
        self.emit(origin, self.config.burst, colors, rng)
    }

    /// Append up to `count` particles at `origin`; excess over the cap is dropped.
    ///
    /// Returns how many were actually emitted.
    pub fn emit<R: Rng + ?Sized>(
        &mut self,
        origin: Vec2,
        count: usize,
        colors: &ColorPolicy,
        rng: &mut R,
    ) -> usize {
        let room = match self.config.cap {
            Some(cap) => cap.saturating_sub(self.particles.len()),
            None => usize::MAX,
        };
        let count = count.min(room);
        let shape = self.config.shape;

        for _ in 0..count {
            let offset = Vec2::new(
                sample(rng, -shape.jitter.x, shape.jitter.x),
                sample(rng, -shape.jitter.y, shape.jitter.y),
            );
            let vel = Vec2::new(
                sample(rng, shape.vel_min.x, shape.vel_max.x),
                sample(rng, shape.vel_min.y, shape.vel_max.y),
            );
            self.particles.push(Particle {
                pos: origin + offset,
                vel,
                color: colors.pick(rng),
                life: PARTICLE_LIFE,
                size: sample(rng, shape.size_min, shape.size_max),
            });
        }
        count
    }

    /// Integrate, age and compact in one pass
    pub fn update(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        if dt == 0.0 {
            return;
        }
        let ParticleConfig {
            decay_rate,
            shrink,
            gravity,
            ..
        } = self.config;

        for p in self.particles.iter_mut() {
            p.pos += p.vel * dt;
            if gravity != 0.0 {
                p.vel.y += gravity * dt;
            }
            p.life -= decay_rate * dt;
            p.size *= shrink;
        }
        self.particles.retain(|p| p.life > 0.0);
    }
}

fn sample<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn config(cap: Option<usize>) -> ParticleConfig {
        ParticleConfig {
            decay_rate: 2.0,
            shrink: 0.5,
            gravity: 0.0,
            cap,
            burst: 5,
            shape: EmitShape::radial(10.0, 50.0, 3.0),
        }
    }

    #[test]
    fn test_shape_validation() {
        assert!(EmitShape::radial(10.0, 50.0, 3.0).validate().is_ok());
        assert!(EmitShape::radial(0.0, 0.0, 2.0).validate().is_ok());

        let cases = [
            (EmitShape::radial(3e38, 50.0, 3.0), "jitter"),
            (EmitShape::radial(-1.0, 50.0, 3.0), "jitter"),
            (EmitShape::radial(f32::NAN, 50.0, 3.0), "jitter"),
            (EmitShape::radial(10.0, 2e38, 3.0), "velocity"),
            (EmitShape::radial(10.0, -5.0, 3.0), "velocity"),
            (EmitShape::radial(10.0, f32::INFINITY, 3.0), "velocity"),
            (EmitShape::radial(10.0, 50.0, 0.0), "size"),
            (
                EmitShape {
                    size_min: 4.0,
                    size_max: 2.0,
                    ..EmitShape::radial(10.0, 50.0, 3.0)
                },
                "size",
            ),
            (
                EmitShape {
                    size_max: f32::NAN,
                    ..EmitShape::radial(10.0, 50.0, 3.0)
                },
                "size",
            ),
        ];
        for (shape, field) in cases {
            match shape.validate() {
                Err(ConfigError::InvalidEmitShape(f)) => assert_eq!(f, field, "{:?}", shape),
                other => panic!("{:?} accepted: {:?}", shape, other),
            }
        }

        let mut cfg = config(None);
        cfg.shape.vel_min.y = 60.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_burst_within_shape() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut pool = ParticlePool::new(config(None));
        let n = pool.burst(Vec2::new(100.0, 0.0), &ColorPolicy::Fixed(Color::RED), &mut rng);
        assert_eq!(n, 5);
        for p in pool.particles() {
            assert!((p.pos.x - 100.0).abs() <= 10.0);
            assert!(p.vel.x.abs() <= 50.0 && p.vel.y.abs() <= 50.0);
            assert_eq!(p.life, 1.0);
            assert_eq!(p.color, Color::RED);
        }
    }

    #[test]
    fn test_cap_discards_excess() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut pool = ParticlePool::new(config(Some(7)));
        let colors = ColorPolicy::Fixed(Color::GREEN);
        assert_eq!(pool.emit(Vec2::ZERO, 5, &colors, &mut rng), 5);
        assert_eq!(pool.emit(Vec2::ZERO, 5, &colors, &mut rng), 2);
        assert_eq!(pool.emit(Vec2::ZERO, 5, &colors, &mut rng), 0);
        assert_eq!(pool.len(), 7);
    }

    #[test]
    fn test_decay_removes_in_same_pass() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut pool = ParticlePool::new(config(None));
        pool.burst(Vec2::ZERO, &ColorPolicy::Fixed(Color::RED), &mut rng);

        pool.update(0.25);
        assert_eq!(pool.len(), 5);
        assert!(pool.particles().iter().all(|p| (p.life - 0.5).abs() < 1e-6));
        assert!(pool.particles().iter().all(|p| (p.size - 1.5).abs() < 1e-6));

        // 0.5 - 2.0 * 0.25 == 0 exactly -> removed
        pool.update(0.25);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_zero_dt_freezes_particles() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut pool = ParticlePool::new(config(None));
        pool.burst(Vec2::ZERO, &ColorPolicy::Fixed(Color::RED), &mut rng);
        let before: Vec<f32> = pool.particles().iter().map(|p| p.size).collect();
        pool.update(0.0);
        let after: Vec<f32> = pool.particles().iter().map(|p| p.size).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_gravity_pulls_down() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut cfg = config(None);
        cfg.gravity = 100.0;
        cfg.shape = EmitShape::radial(0.0, 0.0, 2.0);
        let mut pool = ParticlePool::new(cfg);
        pool.burst(Vec2::ZERO, &ColorPolicy::Fixed(Color::GREY), &mut rng);
        pool.update(0.1);
        pool.update(0.1);
        for p in pool.particles() {
            assert!((p.vel.y - 20.0).abs() < 1e-4);
            assert!(p.pos.y > 0.0);
        }
    }

    #[test]
    fn test_palette_colors() {
        let mut rng = Pcg32::seed_from_u64(11);
        let palette = vec![Color::GREY, Color::LIGHT_GREY, Color::BLACK];
        let mut pool = ParticlePool::new(config(None));
        pool.emit(Vec2::ZERO, 30, &ColorPolicy::Palette(palette.clone()), &mut rng);
        assert!(pool.particles().iter().all(|p| palette.contains(&p.color)));
    }

    #[test]
    fn test_emission_policy_never_fires_without_time() {
        let mut rng = Pcg32::seed_from_u64(5);
        let policy = EmissionPolicy::per_frame(0.9, 60.0);
        assert!((0..100).all(|_| !policy.fires(0.0, &mut rng)));
    }

    #[test]
    fn test_emission_policy_matches_rate() {
        let mut rng = Pcg32::seed_from_u64(5);
        let policy = EmissionPolicy::per_frame(0.3, 60.0);
        let fired = (0..10_000).filter(|_| policy.fires(1.0 / 60.0, &mut rng)).count();
        assert!((2700..3300).contains(&fired), "fired {fired}");
    }

    #[test]
    fn test_validate() {
        let mut cfg = config(None);
        assert!(cfg.validate().is_ok());
        cfg.shrink = 1.5;
        assert!(cfg.validate().is_err());
        cfg.shrink = 1.0;
        cfg.decay_rate = 0.0;
        assert!(cfg.validate().is_err());
    }
}
