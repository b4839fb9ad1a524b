use crate::settings::{FlowSettings, SpawnRanges};
use rand::Rng;

/// One animated trail segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    /// Velocity is overwritten from the field every tick, never integrated
    pub vx: f32,
    pub vy: f32,
    /// Ticks since (re)spawn
    pub age: u32,
    /// Age at which the particle is recycled
    pub lifetime: u32,
    /// Base hue in degrees, fixed until recycled
    pub hue: f32,
    /// Stroke width in pixels
    pub size: f32,
}

impl Particle {
    /// Fresh particle at a uniform random position on a `width` x `height` surface
    pub fn spawn<R: Rng + ?Sized>(rng: &mut R, width: u32, height: u32, ranges: &SpawnRanges) -> Self {
        Self {
            x: rng.gen::<f32>() * width as f32,
            y: rng.gen::<f32>() * height as f32,
            vx: 0.0,
            vy: 0.0,
            age: 0,
            lifetime: ranges
                .lifetime_min
                .saturating_add((rng.gen::<f32>() * ranges.lifetime_span as f32) as u32),
            hue: ranges.hue_base + rng.gen::<f32>() * ranges.hue_span,
            size: ranges.size_base + rng.gen::<f32>() * ranges.size_span,
        }
    }

    /// Full in-place respawn; nothing of the previous state survives
    pub fn recycle<R: Rng + ?Sized>(&mut self, rng: &mut R, width: u32, height: u32, ranges: &SpawnRanges) {
        *self = Self::spawn(rng, width, height, ranges);
    }

    /// Lived past its lifetime
    pub fn is_expired(&self) -> bool {
        self.age > self.lifetime
    }

    /// Drifted further than `margin` outside the surface
    pub fn is_out_of_bounds(&self, width: u32, height: u32, margin: f32) -> bool {
        self.x < -margin
            || self.x > width as f32 + margin
            || self.y < -margin
            || self.y > height as f32 + margin
    }
}

/// Fixed-size set of live particles for one surface size.
/// Recycled particles keep their slot.
#[derive(Debug, Clone, Default)]
pub struct ParticleStore {
    particles: Vec<Particle>,
    width: u32,
    height: u32,
}

impl ParticleStore {
    /// Spawn exactly `settings.particle_count(width, height)` particles
    pub fn populate<R: Rng + ?Sized>(rng: &mut R, width: u32, height: u32, settings: &FlowSettings) -> Self {
        let count = settings.particle_count(width, height);
        let particles = (0..count)
            .map(|_| Particle::spawn(rng, width, height, &settings.spawn))
            .collect();
        Self {
            particles,
            width,
            height,
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Surface size the store was populated for
    pub fn surface_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[cfg(test)]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }
}
