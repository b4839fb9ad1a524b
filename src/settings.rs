use crate::field::FieldParams;
use serde::{Deserialize, Serialize};

/// Uniform ranges that spawned particles draw their traits from.
/// Each trait is drawn from `[base, base + span)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnRanges {
    /// Shortest particle lifetime in ticks
    pub lifetime_min: u32,
    /// Random lifetime span added on top of the minimum
    pub lifetime_span: u32,
    /// Lowest hue in degrees
    pub hue_base: f32,
    /// Width of the hue band in degrees
    pub hue_span: f32,
    /// Thinnest stroke width in pixels
    pub size_base: f32,
    /// Random stroke width span
    pub size_span: f32,
}

impl Default for SpawnRanges {
    fn default() -> Self {
        Self {
            lifetime_min: 600,
            lifetime_span: 400,
            hue_base: 170.0,
            hue_span: 100.0,
            size_base: 0.6,
            size_span: 1.1,
        }
    }
}

/// Upper bound for both spawn lifetime fields, in ticks
pub const MAX_LIFETIME: u32 = 100_000;

/// All renderer tuning constants consolidated into one struct
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSettings {
    // === Density ===
    /// Hard cap on the number of live particles
    pub max_density: usize,
    /// Surface area (px²) that earns one particle
    pub area_per_particle: u32,

    // === Motion ===
    /// Flow field constants
    pub field: FieldParams,
    /// Time cursor advance per tick
    pub time_step: f32,
    /// How far past the surface edge a particle may drift before recycling
    pub boundary_margin: f32,

    // === Spawn ===
    pub spawn: SpawnRanges,

    // === Painting ===
    /// Alpha of the background wash applied every tick (trail fade speed)
    pub fade_alpha: f32,
    /// Trail length as a multiple of the velocity vector
    pub trail_length: f32,
    /// Trail head opacity at the weakest flow
    pub alpha_base: f32,
    /// Extra trail head opacity per unit of (scalar + 1)
    pub alpha_gain: f32,
    /// Hue offset of the trail tail, in degrees
    pub hue_shift: f32,
    /// Colour saturation of trails (0-1)
    pub saturation: f32,
    /// Lightness of the trail head (0-1)
    pub head_lightness: f32,
    /// Lightness of the trail tail (0-1)
    pub tail_lightness: f32,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            max_density: 68,
            area_per_particle: 18_000,

            field: FieldParams::default(),
            time_step: 1.3,
            boundary_margin: 50.0,

            spawn: SpawnRanges::default(),

            fade_alpha: 0.12,
            trail_length: 4.0,
            alpha_base: 0.12,
            alpha_gain: 0.08,
            hue_shift: 40.0,
            saturation: 0.8,
            head_lightness: 0.6,
            tail_lightness: 0.55,
        }
    }
}

impl FlowSettings {
    /// Number of particles for a surface of the given size
    pub fn particle_count(&self, width: u32, height: u32) -> usize {
        if self.area_per_particle == 0 {
            return 0;
        }
        let area = width as u64 * height as u64;
        let by_area = (area / self.area_per_particle as u64) as usize;
        by_area.min(self.max_density)
    }

    /// Adjust the particle cap within bounds
    pub fn adjust_max_density(&mut self, delta: i32) {
        self.max_density = (self.max_density as i32 + delta).clamp(1, 400) as usize;
    }

    /// Adjust the time step within bounds
    pub fn adjust_time_step(&mut self, delta: f32) {
        self.time_step = (self.time_step + delta).clamp(0.1, 10.0);
    }

    /// Adjust the recycle margin within bounds
    pub fn adjust_boundary_margin(&mut self, delta: f32) {
        self.boundary_margin = (self.boundary_margin + delta).clamp(0.0, 200.0);
    }

    /// Adjust the trail fade alpha within bounds
    pub fn adjust_fade_alpha(&mut self, delta: f32) {
        self.fade_alpha = (self.fade_alpha + delta).clamp(0.01, 1.0);
    }

    /// Adjust the trail length within bounds
    pub fn adjust_trail_length(&mut self, delta: f32) {
        self.trail_length = (self.trail_length + delta).clamp(0.5, 20.0);
    }

    /// Rotate the hue band (wraps around)
    pub fn adjust_hue_base(&mut self, delta: f32) {
        self.spawn.hue_base = (self.spawn.hue_base + delta).rem_euclid(360.0);
    }

    /// Widen or narrow the hue band within bounds
    pub fn adjust_hue_span(&mut self, delta: f32) {
        self.spawn.hue_span = (self.spawn.hue_span + delta).clamp(0.0, 360.0);
    }

    /// Clamp every field into the ranges the renderer expects.
    /// Used after loading settings from disk or the command line.
    pub fn sanitized(mut self) -> Self {
        self.max_density = self.max_density.clamp(1, 400);
        self.area_per_particle = self.area_per_particle.clamp(1_000, 100_000);
        self.time_step = self.time_step.clamp(0.1, 10.0);
        self.boundary_margin = self.boundary_margin.clamp(0.0, 200.0);
        self.fade_alpha = self.fade_alpha.clamp(0.01, 1.0);
        self.trail_length = self.trail_length.clamp(0.5, 20.0);
        self.alpha_base = self.alpha_base.clamp(0.0, 1.0);
        self.alpha_gain = self.alpha_gain.clamp(0.0, 0.5);
        self.saturation = self.saturation.clamp(0.0, 1.0);
        self.head_lightness = self.head_lightness.clamp(0.0, 1.0);
        self.tail_lightness = self.tail_lightness.clamp(0.0, 1.0);
        self.spawn.lifetime_min = self.spawn.lifetime_min.clamp(1, MAX_LIFETIME);
        self.spawn.lifetime_span = self.spawn.lifetime_span.min(MAX_LIFETIME);
        self.spawn.hue_base = self.spawn.hue_base.rem_euclid(360.0);
        self.spawn.hue_span = self.spawn.hue_span.clamp(0.0, 360.0);
        self.spawn.size_base = self.spawn.size_base.clamp(0.1, 10.0);
        self.spawn.size_span = self.spawn.size_span.clamp(0.0, 10.0);
        self
    }
}
