use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Tuning constants of the sinusoidal flow field.
///
/// The field is three phase-shifted sines of `x`, `y` and `x + y`, each
/// drifting with the shared time cursor at its own rate. Their mean is a
/// scalar in `[-1, 1]` that drives both direction and speed, which keeps
/// neighbouring particles swirling together instead of jittering apart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldParams {
    /// Spatial frequency of the x term
    pub freq_x: f32,
    /// Spatial frequency of the y term
    pub freq_y: f32,
    /// Spatial frequency of the diagonal (x + y) term
    pub freq_xy: f32,
    /// Time weight of the x term
    pub time_x: f32,
    /// Time weight of the y term
    pub time_y: f32,
    /// Time weight of the diagonal term
    pub time_xy: f32,
    /// Speed when the scalar is at its minimum (-1)
    pub base_speed: f32,
    /// Extra speed per unit of (scalar + 1)
    pub speed_gain: f32,
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            freq_x: 0.0027,
            freq_y: 0.0029,
            freq_xy: 0.0013,
            time_x: 0.002,
            time_y: 0.0017,
            time_xy: 0.0031,
            base_speed: 0.6,
            speed_gain: 0.7,
        }
    }
}

/// One evaluation of the field at a point and time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSample {
    /// Mean of the three sines, in [-1, 1]
    pub scalar: f32,
    /// Flow direction in radians (scalar * 2π)
    pub angle: f32,
    /// Flow speed in pixels per tick
    pub speed: f32,
}

impl FieldSample {
    /// Velocity vector (vx, vy) for this sample
    pub fn velocity(&self) -> (f32, f32) {
        let (sin, cos) = self.angle.sin_cos();
        (cos * self.speed, sin * self.speed)
    }
}

impl FieldParams {
    /// Raw field scalar at (x, y) for time cursor `t`.
    ///
    /// Phases are computed in f64 so a long-running time cursor keeps
    /// advancing smoothly.
    pub fn scalar(&self, x: f32, y: f32, t: f64) -> f32 {
        let (x, y) = (x as f64, y as f64);
        let a = (x * self.freq_x as f64 + t * self.time_x as f64).sin();
        let b = (y * self.freq_y as f64 + t * self.time_y as f64).sin();
        let c = ((x + y) * self.freq_xy as f64 + t * self.time_xy as f64).sin();
        ((a + b + c) / 3.0) as f32
    }

    /// Sample direction and speed at (x, y) for time cursor `t`
    pub fn sample(&self, x: f32, y: f32, t: f64) -> FieldSample {
        let scalar = self.scalar(x, y, t);
        FieldSample {
            scalar,
            angle: (scalar as f64 * TAU) as f32,
            speed: self.base_speed + (scalar + 1.0) * self.speed_gain,
        }
    }

    /// Slowest possible particle speed
    pub fn min_speed(&self) -> f32 {
        self.base_speed
    }

    /// Fastest possible particle speed
    pub fn max_speed(&self) -> f32 {
        self.base_speed + 2.0 * self.speed_gain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_is_deterministic() {
        let params = FieldParams::default();
        for &(x, y, t) in &[(0.0, 0.0, 0.0), (312.5, 97.25, 1300.0), (-40.0, 640.0, 1.3e7)] {
            let a = params.sample(x, y, t);
            let b = params.sample(x, y, t);
            assert_eq!(a, b);
            assert_eq!(a.velocity(), b.velocity());
        }
    }

    #[test]
    fn test_scalar_stays_in_unit_range() {
        let params = FieldParams::default();
        let mut t = 0.0;
        for i in 0..2000 {
            let x = (i * 37 % 1920) as f32;
            let y = (i * 53 % 1080) as f32;
            let s = params.scalar(x, y, t);
            assert!((-1.0..=1.0).contains(&s), "scalar {} out of range", s);
            t += 1.3;
        }
    }

    #[test]
    fn test_origin_at_time_zero_is_still_direction() {
        // All three sines vanish at the origin before time advances
        let sample = FieldParams::default().sample(0.0, 0.0, 0.0);
        assert_eq!(sample.scalar, 0.0);
        assert_eq!(sample.angle, 0.0);
        assert!((sample.speed - 1.3).abs() < 1e-6);
        let (vx, vy) = sample.velocity();
        assert!((vx - 1.3).abs() < 1e-6);
        assert!(vy.abs() < 1e-6);
    }

    #[test]
    fn test_speed_tracks_scalar() {
        let params = FieldParams::default();
        let mut previous: Option<FieldSample> = None;
        for i in 0..500 {
            let sample = params.sample(i as f32 * 11.0, i as f32 * 7.0, i as f64 * 1.3);
            assert!(sample.speed >= params.min_speed() - 1e-6);
            assert!(sample.speed <= params.max_speed() + 1e-6);
            if let Some(prev) = previous {
                if sample.scalar > prev.scalar {
                    assert!(sample.speed >= prev.speed);
                }
            }
            previous = Some(sample);
        }
    }

    #[test]
    fn test_time_moves_the_field() {
        let params = FieldParams::default();
        let before = params.scalar(200.0, 150.0, 0.0);
        let after = params.scalar(200.0, 150.0, 500.0);
        assert_ne!(before, after);
    }
}
