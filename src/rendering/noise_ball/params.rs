//! Serializable parameter aggregate driving one noise ball.
use bevy::prelude::*;
use serde::Deserialize;

/// Radius of the undisplaced sphere the triangles are scattered over.
pub const BALL_RADIUS: f32 = 0.5;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Reflect)]
#[serde(default)]
pub struct NoiseBallParameters {
    pub triangle_count: u32,
    pub triangle_extent: f32,
    pub noise_frequency: f32,
    pub noise_amplitude: f32,
    pub noise_animation: Vec3,
}

impl Default for NoiseBallParameters {
    fn default() -> Self {
        Self {
            triangle_count: 10_000,
            triangle_extent: 0.3,
            noise_frequency: 2.2,
            noise_amplitude: 0.85,
            noise_animation: Vec3::new(0.0, 0.13, 0.51),
        }
    }
}

impl NoiseBallParameters {
    /// Every triangle owns three vertices; nothing is shared.
    pub fn vertex_count(&self) -> u32 {
        self.triangle_count.saturating_mul(3)
    }

    /// Index buffer length (identity topology, one index per vertex).
    pub fn index_count(&self) -> u32 {
        self.vertex_count()
    }

    /// Clamp into a range the kernels accept: at least one triangle, finite floats.
    pub fn sanitized(&self) -> Self {
        let d = Self::default();
        let finite = |v: f32, fallback: f32| if v.is_finite() { v } else { fallback };
        Self {
            triangle_count: self.triangle_count.max(1),
            triangle_extent: finite(self.triangle_extent, d.triangle_extent),
            noise_frequency: finite(self.noise_frequency, d.noise_frequency),
            noise_amplitude: finite(self.noise_amplitude, d.noise_amplitude),
            noise_animation: if self.noise_animation.is_finite() {
                self.noise_animation
            } else {
                d.noise_animation
            },
        }
    }

    /// Half size of the cube enclosing any displaced vertex: bounds size is `1 + 2 * amplitude`.
    pub fn bounds_half_extent(&self) -> f32 {
        0.5 * (1.0 + 2.0 * self.noise_amplitude.abs())
    }
}
