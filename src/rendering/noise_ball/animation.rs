//! Main-world per-frame state: parameter clamping, noise-time accumulation, bounds.
use bevy::prelude::*;
use bevy::render::primitives::Aabb;

use crate::core::components::{NoiseBall, NoiseOffset};

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub struct NoiseBallUpdateSet;

/// Inspector-style validation: runs only for balls whose parameters changed.
pub fn sanitize_parameters(mut q: Query<&mut NoiseBall, Changed<NoiseBall>>) {
    for mut ball in q.iter_mut() {
        let clean = ball.0.sanitized();
        if clean != ball.0 {
            warn!(target: "noise_ball", "clamped invalid parameters {:?} -> {:?}", ball.0, clean);
            ball.0 = clean;
        }
    }
}

/// `offset += animation * dt` using virtual time; a paused clock yields dt == 0.
pub fn advance_noise_offset(time: Res<Time>, mut q: Query<(&NoiseBall, &mut NoiseOffset)>) {
    let dt = time.delta_secs();
    if dt == 0.0 {
        return;
    }
    for (ball, mut offset) in q.iter_mut() {
        offset.0 += ball.0.noise_animation * dt;
    }
}

pub fn update_bounds(mut q: Query<(&NoiseBall, &mut Aabb), Changed<NoiseBall>>) {
    for (ball, mut aabb) in q.iter_mut() {
        let half = Vec3::splat(ball.0.bounds_half_extent());
        *aabb = Aabb::from_min_max(-half, half);
    }
}
