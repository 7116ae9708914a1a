use bevy::prelude::*;
use bevy::render::primitives::Aabb;

use crate::rendering::noise_ball::NoiseBallParameters;

/// A GPU-generated noise ball. Spawning this is all that is needed; buffers are allocated in
/// the render world on first extraction and released when the entity goes away.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(NoiseOffset, NoiseBallMaterial, Transform, Visibility, Aabb)]
pub struct NoiseBall(pub NoiseBallParameters);

impl NoiseBall {
    pub fn new(params: NoiseBallParameters) -> Self {
        Self(params)
    }
}

/// Accumulated noise-space offset (`noise_animation * elapsed`). Starts at zero per entity.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct NoiseOffset(pub Vec3);

/// Flat-lit surface settings used by the draw pass.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct NoiseBallMaterial {
    pub base_color: LinearRgba,
    pub ambient: f32,
    pub light_direction: Vec3,
}

impl Default for NoiseBallMaterial {
    fn default() -> Self {
        Self {
            base_color: LinearRgba::rgb(0.9, 0.9, 0.92),
            ambient: 0.25,
            light_direction: Vec3::new(0.4, 0.8, 0.45),
        }
    }
}

/// Marks balls spawned from `NoiseBallConfig` so config reloads can re-apply parameters.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ConfiguredNoiseBall;
