use bevy::asset::LoadState;
use bevy::prelude::*;
use bevy::render::extract_resource::ExtractResource;

pub const COMPUTE_SHADER_PATH: &str = "shaders/noise_ball_compute.wgsl";
pub const DRAW_SHADER_PATH: &str = "shaders/noise_ball_draw.wgsl";

#[cfg(feature = "embed_shaders")]
const COMPUTE_WGSL: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/shaders/noise_ball_compute.wgsl"
));
#[cfg(feature = "embed_shaders")]
const DRAW_WGSL: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/shaders/noise_ball_draw.wgsl"
));

/// Shader handles shared with the render world.
#[derive(Resource, Clone, Debug, ExtractResource)]
pub struct NoiseBallShaders {
    pub compute: Handle<Shader>,
    pub draw: Handle<Shader>,
}

impl FromWorld for NoiseBallShaders {
    #[cfg(feature = "embed_shaders")]
    fn from_world(world: &mut World) -> Self {
        let mut shaders = world.resource_mut::<Assets<Shader>>();
        Self {
            compute: shaders.add(Shader::from_wgsl(COMPUTE_WGSL, "embedded://noise_ball_compute.wgsl")),
            draw: shaders.add(Shader::from_wgsl(DRAW_WGSL, "embedded://noise_ball_draw.wgsl")),
        }
    }

    #[cfg(not(feature = "embed_shaders"))]
    fn from_world(world: &mut World) -> Self {
        let asset_server = world.resource::<AssetServer>();
        Self {
            compute: asset_server.load(COMPUTE_SHADER_PATH),
            draw: asset_server.load(DRAW_SHADER_PATH),
        }
    }
}

/// Whether a shader handle can be handed to the pipeline cache. Embedded shaders are always
/// ready; asset-loaded ones only once the AssetServer reports `Loaded`, so pipeline errors seen
/// afterwards are genuine compile failures.
pub fn shader_ready(world: &World, handle: &Handle<Shader>) -> bool {
    if cfg!(feature = "embed_shaders") {
        return true;
    }
    let Some(asset_server) = world.get_resource::<AssetServer>() else {
        return true;
    };
    match asset_server.get_load_state(handle.id()) {
        Some(LoadState::Loaded) => true,
        Some(LoadState::Failed(err)) => {
            error_once!(target: "noise_ball", "noise ball shader failed to load: {err}");
            false
        }
        _ => false,
    }
}
