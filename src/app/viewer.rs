use bevy::prelude::*;

use crate::app::configurator::apply_density_to_balls;
use crate::core::components::{ConfiguredNoiseBall, NoiseBall, NoiseBallMaterial};
use crate::core::config::{CameraConfig, NoiseBallConfig};

#[derive(Component)]
pub struct OrbitCamera;

/// Scene for the standalone viewer: an orbiting camera and one ball built from `NoiseBallConfig`.
pub struct ViewerPlugin;

impl Plugin for ViewerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NoiseBallConfig>()
            .add_systems(Startup, setup_scene)
            .add_systems(
                Update,
                (
                    apply_config_to_balls
                        .run_if(resource_changed::<NoiseBallConfig>)
                        .before(apply_density_to_balls),
                    orbit_camera,
                ),
            );
    }
}

fn setup_scene(mut commands: Commands, config: Res<NoiseBallConfig>) {
    commands.spawn((
        Camera3d::default(),
        Camera {
            clear_color: ClearColorConfig::Custom(Color::srgb(0.08, 0.08, 0.1)),
            ..default()
        },
        orbit_transform(&config.camera, 0.0),
        OrbitCamera,
    ));
    commands.spawn((
        NoiseBall::new(config.ball.sanitized()),
        config.material.to_material(),
        Transform::IDENTITY,
        ConfiguredNoiseBall,
    ));
    info!(
        target: "noise_ball",
        "viewer ready: {} triangles, camera distance {:.2}",
        config.ball.triangle_count, config.camera.distance
    );
}

pub fn orbit_transform(cam: &CameraConfig, elapsed: f32) -> Transform {
    let angle = elapsed * cam.orbit_speed;
    let distance = cam.distance.max(0.01);
    Transform::from_xyz(angle.sin() * distance, cam.height, angle.cos() * distance)
        .looking_at(Vec3::ZERO, Vec3::Y)
}

fn orbit_camera(
    time: Res<Time>,
    config: Res<NoiseBallConfig>,
    mut q: Query<&mut Transform, With<OrbitCamera>>,
) {
    if config.camera.orbit_speed == 0.0 && !config.is_changed() {
        return;
    }
    for mut t in q.iter_mut() {
        *t = orbit_transform(&config.camera, time.elapsed_secs());
    }
}

/// Push config-file ball parameters and material onto every config-spawned ball.
pub fn apply_config_to_balls(
    config: Res<NoiseBallConfig>,
    mut q: Query<(&mut NoiseBall, &mut NoiseBallMaterial), With<ConfiguredNoiseBall>>,
) {
    let params = config.ball.sanitized();
    let material = config.material.to_material();
    for (mut ball, mut mat) in q.iter_mut() {
        if ball.0 != params {
            ball.0 = params;
        }
        mat.set_if_neq(material);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orbit_starts_on_positive_z_facing_origin() {
        let cam = CameraConfig::default();
        let t = orbit_transform(&cam, 0.0);
        assert!((t.translation - Vec3::new(0.0, cam.height, cam.distance)).length() < 1e-5);
        assert!(t.forward().dot(-t.translation.normalize()) > 0.999);
    }
}
