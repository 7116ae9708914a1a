//! Interactive density control: one scalar drives both triangle count and triangle size,
//! with a small HUD showing the resulting count and a smoothed frame rate.
use bevy::prelude::*;

use crate::core::components::NoiseBall;
use crate::core::config::ConfiguratorConfig;

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct DensityConfigurator {
    pub enabled: bool,
    /// 0..=1
    pub density: f32,
    pub step: f32,
    pub sweep_per_second: f32,
    /// Exponentially smoothed frame time (seconds).
    pub smoothed_dt: f32,
}

impl Default for DensityConfigurator {
    fn default() -> Self {
        Self::from_config(&ConfiguratorConfig::default())
    }
}

impl DensityConfigurator {
    pub fn from_config(cfg: &ConfiguratorConfig) -> Self {
        Self {
            enabled: cfg.enabled,
            density: cfg.density.clamp(0.0, 1.0),
            step: cfg.step.abs().max(1e-4),
            sweep_per_second: cfg.sweep_per_second.abs(),
            smoothed_dt: 0.0,
        }
    }

    pub fn triangle_count(&self) -> u32 {
        triangle_count_for_density(self.density)
    }

    pub fn triangle_extent(&self) -> f32 {
        triangle_extent_for_density(self.density)
    }

    pub fn fps(&self) -> u32 {
        if self.smoothed_dt > 0.0 {
            (1.0 / self.smoothed_dt) as u32
        } else {
            0
        }
    }

    pub fn adjust(&mut self, steps: f32) {
        self.density = (self.density + steps * self.step).clamp(0.0, 1.0);
    }

    /// Held-key movement: proportional to elapsed time, not to frame count.
    pub fn sweep(&mut self, direction: f32, dt: f32) {
        self.density = (self.density + direction * self.sweep_per_second * dt.max(0.0)).clamp(0.0, 1.0);
    }

    /// The first sample seeds the average so the readout doesn't start at infinity.
    pub fn record_frame(&mut self, frame_dt: f32) {
        if frame_dt <= 0.0 {
            return;
        }
        self.smoothed_dt = if self.smoothed_dt <= 0.0 {
            frame_dt
        } else {
            self.smoothed_dt + (frame_dt - self.smoothed_dt) * 0.01
        };
    }
}

/// 100 triangles at density 0, doubling every 1/15 of the range (~3.3M at 1).
pub fn triangle_count_for_density(density: f32) -> u32 {
    (100.0 * 2f32.powf(density.clamp(0.0, 1.0) * 15.0)) as u32
}

/// Denser balls get smaller triangles.
pub fn triangle_extent_for_density(density: f32) -> f32 {
    let d = density.clamp(0.0, 1.0);
    4.0 / (1.0 + 100.0 * d * d)
}

/// `1234567` -> `"1,234,567"`.
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[derive(Component)]
pub struct ConfiguratorHud;

pub struct DensityConfiguratorPlugin;

impl Plugin for DensityConfiguratorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DensityConfigurator>()
            .add_systems(Startup, spawn_hud)
            .add_systems(
                Update,
                (
                    density_key_input,
                    apply_density_to_balls.run_if(resource_changed::<DensityConfigurator>),
                    track_frame_rate,
                    update_hud,
                )
                    .chain(),
            );
    }
}

pub fn density_key_input(
    keys: Res<ButtonInput<KeyCode>>,
    time: Res<Time<Real>>,
    mut cfg: ResMut<DensityConfigurator>,
) {
    if !cfg.enabled {
        return;
    }
    let axis = |up: bool, down: bool| (up as i32 - down as i32) as f32;
    let tapped = axis(
        keys.just_pressed(KeyCode::ArrowUp),
        keys.just_pressed(KeyCode::ArrowDown),
    );
    let held = axis(keys.pressed(KeyCode::ArrowUp), keys.pressed(KeyCode::ArrowDown));
    if tapped == 0.0 && held == 0.0 {
        return;
    }
    let before = cfg.density;
    let mut next = cfg.clone();
    if tapped != 0.0 {
        next.adjust(tapped);
    } else {
        next.sweep(held, time.delta_secs());
    }
    if next.density != before {
        cfg.density = next.density;
        debug!(target: "noise_ball", "density {:.2} -> {} triangles", cfg.density, cfg.triangle_count());
    }
}

pub fn apply_density_to_balls(cfg: Res<DensityConfigurator>, mut balls: Query<&mut NoiseBall>) {
    if !cfg.enabled {
        return;
    }
    let triangle_count = cfg.triangle_count();
    let triangle_extent = cfg.triangle_extent();
    for mut ball in balls.iter_mut() {
        if ball.0.triangle_count != triangle_count || ball.0.triangle_extent != triangle_extent {
            ball.0.triangle_count = triangle_count;
            ball.0.triangle_extent = triangle_extent;
        }
    }
}

// Real time so the readout keeps moving while the animation is paused.
fn track_frame_rate(time: Res<Time<Real>>, mut cfg: ResMut<DensityConfigurator>) {
    let dt = time.delta_secs();
    cfg.bypass_change_detection().record_frame(dt);
}

fn spawn_hud(mut commands: Commands, cfg: Res<DensityConfigurator>) {
    if !cfg.enabled {
        return;
    }
    commands.spawn((
        Text::new(""),
        TextFont {
            font_size: 16.0,
            ..default()
        },
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(8.0),
            left: Val::Px(8.0),
            ..default()
        },
        ConfiguratorHud,
    ));
}

fn update_hud(cfg: Res<DensityConfigurator>, mut q: Query<&mut Text, With<ConfiguratorHud>>) {
    for mut text in q.iter_mut() {
        text.0 = format!(
            "Density {:.2} (Up/Down)\nTriangles {}\nFPS {}",
            cfg.density,
            format_thousands(cfg.triangle_count() as u64),
            format_thousands(cfg.fps() as u64)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn density_curve_endpoints() {
        assert_eq!(triangle_count_for_density(0.0), 100);
        assert_eq!(triangle_count_for_density(1.0), 3_276_800);
        assert!((triangle_extent_for_density(0.0) - 4.0).abs() < 1e-6);
        assert!((triangle_extent_for_density(1.0) - 4.0 / 101.0).abs() < 1e-6);
    }

    #[test]
    fn thousands_separator() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(3_276_800), "3,276,800");
    }

    #[test]
    fn adjust_clamps_to_unit_range() {
        let mut c = DensityConfigurator::default();
        c.adjust(-1000.0);
        assert_eq!(c.density, 0.0);
        c.adjust(1000.0);
        assert_eq!(c.density, 1.0);
    }

    #[test]
    fn held_sweep_is_frame_rate_independent() {
        let mut coarse = DensityConfigurator::default();
        let mut fine = DensityConfigurator::default();
        coarse.sweep(1.0, 0.4);
        for _ in 0..40 {
            fine.sweep(1.0, 0.01);
        }
        assert!((coarse.density - 0.35).abs() < 1e-5);
        assert!((coarse.density - fine.density).abs() < 1e-4);
        coarse.sweep(-1.0, 100.0);
        assert_eq!(coarse.density, 0.0);
    }

    #[test]
    fn frame_rate_smoothing_seeds_then_lerps() {
        let mut c = DensityConfigurator::default();
        assert_eq!(c.fps(), 0);
        c.record_frame(0.02);
        assert_eq!(c.fps(), 50);
        c.record_frame(0.01);
        assert!((c.smoothed_dt - 0.0199).abs() < 1e-6);
    }
}
