use bevy::prelude::*;
use serde::Deserialize;
use std::{fs, path::Path};

use crate::core::components::NoiseBallMaterial;
use crate::rendering::noise_ball::NoiseBallParameters;

#[derive(Debug, Deserialize, Resource, Clone, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
    pub title: String,
}
impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            title: "Noise Ball".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MaterialConfig {
    /// Linear RGBA.
    pub base_color: [f32; 4],
    pub ambient: f32,
    pub light_direction: [f32; 3],
}
impl Default for MaterialConfig {
    fn default() -> Self {
        let m = NoiseBallMaterial::default();
        Self {
            base_color: [m.base_color.red, m.base_color.green, m.base_color.blue, m.base_color.alpha],
            ambient: m.ambient,
            light_direction: m.light_direction.to_array(),
        }
    }
}
impl MaterialConfig {
    pub fn to_material(&self) -> NoiseBallMaterial {
        let [r, g, b, a] = self.base_color;
        NoiseBallMaterial {
            base_color: LinearRgba::new(r, g, b, a),
            ambient: self.ambient,
            light_direction: Vec3::from_array(self.light_direction),
        }
    }
}

#[derive(Debug, Deserialize, Resource, Clone, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub distance: f32,
    pub height: f32,
    /// Radians per second around the Y axis; 0 disables orbiting.
    pub orbit_speed: f32,
}
impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            distance: 3.0,
            height: 0.6,
            orbit_speed: 0.15,
        }
    }
}

#[derive(Debug, Deserialize, Resource, Clone, PartialEq)]
#[serde(default)]
pub struct ConfiguratorConfig {
    pub enabled: bool,
    pub density: f32,
    /// Density change per key tap.
    pub step: f32,
    /// Density change per second while a key is held.
    pub sweep_per_second: f32,
}
impl Default for ConfiguratorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            density: 0.25,
            step: 0.01,
            sweep_per_second: 0.25,
        }
    }
}

#[derive(Debug, Deserialize, Resource, Clone, PartialEq)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub enabled: bool,
    /// Frames between periodic logs.
    pub log_every_n_frames: u32,
    /// Stop periodic logging after this frame (inclusive). 0 = unlimited.
    pub max_frames_logging: u64,
}
impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_every_n_frames: 300,
            max_frames_logging: 0,
        }
    }
}

#[derive(Debug, Deserialize, Resource, Clone, PartialEq, Default)]
#[serde(default)]
pub struct NoiseBallConfig {
    pub window: WindowConfig,
    pub ball: NoiseBallParameters,
    pub material: MaterialConfig,
    pub camera: CameraConfig,
    pub configurator: ConfiguratorConfig,
    pub diagnostics: DiagnosticsConfig,
}

impl NoiseBallConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| format!("read config {}: {e}", path.display()))?;
        ron::from_str(&data).map_err(|e| format!("parse RON {}: {e}", path.display()))
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<String>) {
        match Self::load_from_file(&path) {
            Ok(cfg) => (cfg, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Merge several RON files (later files override earlier keys) into one config.
    /// Returns (config, files used, errors). Missing files are skipped; unreadable or
    /// unparsable ones are reported.
    pub fn load_layered<P, I>(paths: I) -> (Self, Vec<String>, Vec<String>)
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = P>,
    {
        use ron::value::Value;
        let mut merged: Option<Value> = None;
        let mut used = Vec::new();
        let mut errors = Vec::new();
        fn merge_value(base: &mut Value, overlay: Value) {
            match (base, overlay) {
                (Value::Map(bm), Value::Map(om)) => {
                    for (k, v) in om.into_iter() {
                        let mut incoming = Some(v);
                        for (ek, ev) in bm.iter_mut() {
                            if *ek == k {
                                if let Some(val) = incoming.take() {
                                    merge_value(ev, val);
                                }
                                break;
                            }
                        }
                        if let Some(val) = incoming {
                            bm.insert(k, val);
                        }
                    }
                }
                (b, o) => *b = o,
            }
        }
        for p in paths {
            let path_ref = p.as_ref();
            match fs::read_to_string(path_ref) {
                Ok(txt) => match ron::from_str::<Value>(&txt) {
                    Ok(val) => {
                        match &mut merged {
                            Some(cur) => merge_value(cur, val),
                            None => merged = Some(val),
                        }
                        used.push(path_ref.display().to_string());
                    }
                    Err(e) => errors.push(format!("{}: parse error: {e}", path_ref.display())),
                },
                // Optional layers (e.g. the `.local` override) are simply absent in most checkouts.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(target: "noise_ball", "config layer {} not present", path_ref.display());
                }
                Err(e) => errors.push(format!("{}: read error: {e}", path_ref.display())),
            }
        }
        let Some(val) = merged else {
            return (Self::default(), used, errors);
        };
        match val.into_rust::<NoiseBallConfig>() {
            Ok(cfg) => (cfg, used, errors),
            Err(e) => {
                errors.push(format!("failed to deserialize merged config; using defaults: {e}"));
                (Self::default(), used, errors)
            }
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut w = Vec::new();
        if self.window.width <= 0.0 || self.window.height <= 0.0 {
            w.push("window dimensions must be > 0".into());
        }
        let b = &self.ball;
        if b.triangle_count == 0 {
            w.push("ball.triangle_count is 0; clamped to 1".into());
        }
        if b.triangle_count > 2_000_000 {
            w.push(format!(
                "ball.triangle_count {} very high; may exceed device storage binding limits",
                b.triangle_count
            ));
        }
        if b.triangle_extent <= 0.0 {
            w.push(format!("ball.triangle_extent {} must be > 0 (degenerate triangles)", b.triangle_extent));
        } else if b.triangle_extent > 2.0 {
            w.push(format!("ball.triangle_extent {} larger than the sphere diameter", b.triangle_extent));
        }
        if b.noise_frequency < 0.0 {
            w.push(format!("ball.noise_frequency {} negative", b.noise_frequency));
        }
        if b.noise_amplitude < 0.0 {
            w.push(format!("ball.noise_amplitude {} negative -> inverted displacement", b.noise_amplitude));
        } else if b.noise_amplitude > 4.0 {
            w.push(format!("ball.noise_amplitude {} very large (surface folds through centre)", b.noise_amplitude));
        }
        if !b.noise_animation.is_finite() {
            w.push("ball.noise_animation must be finite".into());
        }
        if !(0.0..=1.0).contains(&self.material.ambient) {
            w.push(format!("material.ambient {} outside 0..1", self.material.ambient));
        }
        if Vec3::from_array(self.material.light_direction).length_squared() < 1e-8 {
            w.push("material.light_direction is zero; falling back to +Y".into());
        }
        if self.camera.distance <= 0.0 {
            w.push("camera.distance must be > 0".into());
        }
        if !(0.0..=1.0).contains(&self.configurator.density) {
            w.push(format!("configurator.density {} outside 0..1; clamped", self.configurator.density));
        }
        if self.configurator.step <= 0.0 {
            w.push("configurator.step must be > 0".into());
        }
        if self.configurator.sweep_per_second < 0.0 {
            w.push("configurator.sweep_per_second negative; using its magnitude".into());
        }
        if self.diagnostics.enabled && self.diagnostics.log_every_n_frames == 0 {
            w.push("diagnostics.log_every_n_frames is 0; periodic logs disabled".into());
        }
        w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_warnings() {
        assert!(NoiseBallConfig::default().validate().is_empty());
    }

    #[test]
    fn partial_ron_keeps_defaults() {
        let cfg: NoiseBallConfig = ron::from_str("(ball: (triangle_count: 42))").unwrap();
        assert_eq!(cfg.ball.triangle_count, 42);
        assert_eq!(cfg.ball.noise_frequency, NoiseBallParameters::default().noise_frequency);
        assert_eq!(cfg.window, WindowConfig::default());
    }

    #[test]
    fn validate_flags_bad_values() {
        let mut cfg = NoiseBallConfig::default();
        cfg.ball.triangle_count = 0;
        cfg.ball.triangle_extent = -1.0;
        cfg.material.ambient = 2.0;
        let w = cfg.validate();
        assert_eq!(w.len(), 3, "{w:?}");
    }

    #[test]
    fn material_config_round_trips_default() {
        assert_eq!(MaterialConfig::default().to_material(), NoiseBallMaterial::default());
    }
}
