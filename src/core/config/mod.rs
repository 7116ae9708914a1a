pub mod config;

pub use config::{
    CameraConfig, ConfiguratorConfig, DiagnosticsConfig, MaterialConfig, NoiseBallConfig,
    WindowConfig,
};
