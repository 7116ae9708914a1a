pub mod app;
pub mod core;
pub mod debug;
pub mod rendering;

// Curated re-exports
pub use crate::app::{ConfigHotReloadPlugin, DensityConfigurator, DensityConfiguratorPlugin, ViewerPlugin};
pub use crate::core::components::{ConfiguredNoiseBall, NoiseBall, NoiseBallMaterial, NoiseOffset};
pub use crate::core::config::{NoiseBallConfig, WindowConfig};
pub use crate::debug::NoiseBallDiagnosticsPlugin;
pub use crate::rendering::noise_ball::{NoiseBallParameters, NoiseBallPlugin, NoiseBallSimulationPlugin};
