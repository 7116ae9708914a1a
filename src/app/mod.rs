pub mod configurator;
pub mod hot_reload;
pub mod viewer;

pub use configurator::{DensityConfigurator, DensityConfiguratorPlugin};
pub use hot_reload::ConfigHotReloadPlugin;
pub use viewer::ViewerPlugin;
