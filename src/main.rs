use bevy::prelude::*;

use noise_ball::app::DensityConfigurator;
use noise_ball::{
    ConfigHotReloadPlugin, DensityConfiguratorPlugin, NoiseBallConfig, NoiseBallDiagnosticsPlugin,
    NoiseBallPlugin, ViewerPlugin,
};

const CONFIG_LAYERS: [&str; 2] = ["assets/config/noise_ball.ron", "assets/config/noise_ball.local.ron"];

fn main() {
    // Base file plus optional local override; fall back to defaults if neither loads.
    let (cfg, used, errors) = NoiseBallConfig::load_layered(CONFIG_LAYERS);
    let warnings = cfg.validate();

    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: cfg.window.title.clone(),
            resolution: (cfg.window.width, cfg.window.height).into(),
            resizable: true,
            ..default()
        }),
        ..default()
    }));

    // Logging is only available once LogPlugin has been built.
    if used.is_empty() {
        warn!(target: "noise_ball", "no config file found in {CONFIG_LAYERS:?}; using defaults");
    } else {
        info!(target: "noise_ball", "config layers loaded: {used:?}");
    }
    for e in &errors {
        warn!(target: "noise_ball", "config: {e}");
    }
    for w in &warnings {
        warn!(target: "noise_ball", "config: {w}");
    }

    app.insert_resource(cfg.diagnostics.clone())
        .insert_resource(DensityConfigurator::from_config(&cfg.configurator))
        .insert_resource(cfg)
        .add_plugins((
            NoiseBallPlugin,
            ViewerPlugin,
            DensityConfiguratorPlugin,
            ConfigHotReloadPlugin,
            NoiseBallDiagnosticsPlugin,
        ));

    #[cfg(feature = "debug")]
    app.add_plugins(noise_ball::debug::DebugPlugin);

    app.run();
}
