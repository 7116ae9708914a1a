//! Diagnostics (always built) and debug key bindings (`--features debug`).

pub mod diagnostics;
#[cfg(feature = "debug")]
pub mod keys; // pub for testing

pub use diagnostics::NoiseBallDiagnosticsPlugin;
#[cfg(feature = "debug")]
pub use keys::DebugState;

#[cfg(feature = "debug")]
use bevy::prelude::*;

#[cfg(feature = "debug")]
pub struct DebugPlugin;

#[cfg(feature = "debug")]
impl Plugin for DebugPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DebugState>()
            .add_systems(Update, keys::debug_key_input_system);
    }
}
