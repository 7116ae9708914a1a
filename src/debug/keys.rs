#[cfg(feature = "debug")]
use bevy::prelude::*;

#[cfg(feature = "debug")]
use crate::core::components::NoiseBall;

#[cfg(feature = "debug")]
#[derive(Resource, Debug, Default)]
pub struct DebugState {
    pub balls_hidden: bool,
    pub toggles: u32,
}

/// Space: pause/resume virtual time (freezes the noise animation). V: hide/show balls.
#[cfg(feature = "debug")]
pub fn debug_key_input_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut state: ResMut<DebugState>,
    mut time: ResMut<Time<Virtual>>,
    mut q: Query<&mut Visibility, With<NoiseBall>>,
) {
    if keys.just_pressed(KeyCode::Space) {
        if time.is_paused() {
            time.unpause();
        } else {
            time.pause();
        }
        state.toggles += 1;
        info!(target: "noise_ball", "animation {}", if time.is_paused() { "paused" } else { "resumed" });
    }
    if keys.just_pressed(KeyCode::KeyV) {
        state.balls_hidden = !state.balls_hidden;
        state.toggles += 1;
        let vis = if state.balls_hidden { Visibility::Hidden } else { Visibility::Inherited };
        for mut v in q.iter_mut() {
            v.set_if_neq(vis);
        }
    }
}
