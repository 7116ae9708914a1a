#![cfg(feature = "debug")]
use bevy::prelude::*;
use noise_ball::debug::keys::debug_key_input_system;
use noise_ball::debug::DebugState;
use noise_ball::{NoiseBall, NoiseBallParameters};

fn app() -> App {
    let mut app = App::new();
    // Insert only the resources we need.
    app.insert_resource(ButtonInput::<KeyCode>::default());
    app.insert_resource(Time::<Virtual>::default());
    app.init_resource::<DebugState>();
    app.add_systems(Update, debug_key_input_system);
    app
}

fn tap(app: &mut App, key: KeyCode) {
    app.world_mut().resource_mut::<ButtonInput<KeyCode>>().press(key);
    app.update();
    let mut input = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
    input.release(key);
    input.clear();
}

#[test]
fn space_toggles_virtual_time_pause() {
    let mut app = app();
    tap(&mut app, KeyCode::Space);
    assert!(app.world().resource::<Time<Virtual>>().is_paused());
    tap(&mut app, KeyCode::Space);
    assert!(!app.world().resource::<Time<Virtual>>().is_paused());
    assert_eq!(app.world().resource::<DebugState>().toggles, 2);
}

#[test]
fn v_toggles_ball_visibility() {
    let mut app = app();
    let e = app.world_mut().spawn(NoiseBall::new(NoiseBallParameters::default())).id();
    tap(&mut app, KeyCode::KeyV);
    assert_eq!(app.world().get::<Visibility>(e), Some(&Visibility::Hidden));
    tap(&mut app, KeyCode::KeyV);
    assert_eq!(app.world().get::<Visibility>(e), Some(&Visibility::Inherited));
}
