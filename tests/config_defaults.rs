use std::fs;

use noise_ball::core::config::NoiseBallConfig;
use noise_ball::NoiseBallParameters;

#[test]
fn shipped_config_parses_and_validates() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/config/noise_ball.ron");
    let cfg = NoiseBallConfig::load_from_file(path).expect("shipped config must parse");
    assert!(cfg.validate().is_empty(), "{:?}", cfg.validate());
    assert_eq!(cfg.ball, NoiseBallParameters::default());
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (cfg, err) = NoiseBallConfig::load_or_default(dir.path().join("nope.ron"));
    assert_eq!(cfg, NoiseBallConfig::default());
    assert!(err.is_some());
}

#[test]
fn local_layer_overrides_nested_keys_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base = dir.path().join("noise_ball.ron");
    let local = dir.path().join("noise_ball.local.ron");
    fs::write(
        &base,
        "(ball: (triangle_count: 500, noise_frequency: 3.0), camera: (distance: 5.0))",
    )
    .expect("write base");
    fs::write(&local, "(ball: (triangle_count: 900))").expect("write local");

    let (cfg, used, errors) = NoiseBallConfig::load_layered([&base, &local]);
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(used.len(), 2);
    assert_eq!(cfg.ball.triangle_count, 900);
    assert_eq!(cfg.ball.noise_frequency, 3.0);
    assert_eq!(cfg.camera.distance, 5.0);
    assert_eq!(cfg.ball.noise_amplitude, NoiseBallParameters::default().noise_amplitude);
}

#[test]
fn missing_local_layer_is_skipped_silently() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base = dir.path().join("noise_ball.ron");
    fs::write(&base, "(ball: (noise_amplitude: 0.1))").expect("write base");
    let (cfg, used, errors) = NoiseBallConfig::load_layered([base.clone(), dir.path().join("absent.ron")]);
    assert_eq!(used.len(), 1);
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(cfg.ball.noise_amplitude, 0.1);
}

#[test]
fn broken_layer_is_still_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base = dir.path().join("noise_ball.ron");
    let local = dir.path().join("noise_ball.local.ron");
    fs::write(&base, "(ball: (noise_amplitude: 0.1))").expect("write base");
    fs::write(&local, "(ball: (").expect("write local");
    let (cfg, used, errors) = NoiseBallConfig::load_layered([base, local]);
    assert_eq!(used.len(), 1);
    assert_eq!(errors.len(), 1);
    assert_eq!(cfg.ball.noise_amplitude, 0.1);
}

#[test]
fn no_layers_present_gives_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (cfg, used, errors) = NoiseBallConfig::load_layered([dir.path().join("a.ron"), dir.path().join("b.ron")]);
    assert!(used.is_empty() && errors.is_empty());
    assert_eq!(cfg, NoiseBallConfig::default());
}

#[test]
fn unparsable_file_yields_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bad.ron");
    fs::write(&path, "(ball: (triangle_count: \"many\"))").expect("write");
    assert!(NoiseBallConfig::load_from_file(&path).is_err());
}
