use bevy::prelude::*;

use noise_ball::rendering::noise_ball::ReferenceMesh;
use noise_ball::NoiseBallParameters;

#[test]
fn generation_is_deterministic() {
    let params = NoiseBallParameters { triangle_count: 128, ..default() };
    let a = ReferenceMesh::build(&params, Vec3::new(0.0, 0.5, 1.0));
    let b = ReferenceMesh::build(&params, Vec3::new(0.0, 0.5, 1.0));
    assert_eq!(a.positions, b.positions);
    assert_eq!(a.normals, b.normals);
}

#[test]
fn noise_offset_moves_the_surface() {
    let params = NoiseBallParameters { triangle_count: 32, ..default() };
    let a = ReferenceMesh::build(&params, Vec3::ZERO);
    let b = ReferenceMesh::build(&params, params.noise_animation * 1.5);
    assert_eq!(a.positions.len(), b.positions.len());
    assert_ne!(a.positions, b.positions);
}

#[test]
fn growing_triangle_count_keeps_existing_triangles() {
    // Triangle i depends only on its id, so a prefix is stable.
    let small = ReferenceMesh::build(&NoiseBallParameters { triangle_count: 10, ..default() }, Vec3::ZERO);
    let large = ReferenceMesh::build(&NoiseBallParameters { triangle_count: 20, ..default() }, Vec3::ZERO);
    assert_eq!(small.positions[..], large.positions[..30]);
    assert_eq!(large.triangle_count(), 20);
    assert_eq!(large.indices, (0..60).collect::<Vec<u32>>());
}

#[test]
fn zero_triangles_build_one() {
    let mesh = ReferenceMesh::build(&NoiseBallParameters { triangle_count: 0, ..default() }, Vec3::ZERO);
    assert_eq!(mesh.triangle_count(), 1);
    assert_eq!(mesh.positions.len(), 3);
}
