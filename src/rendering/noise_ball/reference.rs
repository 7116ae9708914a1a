//! CPU mirror of `noise_ball_compute.wgsl`.
//!
//! Used by tests and the OBJ export tool; the running effect never builds geometry on the CPU.
//! Keep the hash, sphere sampling and noise in lockstep with the WGSL kernels.
use bevy::prelude::*;
use std::f32::consts::TAU;

use super::gpu::FLOATS_PER_VERTEX;
use super::params::{NoiseBallParameters, BALL_RADIUS};

/// PCG-style integer hash (matches `pcg_hash` in WGSL, all arithmetic wrapping).
pub fn pcg_hash(v: u32) -> u32 {
    let state = v.wrapping_mul(747_796_405).wrapping_add(2_891_336_453);
    let word = ((state >> ((state >> 28) + 4)) ^ state).wrapping_mul(277_803_737);
    (word >> 22) ^ word
}

pub fn random01(seed: u32) -> f32 {
    pcg_hash(seed) as f32 / 4_294_967_295.0
}

/// Uniformly distributed point on the unit sphere; consumes seeds `seed` and `seed + 1`.
pub fn random_point(seed: u32) -> Vec3 {
    let z = random01(seed) * 2.0 - 1.0;
    let t = random01(seed.wrapping_add(1)) * TAU;
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * t.cos(), r * t.sin(), z)
}

fn safe_normalize(v: Vec3, fallback: Vec3) -> Vec3 {
    let len = v.length();
    if len > 1e-6 {
        v / len
    } else {
        fallback
    }
}

fn corner_gradient(c: IVec3) -> Vec3 {
    let h = pcg_hash((c.x as u32) ^ pcg_hash((c.y as u32) ^ pcg_hash(c.z as u32)));
    random_point(h)
}

/// Gradient noise with quintic fade, roughly in [-1, 1].
pub fn gradient_noise(p: Vec3) -> f32 {
    let i = p.floor();
    let f = p - i;
    let c = IVec3::new(i.x as i32, i.y as i32, i.z as i32);
    let u = f * f * f * (f * (f * 6.0 - 15.0) + 10.0);
    let corner = |o: IVec3| corner_gradient(c + o).dot(f - o.as_vec3());

    let x00 = lerp(corner(IVec3::new(0, 0, 0)), corner(IVec3::new(1, 0, 0)), u.x);
    let x10 = lerp(corner(IVec3::new(0, 1, 0)), corner(IVec3::new(1, 1, 0)), u.x);
    let x01 = lerp(corner(IVec3::new(0, 0, 1)), corner(IVec3::new(1, 0, 1)), u.x);
    let x11 = lerp(corner(IVec3::new(0, 1, 1)), corner(IVec3::new(1, 1, 1)), u.x);
    let y0 = lerp(x00, x10, u.y);
    let y1 = lerp(x01, x11, u.y);
    lerp(y0, y1, u.z)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// One triangle's positions and shared face normal (kernel 0 body).
pub fn build_triangle(id: u32, params: &NoiseBallParameters, noise_offset: Vec3) -> ([Vec3; 3], Vec3) {
    let seed = id.wrapping_mul(6);
    let p1 = random_point(seed);
    let p2 = random_point(seed.wrapping_add(2));
    let p3 = random_point(seed.wrapping_add(4));
    let extent = params.triangle_extent;
    let p2 = safe_normalize(p1 + safe_normalize(p2 - p1, Vec3::ZERO) * extent, p1);
    let p3 = safe_normalize(p1 + safe_normalize(p3 - p1, Vec3::ZERO) * extent, p1);

    let displace = |p: Vec3| {
        let n = gradient_noise(p * params.noise_frequency + noise_offset);
        p * BALL_RADIUS * (1.0 + n * params.noise_amplitude)
    };
    let v = [displace(p1), displace(p2), displace(p3)];
    let normal = safe_normalize((v[1] - v[0]).cross(v[2] - v[1]), p1);
    (v, normal)
}

/// Interleaved vertex buffer contents, identical layout to the GPU vertex buffer.
pub fn build_vertices(params: &NoiseBallParameters, noise_offset: Vec3) -> Vec<f32> {
    let mut out = Vec::with_capacity(params.vertex_count() as usize * FLOATS_PER_VERTEX);
    for id in 0..params.triangle_count {
        let (v, n) = build_triangle(id, params, noise_offset);
        for p in v {
            out.extend_from_slice(&[p.x, p.y, p.z, n.x, n.y, n.z]);
        }
    }
    out
}

/// Index buffer contents (kernel 1): identity topology.
pub fn build_indices(triangle_count: u32) -> Vec<u32> {
    (0..triangle_count.saturating_mul(3)).collect()
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl ReferenceMesh {
    pub fn build(params: &NoiseBallParameters, noise_offset: Vec3) -> Self {
        let params = params.sanitized();
        let raw = build_vertices(&params, noise_offset);
        let (positions, normals) = raw
            .chunks_exact(FLOATS_PER_VERTEX)
            .map(|c| (Vec3::new(c[0], c[1], c[2]), Vec3::new(c[3], c[4], c[5])))
            .unzip();
        Self {
            positions,
            normals,
            indices: build_indices(params.triangle_count),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic_and_spreads() {
        assert_eq!(pcg_hash(0), pcg_hash(0));
        assert_ne!(pcg_hash(0), pcg_hash(1));
        let r = random01(12345);
        assert!((0.0..=1.0).contains(&r));
    }

    #[test]
    fn random_points_lie_on_unit_sphere() {
        for seed in (0..2000).step_by(7) {
            let p = random_point(seed);
            assert!((p.length() - 1.0).abs() < 1e-4, "seed {seed} -> {p:?}");
        }
    }

    #[test]
    fn noise_is_zero_on_lattice_and_bounded() {
        assert!(gradient_noise(Vec3::new(3.0, -2.0, 5.0)).abs() < 1e-6);
        for i in 0..500 {
            let p = Vec3::new(i as f32 * 0.173, i as f32 * -0.291, i as f32 * 0.057);
            let n = gradient_noise(p);
            assert!(n.abs() <= 1.0, "noise {n} at {p:?}");
        }
    }

    #[test]
    fn triangles_stay_inside_bounds_with_unit_normals() {
        let params = NoiseBallParameters { triangle_count: 256, ..default() };
        let mesh = ReferenceMesh::build(&params, Vec3::new(0.3, 1.7, -0.4));
        let half = params.bounds_half_extent();
        assert_eq!(mesh.positions.len(), 768);
        for p in &mesh.positions {
            assert!(p.abs().max_element() <= half + 1e-4, "{p:?} outside {half}");
        }
        for n in &mesh.normals {
            assert!((n.length() - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn zero_amplitude_keeps_vertices_on_sphere() {
        let params = NoiseBallParameters { triangle_count: 64, noise_amplitude: 0.0, ..default() };
        let mesh = ReferenceMesh::build(&params, Vec3::ZERO);
        for p in &mesh.positions {
            assert!((p.length() - BALL_RADIUS).abs() < 1e-4);
        }
    }

    #[test]
    fn indices_are_identity() {
        assert_eq!(build_indices(2), vec![0, 1, 2, 3, 4, 5]);
    }
}
