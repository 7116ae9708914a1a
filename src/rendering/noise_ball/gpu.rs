//! GPU data/layout types and constants for the noise ball passes.
//! Kept free of render-world resources so layouts can be checked in tests.
use bevy::prelude::*;
use bytemuck::{Pod, Zeroable};

use super::params::NoiseBallParameters;

/// Threads per workgroup for both kernels (`@workgroup_size(64)` in WGSL).
pub const WORKGROUP_SIZE: u32 = 64;
/// Interleaved float32x3 position + float32x3 normal.
pub const VERTEX_STRIDE: u64 = 24;
pub const FLOATS_PER_VERTEX: usize = 6;
pub const INDEX_STRIDE: u64 = 4;

/// Number of workgroups covering `threads` invocations.
pub fn dispatch_groups(threads: u32, group_size: u32) -> u32 {
    if group_size == 0 {
        return 0;
    }
    threads.div_ceil(group_size)
}

/// Largest triangle count whose vertex buffer fits a single storage binding and whose
/// dispatch stays within the device's per-dimension workgroup limit.
pub fn max_triangles_for_limit(max_storage_binding_bytes: u64, max_workgroups_per_dimension: u32) -> u32 {
    let by_binding = max_storage_binding_bytes / (3 * VERTEX_STRIDE);
    let by_dispatch = max_workgroups_per_dimension as u64 * WORKGROUP_SIZE as u64;
    by_binding.min(by_dispatch).min(u32::MAX as u64) as u32
}

/// Byte sizes of the vertex/index pair for one triangle count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshLayout {
    pub triangle_count: u32,
    pub vertex_count: u32,
    pub vertex_bytes: u64,
    pub index_bytes: u64,
}

impl MeshLayout {
    pub fn for_triangles(triangle_count: u32) -> Self {
        let vertex_count = triangle_count.saturating_mul(3);
        Self {
            triangle_count,
            vertex_count,
            vertex_bytes: vertex_count as u64 * VERTEX_STRIDE,
            index_bytes: vertex_count as u64 * INDEX_STRIDE,
        }
    }
}

// v0: (triangle_count, triangle_extent, noise_frequency, noise_amplitude)
// v1: (noise_offset.xyz, pad)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct NoiseBallParamsGpu {
    pub triangle_count: u32,
    pub triangle_extent: f32,
    pub noise_frequency: f32,
    pub noise_amplitude: f32,
    pub noise_offset: [f32; 3],
    pub _pad0: f32,
}

impl NoiseBallParamsGpu {
    pub fn new(params: &NoiseBallParameters, noise_offset: Vec3) -> Self {
        Self {
            triangle_count: params.triangle_count,
            triangle_extent: params.triangle_extent,
            noise_frequency: params.noise_frequency,
            noise_amplitude: params.noise_amplitude,
            noise_offset: noise_offset.to_array(),
            _pad0: 0.0,
        }
    }
}

/// Per view, per ball draw uniform.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct NoiseBallDrawGpu {
    pub clip_from_local: [[f32; 4]; 4],
    pub world_from_local: [[f32; 4]; 4],
    pub base_color: [f32; 4],
    /// (light_dir.xyz normalized, ambient)
    pub light: [f32; 4],
}

impl NoiseBallDrawGpu {
    pub fn new(
        clip_from_world: Mat4,
        world_from_local: Mat4,
        base_color: LinearRgba,
        light_direction: Vec3,
        ambient: f32,
    ) -> Self {
        let dir = light_direction.try_normalize().unwrap_or(Vec3::Y);
        Self {
            clip_from_local: (clip_from_world * world_from_local).to_cols_array_2d(),
            world_from_local: world_from_local.to_cols_array_2d(),
            base_color: [base_color.red, base_color.green, base_color.blue, base_color.alpha],
            light: [dir.x, dir.y, dir.z, ambient.clamp(0.0, 1.0)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_rounds_up_to_whole_groups() {
        assert_eq!(dispatch_groups(1, WORKGROUP_SIZE), 1);
        assert_eq!(dispatch_groups(64, WORKGROUP_SIZE), 1);
        assert_eq!(dispatch_groups(65, WORKGROUP_SIZE), 2);
        assert_eq!(dispatch_groups(10_000, WORKGROUP_SIZE), 157);
        assert_eq!(dispatch_groups(0, WORKGROUP_SIZE), 0);
    }

    #[test]
    fn uniform_sizes_are_16_byte_multiples() {
        assert_eq!(std::mem::size_of::<NoiseBallParamsGpu>(), 32);
        assert_eq!(std::mem::size_of::<NoiseBallDrawGpu>() % 16, 0);
        assert_eq!(std::mem::size_of::<NoiseBallDrawGpu>(), 160);
    }

    #[test]
    fn layout_scales_with_triangles() {
        let l = MeshLayout::for_triangles(1000);
        assert_eq!(l.vertex_count, 3000);
        assert_eq!(l.vertex_bytes, 72_000);
        assert_eq!(l.index_bytes, 12_000);
    }

    #[test]
    fn triangle_cap_respects_binding_and_dispatch_limits() {
        // 128 MiB default binding limit
        let cap = max_triangles_for_limit(128 << 20, 65_535);
        assert_eq!(cap, (128u64 << 20) as u32 / 72);
        assert!(MeshLayout::for_triangles(cap).vertex_bytes <= 128 << 20);
        // Huge binding limit -> dispatch bound wins, and follows the device value.
        assert_eq!(max_triangles_for_limit(u64::MAX, 65_535), 65_535 * 64);
        assert_eq!(max_triangles_for_limit(u64::MAX, 1_024), 1_024 * 64);
    }
}
