//! Render-world GPU buffers for each ball.
//!
//! The vertex and index buffers are storage buffers (compute writes them) that double as the
//! draw-time vertex/index buffers, so no copy happens between generation and rendering.
use bevy::prelude::*;
use bevy::render::render_resource::{BindGroup, Buffer, BufferDescriptor, BufferUsages};
use bevy::render::renderer::RenderDevice;
use std::collections::HashMap;

use super::gpu::{MeshLayout, NoiseBallParamsGpu};

pub struct GpuNoiseBallMesh {
    pub layout: MeshLayout,
    pub vertex_buffer: Buffer,
    pub index_buffer: Buffer,
    pub params_buffer: Buffer,
    /// Compute bind group; rebuilt together with the buffers.
    pub bind_group: Option<BindGroup>,
}

impl GpuNoiseBallMesh {
    pub fn allocate(render_device: &RenderDevice, triangle_count: u32) -> Self {
        let layout = MeshLayout::for_triangles(triangle_count);
        let vertex_buffer = render_device.create_buffer(&BufferDescriptor {
            label: Some("noise_ball.vertices"),
            size: layout.vertex_bytes,
            usage: BufferUsages::STORAGE | BufferUsages::VERTEX,
            mapped_at_creation: false,
        });
        let index_buffer = render_device.create_buffer(&BufferDescriptor {
            label: Some("noise_ball.indices"),
            size: layout.index_bytes,
            usage: BufferUsages::STORAGE | BufferUsages::INDEX,
            mapped_at_creation: false,
        });
        let params_buffer = render_device.create_buffer(&BufferDescriptor {
            label: Some("noise_ball.params"),
            size: std::mem::size_of::<NoiseBallParamsGpu>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            layout,
            vertex_buffer,
            index_buffer,
            params_buffer,
            bind_group: None,
        }
    }

    pub fn vertex_count(&self) -> u32 {
        self.layout.vertex_count
    }
}

/// Buffers keyed by main-world entity.
#[derive(Resource, Default)]
pub struct NoiseBallMeshes(pub HashMap<Entity, GpuNoiseBallMesh>);

/// A mesh is (re)built when missing or when its vertex count no longer matches.
pub fn needs_reset(existing_vertex_count: Option<u32>, triangle_count: u32) -> bool {
    match existing_vertex_count {
        None => true,
        Some(vc) => vc != triangle_count.saturating_mul(3),
    }
}

/// Buffer work for one frame, computed without touching the GPU.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MeshPlan {
    /// Entities whose buffers are dropped (no longer extracted: despawned or hidden).
    pub release: Vec<Entity>,
    /// Entities needing fresh buffers, with their triangle count.
    pub allocate: Vec<(Entity, u32)>,
}

/// `existing` yields (entity, vertex count) of live meshes; `wanted` yields (entity, triangle
/// count) of this frame's balls.
pub fn plan_mesh_updates(
    existing: impl IntoIterator<Item = (Entity, u32)>,
    wanted: impl IntoIterator<Item = (Entity, u32)>,
) -> MeshPlan {
    let mut live: HashMap<Entity, u32> = existing.into_iter().collect();
    let mut plan = MeshPlan::default();
    for (entity, triangle_count) in wanted {
        if needs_reset(live.remove(&entity), triangle_count) {
            plan.allocate.push((entity, triangle_count));
        }
    }
    plan.release = live.into_keys().collect();
    plan.release.sort();
    plan
}

/// Frame counters surfaced through diagnostics.
#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct NoiseBallRenderStats {
    pub live_meshes: usize,
    pub reallocations: u64,
    pub released: u64,
    /// Triangles generated this frame across all balls.
    pub dispatched_triangles: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_when_missing_or_count_changes() {
        assert!(needs_reset(None, 10));
        assert!(!needs_reset(Some(30), 10));
        assert!(needs_reset(Some(30), 11));
        assert!(needs_reset(Some(3), 2));
    }

    #[test]
    fn plan_reallocates_only_on_count_change() {
        let a = Entity::from_raw(1);
        let b = Entity::from_raw(2);
        let plan = plan_mesh_updates([(a, 30), (b, 30)], [(a, 10), (b, 12)]);
        assert_eq!(plan.allocate, vec![(b, 12)]);
        assert!(plan.release.is_empty());
    }

    #[test]
    fn plan_allocates_new_and_releases_vanished() {
        let kept = Entity::from_raw(1);
        let gone = Entity::from_raw(2);
        let fresh = Entity::from_raw(3);
        let plan = plan_mesh_updates([(kept, 3), (gone, 3)], [(kept, 1), (fresh, 5)]);
        assert_eq!(plan.allocate, vec![(fresh, 5)]);
        assert_eq!(plan.release, vec![gone]);
    }

    #[test]
    fn plan_releases_everything_when_nothing_extracted() {
        let a = Entity::from_raw(4);
        let plan = plan_mesh_updates([(a, 300)], std::iter::empty());
        assert_eq!(plan, MeshPlan { release: vec![a], allocate: vec![] });
    }
}
