//! Compute side of the per-frame protocol: resize buffers, push uniforms, dispatch both kernels.
use bevy::prelude::*;
use bevy::render::{
    render_graph::{self, RenderLabel},
    render_resource::*,
    renderer::{RenderContext, RenderDevice, RenderQueue},
};
use std::borrow::Cow;

use super::extract::ExtractedNoiseBalls;
use super::gpu::{dispatch_groups, max_triangles_for_limit, NoiseBallParamsGpu, WORKGROUP_SIZE};
use super::mesh::{plan_mesh_updates, GpuNoiseBallMesh, NoiseBallMeshes, NoiseBallRenderStats};
use super::shaders::{shader_ready, NoiseBallShaders};

#[derive(Resource)]
pub struct NoiseBallComputePipeline {
    pub bind_group_layout: BindGroupLayout,
    /// Kernel 0.
    pub vertices_pipeline: CachedComputePipelineId,
    /// Kernel 1.
    pub indices_pipeline: CachedComputePipelineId,
}

#[derive(Debug, Hash, PartialEq, Eq, Clone, RenderLabel)]
pub struct NoiseBallComputeLabel;

pub fn create_compute_pipeline(world: &mut World) {
    if world.contains_resource::<NoiseBallComputePipeline>() {
        return;
    }
    let Some(shaders) = world.get_resource::<NoiseBallShaders>() else {
        return;
    };
    let shader = shaders.compute.clone();
    if !shader_ready(world, &shader) {
        return;
    }
    let device = world.resource::<RenderDevice>();
    let storage = |binding: u32| BindGroupLayoutEntry {
        binding,
        visibility: ShaderStages::COMPUTE,
        ty: BindingType::Buffer {
            ty: BufferBindingType::Storage { read_only: false },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    };
    let layout = device.create_bind_group_layout(
        Some("noise_ball.compute.bind_group_layout"),
        &[
            BindGroupLayoutEntry {
                // params uniform
                binding: 0,
                visibility: ShaderStages::COMPUTE,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: BufferSize::new(std::mem::size_of::<NoiseBallParamsGpu>() as u64),
                },
                count: None,
            },
            // vertices
            storage(1),
            // indices
            storage(2),
        ],
    );
    let cache = world.resource::<PipelineCache>();
    let queue = |label: &'static str, entry: &'static str| {
        cache.queue_compute_pipeline(ComputePipelineDescriptor {
            label: Some(Cow::Borrowed(label)),
            layout: vec![layout.clone()],
            push_constant_ranges: vec![],
            shader: shader.clone(),
            shader_defs: vec![],
            entry_point: Cow::Borrowed(entry),
            zero_initialize_workgroup_memory: false,
        })
    };
    let vertices_pipeline = queue("noise_ball.compute.vertices", "build_vertices");
    let indices_pipeline = queue("noise_ball.compute.indices", "build_indices");
    world.insert_resource(NoiseBallComputePipeline {
        bind_group_layout: layout,
        vertices_pipeline,
        indices_pipeline,
    });
    info!(target: "noise_ball", "noise ball compute pipelines queued");
}

/// Reallocate buffers whose triangle count changed, drop buffers of vanished balls and
/// upload this frame's parameters.
pub fn prepare_noise_ball_meshes(
    mut extracted: ResMut<ExtractedNoiseBalls>,
    mut meshes: ResMut<NoiseBallMeshes>,
    mut stats: ResMut<NoiseBallRenderStats>,
    pipeline: Option<Res<NoiseBallComputePipeline>>,
    render_device: Res<RenderDevice>,
    render_queue: Res<RenderQueue>,
) {
    let limits = render_device.limits();
    let cap = max_triangles_for_limit(
        limits.max_storage_buffer_binding_size as u64,
        limits.max_compute_workgroups_per_dimension,
    );
    stats.dispatched_triangles = 0;
    for ball in extracted.0.iter_mut() {
        if ball.params.triangle_count > cap {
            warn_once!(
                target: "noise_ball",
                "noise ball triangle_count {} exceeds device limit {cap}; clamping",
                ball.params.triangle_count
            );
            ball.params.triangle_count = cap;
        }
        stats.dispatched_triangles += ball.params.triangle_count as u64;
    }

    let plan = plan_mesh_updates(
        meshes.0.iter().map(|(entity, mesh)| (*entity, mesh.vertex_count())),
        extracted.0.iter().map(|b| (b.entity, b.params.triangle_count)),
    );
    for entity in &plan.release {
        meshes.0.remove(entity);
    }
    if !plan.release.is_empty() {
        stats.released += plan.release.len() as u64;
        debug!(target: "noise_ball", "released buffers of {} noise ball(s)", plan.release.len());
    }
    for &(entity, triangle_count) in &plan.allocate {
        // Replacing the entry drops (destroys) the previous buffers first.
        meshes.0.remove(&entity);
        meshes
            .0
            .insert(entity, GpuNoiseBallMesh::allocate(&render_device, triangle_count));
        stats.reallocations += 1;
        debug!(
            target: "noise_ball",
            "allocated {} vertices for {:?}",
            triangle_count.saturating_mul(3),
            entity
        );
    }

    for ball in extracted.0.iter() {
        let Some(mesh) = meshes.0.get_mut(&ball.entity) else {
            continue;
        };
        let uniform = NoiseBallParamsGpu::new(&ball.params, ball.noise_offset);
        render_queue.write_buffer(&mesh.params_buffer, 0, bytemuck::bytes_of(&uniform));
        if mesh.bind_group.is_none() {
            if let Some(pipeline) = pipeline.as_deref() {
                mesh.bind_group = Some(render_device.create_bind_group(
                    Some("noise_ball.compute.bind_group"),
                    &pipeline.bind_group_layout,
                    &[
                        BindGroupEntry {
                            binding: 0,
                            resource: mesh.params_buffer.as_entire_binding(),
                        },
                        BindGroupEntry {
                            binding: 1,
                            resource: mesh.vertex_buffer.as_entire_binding(),
                        },
                        BindGroupEntry {
                            binding: 2,
                            resource: mesh.index_buffer.as_entire_binding(),
                        },
                    ],
                ));
            }
        }
    }
    stats.live_meshes = meshes.0.len();
}

#[derive(Default)]
pub struct NoiseBallComputeNode {
    state: NodeState,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum NodeState {
    #[default]
    Loading,
    Ready,
    Failed,
}

/// Pipeline cache state reduced to what the node cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStatus {
    Pending,
    Ready,
    Failed(String),
}

impl From<&CachedPipelineState> for PipelineStatus {
    fn from(state: &CachedPipelineState) -> Self {
        match state {
            CachedPipelineState::Ok(_) => PipelineStatus::Ready,
            // The cache re-queues these on the next frame.
            CachedPipelineState::Err(
                PipelineCacheError::ShaderNotLoaded(_) | PipelineCacheError::ShaderImportNotYetAvailable,
            ) => PipelineStatus::Pending,
            CachedPipelineState::Err(err) => PipelineStatus::Failed(err.to_string()),
            _ => PipelineStatus::Pending,
        }
    }
}

/// Ready once every kernel compiled; failed only on a real compile error. Terminal states stick.
pub fn next_node_state(current: &NodeState, kernels: &[PipelineStatus]) -> NodeState {
    if !matches!(current, NodeState::Loading) {
        return current.clone();
    }
    if kernels.iter().any(|k| matches!(k, PipelineStatus::Failed(_))) {
        return NodeState::Failed;
    }
    if !kernels.is_empty() && kernels.iter().all(|k| matches!(k, PipelineStatus::Ready)) {
        return NodeState::Ready;
    }
    NodeState::Loading
}

impl render_graph::Node for NoiseBallComputeNode {
    fn update(&mut self, world: &mut World) {
        if !matches!(self.state, NodeState::Loading) {
            return;
        }
        let Some(pipeline) = world.get_resource::<NoiseBallComputePipeline>() else {
            return;
        };
        let cache = world.resource::<PipelineCache>();
        let kernels = [
            PipelineStatus::from(cache.get_compute_pipeline_state(pipeline.vertices_pipeline)),
            PipelineStatus::from(cache.get_compute_pipeline_state(pipeline.indices_pipeline)),
        ];
        self.state = next_node_state(&self.state, &kernels);
        if self.state == NodeState::Failed {
            for k in &kernels {
                if let PipelineStatus::Failed(err) = k {
                    error!(target: "noise_ball", "noise ball compute pipeline failed:\n{err}");
                }
            }
        }
    }

    fn run(
        &self,
        _ctx: &mut render_graph::RenderGraphContext,
        render_context: &mut RenderContext,
        world: &World,
    ) -> Result<(), render_graph::NodeRunError> {
        if !matches!(self.state, NodeState::Ready) {
            return Ok(());
        }
        let Some(pipeline) = world.get_resource::<NoiseBallComputePipeline>() else {
            return Ok(());
        };
        let cache = world.resource::<PipelineCache>();
        let (Some(vertices), Some(indices)) = (
            cache.get_compute_pipeline(pipeline.vertices_pipeline),
            cache.get_compute_pipeline(pipeline.indices_pipeline),
        ) else {
            return Ok(());
        };
        let extracted = world.resource::<ExtractedNoiseBalls>();
        let meshes = world.resource::<NoiseBallMeshes>();
        if extracted.0.is_empty() {
            return Ok(());
        }

        let mut pass = render_context
            .command_encoder()
            .begin_compute_pass(&ComputePassDescriptor {
                label: Some("noise_ball_build"),
                timestamp_writes: None,
            });
        for ball in extracted.0.iter() {
            let Some(mesh) = meshes.0.get(&ball.entity) else {
                continue;
            };
            let Some(bind_group) = &mesh.bind_group else {
                continue;
            };
            let groups = dispatch_groups(mesh.layout.triangle_count, WORKGROUP_SIZE);
            pass.set_bind_group(0, bind_group, &[]);
            pass.set_pipeline(vertices);
            pass.dispatch_workgroups(groups, 1, 1);
            pass.set_pipeline(indices);
            pass.dispatch_workgroups(groups, 1, 1);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shader_still_loading_is_not_a_failure() {
        let not_loaded =
            CachedPipelineState::Err(PipelineCacheError::ShaderNotLoaded(bevy::asset::AssetId::default()));
        let import = CachedPipelineState::Err(PipelineCacheError::ShaderImportNotYetAvailable);
        assert_eq!(PipelineStatus::from(&not_loaded), PipelineStatus::Pending);
        assert_eq!(PipelineStatus::from(&import), PipelineStatus::Pending);
        assert_eq!(PipelineStatus::from(&CachedPipelineState::Queued), PipelineStatus::Pending);
        let kernels = [PipelineStatus::from(&not_loaded), PipelineStatus::Pending];
        assert_eq!(next_node_state(&NodeState::Loading, &kernels), NodeState::Loading);
    }

    #[test]
    fn compile_error_latches_failed() {
        let bad = CachedPipelineState::Err(PipelineCacheError::CreateShaderModule("bad wgsl".into()));
        let status = PipelineStatus::from(&bad);
        assert!(matches!(status, PipelineStatus::Failed(_)));
        let state = next_node_state(&NodeState::Loading, &[PipelineStatus::Ready, status]);
        assert_eq!(state, NodeState::Failed);
        assert_eq!(next_node_state(&state, &[PipelineStatus::Ready, PipelineStatus::Ready]), NodeState::Failed);
    }

    #[test]
    fn ready_only_when_both_kernels_compiled() {
        let state = next_node_state(&NodeState::Loading, &[PipelineStatus::Ready, PipelineStatus::Pending]);
        assert_eq!(state, NodeState::Loading);
        let state = next_node_state(&state, &[PipelineStatus::Ready, PipelineStatus::Ready]);
        assert_eq!(state, NodeState::Ready);
        assert_eq!(next_node_state(&NodeState::Loading, &[]), NodeState::Loading);
    }
}
