//! Draw side: hand the compute-written buffers straight to a render pass in `Core3d`.
use bevy::core_pipeline::core_3d::CORE_3D_DEPTH_FORMAT;
use bevy::ecs::query::QueryItem;
use bevy::math::Affine3A;
use bevy::prelude::*;
use bevy::render::{
    primitives::Frustum,
    render_graph::{NodeRunError, RenderGraphContext, RenderLabel, ViewNode},
    render_resource::*,
    renderer::{RenderContext, RenderDevice, RenderQueue},
    view::{ExtractedView, Msaa, ViewDepthTexture, ViewTarget},
};
use std::collections::{HashMap, HashSet};

use super::extract::ExtractedNoiseBalls;
use super::gpu::{NoiseBallDrawGpu, VERTEX_STRIDE};
use super::mesh::NoiseBallMeshes;
use super::shaders::{shader_ready, NoiseBallShaders};

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct DrawPipelineKey {
    pub format: TextureFormat,
    pub samples: u32,
}

#[derive(Resource)]
pub struct NoiseBallDrawPipeline {
    pub bind_group_layout: BindGroupLayout,
    pub shader: Handle<Shader>,
    pub variants: HashMap<DrawPipelineKey, CachedRenderPipelineId>,
}

/// Pipeline variant matching this view's target format and sample count.
#[derive(Component, Clone, Copy)]
pub struct NoiseBallViewPipeline(pub CachedRenderPipelineId);

/// Per-view draw bind groups for balls that passed frustum culling.
#[derive(Component, Default)]
pub struct NoiseBallViewBindGroups(pub Vec<(Entity, BindGroup)>);

#[derive(Debug, Hash, PartialEq, Eq, Clone, RenderLabel)]
pub struct NoiseBallDrawLabel;

/// Values keyed by (view, ball) that survive only while they keep being used.
pub struct FrameCache<T> {
    entries: HashMap<(Entity, Entity), T>,
    used: HashSet<(Entity, Entity)>,
}

impl<T> Default for FrameCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            used: HashSet::new(),
        }
    }
}

impl<T> FrameCache<T> {
    pub fn get_or_insert_with(&mut self, key: (Entity, Entity), create: impl FnOnce() -> T) -> &mut T {
        self.used.insert(key);
        self.entries.entry(key).or_insert_with(create)
    }

    /// Drop entries not touched since the last call; returns how many went away.
    pub fn end_frame(&mut self) -> usize {
        let used = std::mem::take(&mut self.used);
        let before = self.entries.len();
        self.entries.retain(|key, _| used.contains(key));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Draw uniform and bind group per (view, ball), rewritten in place every frame.
#[derive(Resource, Default)]
pub struct NoiseBallDrawBuffers(pub FrameCache<(Buffer, BindGroup)>);

pub fn create_draw_pipeline(world: &mut World) {
    if world.contains_resource::<NoiseBallDrawPipeline>() {
        return;
    }
    let Some(shaders) = world.get_resource::<NoiseBallShaders>() else {
        return;
    };
    let shader = shaders.draw.clone();
    if !shader_ready(world, &shader) {
        return;
    }
    let device = world.resource::<RenderDevice>();
    let layout = device.create_bind_group_layout(
        Some("noise_ball.draw.bind_group_layout"),
        &[BindGroupLayoutEntry {
            binding: 0,
            visibility: ShaderStages::VERTEX_FRAGMENT,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: BufferSize::new(std::mem::size_of::<NoiseBallDrawGpu>() as u64),
            },
            count: None,
        }],
    );
    world.insert_resource(NoiseBallDrawPipeline {
        bind_group_layout: layout,
        shader,
        variants: HashMap::new(),
    });
}

pub fn draw_pipeline_descriptor(
    layout: &BindGroupLayout,
    shader: &Handle<Shader>,
    key: DrawPipelineKey,
) -> RenderPipelineDescriptor {
    RenderPipelineDescriptor {
        label: Some("noise_ball.draw".into()),
        layout: vec![layout.clone()],
        push_constant_ranges: vec![],
        vertex: VertexState {
            shader: shader.clone(),
            shader_defs: vec![],
            entry_point: "vs_main".into(),
            buffers: vec![VertexBufferLayout {
                array_stride: VERTEX_STRIDE,
                step_mode: VertexStepMode::Vertex,
                attributes: vec![
                    VertexAttribute {
                        format: VertexFormat::Float32x3,
                        offset: 0,
                        shader_location: 0,
                    },
                    VertexAttribute {
                        format: VertexFormat::Float32x3,
                        offset: 12,
                        shader_location: 1,
                    },
                ],
            }],
        },
        fragment: Some(FragmentState {
            shader: shader.clone(),
            shader_defs: vec![],
            entry_point: "fs_main".into(),
            targets: vec![Some(ColorTargetState {
                format: key.format,
                blend: Some(BlendState::REPLACE),
                write_mask: ColorWrites::ALL,
            })],
        }),
        // Disjoint triangles are visible from both sides.
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        // Reverse-Z, matching the core 3d main pass.
        depth_stencil: Some(DepthStencilState {
            format: CORE_3D_DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: CompareFunction::GreaterEqual,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: MultisampleState {
            count: key.samples,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        zero_initialize_workgroup_memory: false,
    }
}

pub fn queue_view_pipelines(
    mut commands: Commands,
    pipeline: Option<ResMut<NoiseBallDrawPipeline>>,
    cache: Res<PipelineCache>,
    views: Query<(Entity, &ViewTarget, &Msaa), With<ExtractedView>>,
) {
    let Some(mut pipeline) = pipeline else {
        return;
    };
    let pipeline = &mut *pipeline;
    for (entity, target, msaa) in views.iter() {
        let key = DrawPipelineKey {
            format: target.main_texture_format(),
            samples: msaa.samples(),
        };
        let id = *pipeline.variants.entry(key).or_insert_with(|| {
            debug!(target: "noise_ball", "queueing draw pipeline variant {key:?}");
            cache.queue_render_pipeline(draw_pipeline_descriptor(
                &pipeline.bind_group_layout,
                &pipeline.shader,
                key,
            ))
        });
        commands.entity(entity).insert(NoiseBallViewPipeline(id));
    }
}

pub fn prepare_view_bind_groups(
    mut commands: Commands,
    pipeline: Option<Res<NoiseBallDrawPipeline>>,
    render_device: Res<RenderDevice>,
    render_queue: Res<RenderQueue>,
    extracted: Res<ExtractedNoiseBalls>,
    meshes: Res<NoiseBallMeshes>,
    mut buffers: ResMut<NoiseBallDrawBuffers>,
    views: Query<(Entity, &ExtractedView, Option<&Frustum>)>,
) {
    let Some(pipeline) = pipeline else {
        return;
    };
    for (view_entity, view, frustum) in views.iter() {
        let clip_from_world = view
            .clip_from_world
            .unwrap_or_else(|| view.clip_from_view * view.world_from_view.compute_matrix().inverse());
        let mut groups = NoiseBallViewBindGroups::default();
        for ball in extracted.0.iter() {
            if !meshes.0.contains_key(&ball.entity) {
                continue;
            }
            if let Some(frustum) = frustum {
                let world_from_local = Affine3A::from_mat4(ball.world_from_local);
                if !frustum.intersects_obb(&ball.aabb, &world_from_local, true, true) {
                    continue;
                }
            }
            let m = &ball.material;
            let uniform = NoiseBallDrawGpu::new(
                clip_from_world,
                ball.world_from_local,
                m.base_color,
                m.light_direction,
                m.ambient,
            );
            let key = (view_entity, ball.entity);
            let (buffer, bind_group) = buffers.0.get_or_insert_with(key, || {
                let buffer = render_device.create_buffer(&BufferDescriptor {
                    label: Some("noise_ball.draw.uniform"),
                    size: std::mem::size_of::<NoiseBallDrawGpu>() as u64,
                    usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                let bind_group = render_device.create_bind_group(
                    Some("noise_ball.draw.bind_group"),
                    &pipeline.bind_group_layout,
                    &[BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    }],
                );
                (buffer, bind_group)
            });
            render_queue.write_buffer(buffer, 0, bytemuck::bytes_of(&uniform));
            groups.0.push((ball.entity, bind_group.clone()));
        }
        commands.entity(view_entity).insert(groups);
    }
    // Views or balls that went away (or were culled) give their buffers back.
    buffers.0.end_frame();
}

#[derive(Default)]
pub struct NoiseBallDrawNode;

impl ViewNode for NoiseBallDrawNode {
    type ViewQuery = (
        &'static ViewTarget,
        &'static ViewDepthTexture,
        Option<&'static NoiseBallViewPipeline>,
        Option<&'static NoiseBallViewBindGroups>,
    );

    fn run<'w>(
        &self,
        _graph: &mut RenderGraphContext,
        render_context: &mut RenderContext<'w>,
        (target, depth, view_pipeline, bind_groups): QueryItem<'w, Self::ViewQuery>,
        world: &'w World,
    ) -> Result<(), NodeRunError> {
        let (Some(view_pipeline), Some(bind_groups)) = (view_pipeline, bind_groups) else {
            return Ok(());
        };
        if bind_groups.0.is_empty() {
            return Ok(());
        }
        let cache = world.resource::<PipelineCache>();
        let Some(render_pipeline) = cache.get_render_pipeline(view_pipeline.0) else {
            return Ok(());
        };
        let meshes = world.resource::<NoiseBallMeshes>();

        let mut pass = render_context.begin_tracked_render_pass(RenderPassDescriptor {
            label: Some("noise_ball_draw"),
            color_attachments: &[Some(target.get_color_attachment())],
            depth_stencil_attachment: Some(depth.get_attachment(StoreOp::Store)),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_render_pipeline(render_pipeline);
        for (entity, bind_group) in bind_groups.0.iter() {
            let Some(mesh) = meshes.0.get(entity) else {
                continue;
            };
            pass.set_bind_group(0, bind_group, &[]);
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), 0, IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.vertex_count(), 0, 0..1);
        }
        Ok(())
    }
}
