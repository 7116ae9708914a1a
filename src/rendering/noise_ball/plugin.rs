use bevy::core_pipeline::core_3d::graph::{Core3d, Node3d};
use bevy::prelude::*;
use bevy::render::{
    extract_resource::ExtractResourcePlugin,
    graph::CameraDriverLabel,
    render_graph::{RenderGraph, RenderGraphApp, ViewNodeRunner},
    ExtractSchedule, Render, RenderApp, RenderSet,
};

use super::animation::{advance_noise_offset, sanitize_parameters, update_bounds, NoiseBallUpdateSet};
use super::compute::{
    create_compute_pipeline, prepare_noise_ball_meshes, NoiseBallComputeLabel, NoiseBallComputeNode,
};
use super::draw::{
    create_draw_pipeline, prepare_view_bind_groups, queue_view_pipelines, NoiseBallDrawBuffers,
    NoiseBallDrawLabel, NoiseBallDrawNode,
};
use super::extract::{extract_noise_balls, ExtractedNoiseBalls};
use super::mesh::{NoiseBallMeshes, NoiseBallRenderStats};
use super::shaders::NoiseBallShaders;
use super::NoiseBallParameters;
use crate::core::components::{NoiseBall, NoiseBallMaterial, NoiseOffset};

/// Main-world half of the effect: validation, noise-time accumulation and bounds.
/// Runs without a renderer, which is what headless tests use.
pub struct NoiseBallSimulationPlugin;

impl Plugin for NoiseBallSimulationPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<NoiseBall>()
            .register_type::<NoiseBallParameters>()
            .register_type::<NoiseOffset>()
            .register_type::<NoiseBallMaterial>()
            .configure_sets(Update, NoiseBallUpdateSet)
            .add_systems(
                Update,
                (
                    sanitize_parameters,
                    (advance_noise_offset, update_bounds),
                )
                    .chain()
                    .in_set(NoiseBallUpdateSet),
            );
    }
}

/// Full effect: simulation plus GPU generation and drawing.
pub struct NoiseBallPlugin;

impl Plugin for NoiseBallPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            NoiseBallSimulationPlugin,
            ExtractResourcePlugin::<NoiseBallShaders>::default(),
        ));

        let Some(render_app) = app.get_sub_app_mut(RenderApp) else {
            warn!(target: "noise_ball", "RenderApp missing; noise balls will animate but not render");
            return;
        };
        render_app
            .init_resource::<ExtractedNoiseBalls>()
            .init_resource::<NoiseBallMeshes>()
            .init_resource::<NoiseBallRenderStats>()
            .init_resource::<NoiseBallDrawBuffers>()
            .add_systems(ExtractSchedule, extract_noise_balls)
            .add_systems(
                Render,
                (
                    (create_compute_pipeline, create_draw_pipeline).in_set(RenderSet::PrepareAssets),
                    queue_view_pipelines.in_set(RenderSet::Queue),
                    prepare_noise_ball_meshes.in_set(RenderSet::PrepareResources),
                    prepare_view_bind_groups
                        .in_set(RenderSet::PrepareBindGroups)
                        .after(prepare_noise_ball_meshes),
                ),
            );

        render_app
            .add_render_graph_node::<ViewNodeRunner<NoiseBallDrawNode>>(Core3d, NoiseBallDrawLabel)
            .add_render_graph_edges(
                Core3d,
                (Node3d::MainOpaquePass, NoiseBallDrawLabel, Node3d::MainTransmissivePass),
            );

        let mut graph = render_app.world_mut().resource_mut::<RenderGraph>();
        graph.add_node(NoiseBallComputeLabel, NoiseBallComputeNode::default());
        graph.add_node_edge(NoiseBallComputeLabel, CameraDriverLabel);
    }

    fn finish(&self, app: &mut App) {
        // Needs the AssetServer / shader assets, which exist once all plugins are built.
        if app.get_sub_app(RenderApp).is_none() {
            return;
        }
        app.init_resource::<NoiseBallShaders>();
    }
}
