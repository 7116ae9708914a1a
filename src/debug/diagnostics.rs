use bevy::prelude::*;
use bevy::render::{Render, RenderApp, RenderSet};

use crate::core::components::{NoiseBall, NoiseOffset};
use crate::core::config::DiagnosticsConfig;
use crate::rendering::noise_ball::{dispatch_groups, NoiseBallRenderStats, WORKGROUP_SIZE};

#[derive(Resource, Default)]
pub struct FrameCounter(pub u64);

/// Startup summary plus throttled per-frame logs of every ball.
pub struct NoiseBallDiagnosticsPlugin;

impl Plugin for NoiseBallDiagnosticsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DiagnosticsConfig>()
            .init_resource::<FrameCounter>()
            .add_systems(PostStartup, startup_summary)
            .add_systems(Update, (increment_frame_counter, periodic_diagnostics).chain());

        if let Some(render_app) = app.get_sub_app_mut(RenderApp) {
            render_app
                .init_resource::<RenderLogState>()
                .add_systems(Render, log_render_stats.in_set(RenderSet::Cleanup));
        }
    }
}

pub fn should_log(cfg: &DiagnosticsConfig, frame: u64) -> bool {
    if !cfg.enabled {
        return false;
    }
    if cfg.max_frames_logging > 0 && frame > cfg.max_frames_logging {
        return false;
    }
    frame == 1 || (cfg.log_every_n_frames > 0 && frame % cfg.log_every_n_frames as u64 == 0)
}

fn increment_frame_counter(mut fc: ResMut<FrameCounter>) {
    fc.0 += 1;
}

fn startup_summary(config: Res<DiagnosticsConfig>, q: Query<(Entity, &NoiseBall)>) {
    if !config.enabled {
        return;
    }
    let count = q.iter().count();
    if count == 0 {
        warn!(target: "noise_ball::diag", "Startup: no NoiseBall entities spawned");
    }
    for (e, ball) in q.iter() {
        let p = &ball.0;
        info!(target: "noise_ball::diag", "Startup: {:?} triangles={} vertices={} groups={} extent={:.3} freq={:.2} amp={:.2}",
            e, p.triangle_count, p.vertex_count(), dispatch_groups(p.triangle_count, WORKGROUP_SIZE),
            p.triangle_extent, p.noise_frequency, p.noise_amplitude);
    }
}

fn periodic_diagnostics(
    config: Res<DiagnosticsConfig>,
    fc: Res<FrameCounter>,
    time: Res<Time>,
    q: Query<(Entity, &NoiseBall, &NoiseOffset, &InheritedVisibility)>,
) {
    if !should_log(&config, fc.0) {
        return;
    }
    let total: u64 = q.iter().map(|(_, b, _, _)| b.0.triangle_count as u64).sum();
    info!(target: "noise_ball::diag", "Frame {}: t={:.2}s balls={} triangles={}", fc.0, time.elapsed_secs(), q.iter().count(), total);
    for (e, ball, offset, vis) in q.iter().take(3) {
        info!(target: "noise_ball::diag", "  {:?} offset=({:.3},{:.3},{:.3}) triangles={} visible={}",
            e, offset.0.x, offset.0.y, offset.0.z, ball.0.triangle_count, vis.get());
    }
}

#[derive(Resource, Default)]
struct RenderLogState {
    last_reallocations: u64,
    last_released: u64,
}

// Render world: report buffer churn only when it changes.
fn log_render_stats(stats: Option<Res<NoiseBallRenderStats>>, mut state: ResMut<RenderLogState>) {
    let Some(stats) = stats else {
        return;
    };
    if stats.reallocations != state.last_reallocations || stats.released != state.last_released {
        info!(target: "noise_ball::diag", "GPU meshes: live={} reallocations={} released={}",
            stats.live_meshes, stats.reallocations, stats.released);
        state.last_reallocations = stats.reallocations;
        state.last_released = stats.released;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logs_first_and_every_nth_frame() {
        let cfg = DiagnosticsConfig { enabled: true, log_every_n_frames: 10, max_frames_logging: 0 };
        assert!(should_log(&cfg, 1));
        assert!(!should_log(&cfg, 5));
        assert!(should_log(&cfg, 20));
    }

    #[test]
    fn respects_limit_and_disable() {
        let cfg = DiagnosticsConfig { enabled: true, log_every_n_frames: 10, max_frames_logging: 15 };
        assert!(should_log(&cfg, 10));
        assert!(!should_log(&cfg, 20));
        let off = DiagnosticsConfig { enabled: false, ..cfg };
        assert!(!should_log(&off, 1));
    }
}
