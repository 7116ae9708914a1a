use bevy::prelude::*;
use bevy::render::primitives::Aabb;
use bevy::render::Extract;

use super::params::NoiseBallParameters;
use crate::core::components::{NoiseBall, NoiseBallMaterial, NoiseOffset};

#[derive(Clone, Debug)]
pub struct ExtractedNoiseBall {
    /// Main-world entity; keys the render-world buffer map.
    pub entity: Entity,
    pub params: NoiseBallParameters,
    pub noise_offset: Vec3,
    pub world_from_local: Mat4,
    pub aabb: Aabb,
    pub material: NoiseBallMaterial,
}

/// Balls to build and draw this frame, in main-world iteration order.
#[derive(Resource, Default, Debug)]
pub struct ExtractedNoiseBalls(pub Vec<ExtractedNoiseBall>);

/// Render-side snapshot of one ball, or `None` when it is hidden.
pub fn extract_ball(
    entity: Entity,
    ball: &NoiseBall,
    offset: &NoiseOffset,
    transform: &GlobalTransform,
    visibility: &InheritedVisibility,
    aabb: &Aabb,
    material: &NoiseBallMaterial,
) -> Option<ExtractedNoiseBall> {
    if !visibility.get() {
        return None;
    }
    Some(ExtractedNoiseBall {
        entity,
        params: ball.0.sanitized(),
        noise_offset: offset.0,
        world_from_local: transform.compute_matrix(),
        aabb: *aabb,
        material: *material,
    })
}

// Hidden balls are not extracted at all, so their buffers are released like a disabled component.
pub fn extract_noise_balls(
    mut extracted: ResMut<ExtractedNoiseBalls>,
    q: Extract<
        Query<(
            Entity,
            &NoiseBall,
            &NoiseOffset,
            &GlobalTransform,
            &InheritedVisibility,
            &Aabb,
            &NoiseBallMaterial,
        )>,
    >,
) {
    extracted.0.clear();
    extracted.0.extend(
        q.iter()
            .filter_map(|(e, ball, offset, transform, vis, aabb, material)| {
                extract_ball(e, ball, offset, transform, vis, aabb, material)
            }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;
    use bevy::render::MainWorld;

    fn spawn_ball(world: &mut World, params: NoiseBallParameters, visible: bool) -> Entity {
        let vis = if visible { InheritedVisibility::VISIBLE } else { InheritedVisibility::HIDDEN };
        world.spawn((NoiseBall::new(params), GlobalTransform::IDENTITY, vis)).id()
    }

    #[test]
    fn hidden_ball_is_skipped() {
        let mut world = World::new();
        let e = spawn_ball(&mut world, NoiseBallParameters::default(), false);
        let mut q = world.query::<(
            Entity,
            &NoiseBall,
            &NoiseOffset,
            &GlobalTransform,
            &InheritedVisibility,
            &Aabb,
            &NoiseBallMaterial,
        )>();
        let item = q.get(&world, e).map(|(e, b, o, t, v, a, m)| extract_ball(e, b, o, t, v, a, m));
        assert!(matches!(item, Ok(None)));
    }

    #[test]
    fn system_extracts_visible_balls_with_sanitized_params() {
        let mut render_world = World::new();
        render_world.init_resource::<ExtractedNoiseBalls>();
        render_world.insert_resource(MainWorld::default());
        let (shown, hidden) = {
            let mut main = render_world.resource_mut::<MainWorld>();
            let shown = spawn_ball(
                &mut main,
                NoiseBallParameters { triangle_count: 0, ..default() },
                true,
            );
            let hidden = spawn_ball(&mut main, NoiseBallParameters::default(), false);
            (shown, hidden)
        };

        let _ = render_world.run_system_once(extract_noise_balls);
        let extracted = render_world.resource::<ExtractedNoiseBalls>();
        assert_eq!(extracted.0.len(), 1);
        assert_eq!(extracted.0[0].entity, shown);
        assert_eq!(extracted.0[0].params.triangle_count, 1);
        assert!(extracted.0.iter().all(|b| b.entity != hidden));
    }
}
