pub mod animation;
pub mod compute;
pub mod draw;
pub mod extract;
pub mod gpu;
pub mod mesh;
pub mod params;
pub mod plugin;
pub mod reference;
pub mod shaders;

// Re-export primary types commonly used elsewhere
pub use animation::NoiseBallUpdateSet;
pub use gpu::{dispatch_groups, MeshLayout, NoiseBallDrawGpu, NoiseBallParamsGpu, WORKGROUP_SIZE};
pub use mesh::{needs_reset, NoiseBallRenderStats};
pub use params::{NoiseBallParameters, BALL_RADIUS};
pub use plugin::{NoiseBallPlugin, NoiseBallSimulationPlugin};
pub use reference::ReferenceMesh;
