//! Noise ball OBJ exporter
//!
//! Runs the CPU mirror of the generation kernels for one instant and writes a Wavefront OBJ,
//! handy for diffing against GPU captures or viewing in a DCC tool.
//!
//! Example:
//!   cargo run --bin noise_ball_export -- --time 2.5 --triangles 2000 --out ball.obj

use std::{fmt::Write as _, fs, path::PathBuf};

use anyhow::{Context, Result};
use bevy::math::Vec3;
use clap::Parser;
use noise_ball::rendering::noise_ball::ReferenceMesh;
use noise_ball::{NoiseBallConfig, NoiseBallParameters};

#[derive(Parser, Debug)]
#[command(author, version, about = "Export a noise ball snapshot as OBJ", long_about=None)]
struct Args {
    /// RON config to read ball parameters from (defaults used when omitted).
    #[arg(long)] config: Option<PathBuf>,
    /// Seconds of animation to apply (noise offset = noise_animation * time).
    #[arg(long, default_value_t = 0.0)] time: f32,
    /// Override triangle count.
    #[arg(long)] triangles: Option<u32>,
    #[arg(long, default_value = "noise_ball.obj")] out: PathBuf,
}

fn write_obj(mesh: &ReferenceMesh) -> Result<String> {
    let mut out = String::with_capacity(mesh.positions.len() * 64);
    writeln!(out, "# noise_ball {} triangles", mesh.triangle_count())?;
    for p in &mesh.positions { writeln!(out, "v {:.6} {:.6} {:.6}", p.x, p.y, p.z)?; }
    for n in &mesh.normals { writeln!(out, "vn {:.6} {:.6} {:.6}", n.x, n.y, n.z)?; }
    // OBJ indices are 1-based; normals share the vertex index.
    for tri in mesh.indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] + 1, tri[1] + 1, tri[2] + 1);
        writeln!(out, "f {a}//{a} {b}//{b} {c}//{c}")?;
    }
    Ok(out)
}

fn main() -> Result<()> {
    let args = Args::parse();
    if !args.time.is_finite() || args.time < 0.0 { anyhow::bail!("--time must be a finite, non-negative number of seconds"); }
    let mut params: NoiseBallParameters = match &args.config {
        Some(path) => NoiseBallConfig::load_from_file(path).map_err(anyhow::Error::msg).with_context(|| format!("load config {:?}", path))?.ball,
        None => NoiseBallParameters::default(),
    };
    if let Some(t) = args.triangles { params.triangle_count = t; }
    let params = params.sanitized();

    let offset: Vec3 = params.noise_animation * args.time;
    let mesh = ReferenceMesh::build(&params, offset);
    let text = write_obj(&mesh)?;
    fs::write(&args.out, text).with_context(|| format!("write {:?}", args.out))?;
    println!("wrote {} triangles ({} vertices) to {}", mesh.triangle_count(), mesh.positions.len(), args.out.display());
    Ok(())
}
