//! Render a small test scene to a PNG.
//!
//! Usage: `cargo run --release --example sphere_render -- [settings.json] [out.png]`

use std::sync::Arc;

use anyhow::{Context, Result};
use strata_render::shapes;
use strata_render::{
    CheckerTexture, DiffuseMaterial, GlassMaterial, MetalMaterial, PerspectiveCamera,
    ProgressBarReporter, RenderSettings, SceneBuilder, SkyGradient, Spectrum, Vec3,
};

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings from {path}"))?;
            RenderSettings::from_json(&json)?
        }
        None => RenderSettings {
            width: 400,
            height: 300,
            spp: 32,
            ..Default::default()
        },
    };
    let output = args.next().unwrap_or_else(|| "sphere_render.png".to_string());

    let mut camera = PerspectiveCamera::new()
        .with_resolution(settings.width, settings.height)
        .with_position(Vec3::new(0.0, 1.5, 6.0), Vec3::new(0.0, 0.8, 0.0), Vec3::Y)
        .with_lens(35.0, 0.0, 6.0);
    camera.initialize();

    let checker = Arc::new(CheckerTexture::new(
        Spectrum::splat(0.8),
        Spectrum::new(0.2, 0.3, 0.1),
        10.0,
    ));

    let scene = SceneBuilder::new()
        .add_mesh(
            "ground",
            &shapes::quad(Vec3::ZERO, Vec3::X * 8.0, Vec3::NEG_Z * 8.0),
            Arc::new(DiffuseMaterial::textured(checker)),
        )?
        .add_mesh(
            "diffuse",
            &shapes::uv_sphere(Vec3::new(-1.6, 0.8, 0.0), 0.8, 48, 24),
            Arc::new(DiffuseMaterial::new(Spectrum::new(0.7, 0.3, 0.3))),
        )?
        .add_mesh(
            "glass",
            &shapes::uv_sphere(Vec3::new(0.0, 0.8, 0.0), 0.8, 48, 24),
            Arc::new(GlassMaterial::new(Spectrum::ONE, 1.5)),
        )?
        .add_mesh(
            "metal",
            &shapes::uv_sphere(Vec3::new(1.6, 0.8, 0.0), 0.8, 48, 24),
            Arc::new(MetalMaterial::new(Spectrum::new(0.9, 0.8, 0.6), 0.2)),
        )?
        .add_area_light(
            "key",
            &shapes::quad(Vec3::new(0.0, 4.0, 1.0), Vec3::X, Vec3::Z),
            Spectrum::splat(8.0),
        )?
        .environment(Arc::new(SkyGradient::default()))
        .camera(Arc::new(camera))
        .build()?;

    let film = settings.build_film()?;
    let tracer = settings.build_tracer()?;
    let report = tracer.render(&scene, &film, &ProgressBarReporter::new())?;
    for err in &report.errors {
        log::error!("{}", err);
    }

    film.image()
        .save(&output)
        .with_context(|| format!("failed to write {output}"))?;
    log::info!("Saved {} ({:.2?})", output, report.elapsed);

    Ok(())
}
