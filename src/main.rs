use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use exposure3d::io::{load_config, load_scene, write_coverage, ExposureCsvWriter, LoadedScene};
use exposure3d::sim::area_exposure::AreaExposureEvaluator;
use exposure3d::sim::occlusion::policy_from_config;
use exposure3d::sim::surface_grid::{SurfaceGrid, SurfaceGridEvaluator};
use exposure3d::{
    run_to_completion, CancelToken, ExposureConfig, Mesh, Progress, ResumableTask, Scene,
    TimeSeriesDriver, UID,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: exposure3d <scene.json> [config.json] [out.csv]";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(scene_path) = args.next().map(PathBuf::from) else {
        bail!(USAGE);
    };
    let config = match args.next() {
        Some(p) => load_config(Path::new(&p)).with_context(|| format!("reading config {p}"))?,
        None => ExposureConfig::default(),
    };
    let out_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("SunExposure_All.csv"));

    let loaded = load_scene(&scene_path)
        .with_context(|| format!("reading scene {}", scene_path.display()))?;

    if let Some(map) = &config.map_bounds {
        let path = out_path.with_file_name("PlanningAreaCoverage.csv");
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        write_coverage(BufWriter::new(file), &loaded.areas, map)?;
        info!("Coverage table written to {}", path.display());
    }

    run_exposure(&loaded, &config, &out_path)?;
    if loaded.surface.is_some() {
        run_surface(&loaded, &config)?;
    }
    Ok(())
}

/// Area exposure over the whole run, streaming rows to `out_path`.
fn run_exposure(loaded: &LoadedScene, config: &ExposureConfig, out_path: &Path) -> Result<()> {
    let scene = Scene::from_buildings(&loaded.buildings);
    info!(
        "Scene has {} objects with {} triangles",
        scene.len(),
        scene.triangle_count()
    );

    let policy = policy_from_config(config)?;
    let evaluator = if loaded.areas.is_empty() {
        AreaExposureEvaluator::for_whole_scene(&loaded.buildings, &scene, policy)
    } else {
        AreaExposureEvaluator::for_planning_areas(
            &loaded.buildings,
            &loaded.areas,
            config.map_bounds.as_ref(),
            &scene,
            policy,
        )
    };

    let mut driver = TimeSeriesDriver::new(loaded.site, evaluator);
    driver.start(loaded.request.clone());

    let mut writer = ExposureCsvWriter::create(out_path)
        .with_context(|| format!("creating {}", out_path.display()))?;
    let summary = loop {
        let progress = driver.resume(config.chunk_size)?;
        let written = writer.rows();
        if driver.records().len() > written {
            writer.write_records(&driver.records()[written..])?;
            writer.flush()?;
        }
        if let Progress::Done(summary) = progress {
            break summary;
        }
    };

    info!(
        "{} steps, {} rows written to {}, average exposure {:.2}%",
        summary.steps,
        writer.rows(),
        out_path.display(),
        summary.average_percentage
    );
    Ok(())
}

/// Shadow time series and energy estimate for the scene surface.
fn run_surface(loaded: &LoadedScene, config: &ExposureConfig) -> Result<()> {
    let Some(surface) = &loaded.surface else {
        return Ok(());
    };
    let mut scene = Scene::from_buildings(&loaded.buildings);
    let uid = UID::new();
    scene.add_mesh(
        uid.clone(),
        &surface.name,
        &Mesh::from_rectangle(surface.width, surface.height),
        &surface.transform,
    )?;

    let grid = SurfaceGrid::from_rectangle(surface.width, surface.height, &surface.transform);
    let evaluator = SurfaceGridEvaluator::new(grid, uid, config.grid_resolution, &scene)?;
    let mut driver = TimeSeriesDriver::new(loaded.site, evaluator);
    driver.start(loaded.request.clone());
    let summary = run_to_completion(&mut driver, config.chunk_size, &CancelToken::new())?;

    for point in driver.records() {
        println!("{};{:.2}", point.label, point.shadow_percentage);
    }
    println!(
        "{}: sun {:.2}%, energy {:.2} kWh",
        surface.name,
        summary.sun_percentage(),
        summary.energy_output(surface.area())
    );
    Ok(())
}
