//! Marrow - skeletal animation tooling
//!
//! Headless entry point: inspect asset files and sample poses through the
//! same component pool and animation system a game frame loop uses.

mod cli;
mod settings;

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use glam::Mat4;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use marrow_anim::{AnimationState, AnimationSystem};
use marrow_assets::{AnimationAsset, AssetServer};
use marrow_core::GameTime;
use marrow_ecs::{ComponentPool, World};

use crate::cli::{Cli, Commands};
use crate::settings::MarrowSettings;

#[derive(Serialize)]
struct BoneSummary {
    id: u32,
    parent: Option<u32>,
    children: Vec<u32>,
}

#[derive(Serialize)]
struct AnimationSummary {
    index: usize,
    duration_ticks: f32,
    ticks_per_second: f32,
    seconds: f32,
    channels: u32,
}

#[derive(Serialize)]
struct AssetSummary {
    flags: u32,
    num_meshes: u32,
    num_texcoord_channels: u32,
    bones: Vec<BoneSummary>,
    animations: Vec<AnimationSummary>,
}

impl AssetSummary {
    fn new(asset: &AnimationAsset) -> Self {
        let info = asset.info();
        Self {
            flags: info.flags.0,
            num_meshes: info.num_meshes,
            num_texcoord_channels: info.num_texcoord_channels,
            bones: asset
                .bones()
                .iter()
                .map(|bone| BoneSummary {
                    id: bone.id,
                    parent: bone.parent,
                    children: asset.children(bone.id).collect(),
                })
                .collect(),
            animations: asset
                .animations()
                .iter()
                .enumerate()
                .map(|(index, animation)| AnimationSummary {
                    index,
                    duration_ticks: animation.duration_ticks,
                    ticks_per_second: animation.ticks_per_second,
                    seconds: animation.duration_ticks / animation.ticks_per_second,
                    channels: animation.num_channels,
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct PoseReport {
    animation: u32,
    time: f32,
    cross_fade_factor: f32,
    bones: Vec<Mat4>,
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")
}

fn load_asset(path: &Path) -> Result<std::sync::Arc<AnimationAsset>> {
    let mut assets = AssetServer::new(".");
    let handle = assets
        .load_animation(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    assets
        .get(handle)
        .context("Asset vanished right after loading")
}

fn inspect(path: &Path, json: bool) -> Result<()> {
    let asset = load_asset(path)?;
    let summary = AssetSummary::new(&asset);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", path.display());
    println!("  flags: {:#06b}", summary.flags);
    println!("  meshes: {}", summary.num_meshes);
    println!("  bones: {}", summary.bones.len());
    for bone in &summary.bones {
        let parent = bone
            .parent
            .map_or_else(|| "-".to_string(), |p| p.to_string());
        println!(
            "    [{:>3}] parent {:>3}  children {:?}",
            bone.id, parent, bone.children
        );
    }
    println!("  animations: {}", summary.animations.len());
    for anim in &summary.animations {
        println!(
            "    [{:>3}] {:.3}s ({} ticks @ {} tps), {} channels",
            anim.index, anim.seconds, anim.duration_ticks, anim.ticks_per_second, anim.channels
        );
    }
    Ok(())
}

/// Feed `seconds` of wall-clock time through `clock` in frames no longer
/// than its max delta, then resolve the final frame.
fn run_frames(
    system: &mut AnimationSystem,
    pool: &mut ComponentPool<AnimationState>,
    clock: &mut GameTime,
    seconds: f32,
) -> Result<Option<Vec<Mat4>>> {
    let step = clock.config.max_delta_time;
    if !(step > 0.0) {
        bail!("time.max_delta_time must be positive, got {}", step);
    }

    let mut remaining = seconds.max(0.0);
    while remaining > step {
        clock.update(step);
        system.update(pool, clock.delta_time);
        remaining -= step;
    }
    clock.update(remaining);

    let mut bones = None;
    system.tick(pool, clock, |_, palette| bones = Some(palette.to_vec()));
    Ok(bones)
}

fn init_config(path: Option<&Path>, force: bool) -> Result<()> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            MarrowSettings::settings_path().context("Could not determine config directory")?
        }
    };
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    MarrowSettings::default().save_to(&path)?;
    println!("Wrote default settings to {}", path.display());
    Ok(())
}

struct PoseRequest {
    animation: u32,
    time: f32,
    from: Option<u32>,
    fade: Option<f32>,
    json: bool,
}

fn pose(path: &Path, settings: &MarrowSettings, request: PoseRequest) -> Result<()> {
    let model = load_asset(path)?;

    let mut world = World::new();
    world.register::<AnimationState>(1);
    let entity = world.spawn();

    let mut system = AnimationSystem::new(settings.animation.clone());
    let pool = world
        .pool_mut::<AnimationState>()
        .context("Animation pool missing")?;
    let handle = system.attach(pool, entity, model)?;

    let state = &mut pool[handle];
    match request.from {
        Some(from) => {
            state.play(from);
            match request.fade {
                Some(duration) => state.cross_fade(request.animation, duration),
                None => system.cross_fade_default(state, request.animation),
            }
        }
        None => state.play(request.animation),
    }

    let mut clock = GameTime::new(settings.time.clone());
    let bones = run_frames(&mut system, pool, &mut clock, request.time)?;
    let cross_fade_factor = pool[handle].cross_fade_factor();
    debug!(
        "Cross-fade factor after {} frames: {}",
        clock.frame_count, cross_fade_factor
    );
    let Some(bones) = bones else {
        bail!("Could not resolve a pose for animation {}", request.animation);
    };

    let report = PoseReport {
        animation: request.animation,
        time: clock.total_time as f32,
        cross_fade_factor,
        bones,
    };

    if request.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "animation {} at {}s (cross-fade {:.3})",
        report.animation, report.time, report.cross_fade_factor
    );
    for (index, matrix) in report.bones.iter().enumerate() {
        println!("  bone {}", index);
        for row in 0..4 {
            let row = matrix.row(row);
            println!(
                "    {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
                row.x, row.y, row.z, row.w
            );
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    if let Commands::InitConfig { force } = cli.command {
        return init_config(cli.config.as_deref(), force);
    }

    let settings = match &cli.config {
        Some(path) => MarrowSettings::load_from(path)?,
        None => MarrowSettings::load(),
    };
    info!("Animation settings: {:?}", settings.animation);

    match cli.command {
        Commands::Inspect { asset, json } => inspect(&asset, json),
        Commands::Pose {
            asset,
            animation,
            time,
            from,
            fade,
            json,
        } => pose(
            &asset,
            &settings,
            PoseRequest {
                animation,
                time,
                from,
                fade,
                json,
            },
        ),
        Commands::InitConfig { .. } => Ok(()),
    }
}
