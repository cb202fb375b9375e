use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tilewalk::config::CONFIG_FILE;
use tilewalk::{GameConfig, RunSummary, SceneSource, WorldScene};
use tilewalk_core::scene::SceneScheduler;
use tilewalk_core::settings::RonSettingsStore;
use tilewalk_core::{Neighborhood, TexturePolicy};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file stem (RON), e.g. `tilewalk` for `tilewalk.ron`
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Build this Tiled JSON map instead of the infinite world
    #[arg(long)]
    map: Option<PathBuf>,

    /// Number of ticks to simulate
    #[arg(long)]
    ticks: Option<u32>,

    /// World seed (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Structure stamped into the origin chunk
    #[arg(long)]
    structure: Option<String>,

    /// Keep a 3x3 window of chunks around the observer instead of 2x2
    #[arg(long)]
    symmetric: bool,

    /// Remember ground textures so revisited chunks look the same
    #[arg(long)]
    persist_textures: bool,

    /// Print the effective configuration as RON and exit
    #[arg(long)]
    dump_config: bool,

    /// Log every chunk event
    #[arg(long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut config = GameConfig::load_from(&args.config)?;
    apply_args(&mut config, &args);

    if args.dump_config {
        println!("{}", config.to_ron_string()?);
        return Ok(());
    }

    log::info!("Starting Tilewalk");

    let settings = RonSettingsStore::open(&config.paths.settings_file)?;
    let source = match &args.map {
        Some(path) => SceneSource::Map(path.clone()),
        None => SceneSource::Infinite,
    };
    let ticks = config.walk.ticks;
    let tick_ms = config.walk.tick_ms;

    let mut scheduler = SceneScheduler::new(WorldScene::new(config, source, settings));
    scheduler.start()?;

    let pb = ProgressBar::new(u64::from(ticks));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ticks {msg}")?
            .progress_chars("█▓░"),
    );
    for _ in 0..ticks {
        scheduler.update(tick_ms);
        pb.inc(1);
    }
    pb.finish_with_message("done");

    scheduler.shutdown();
    let scene = scheduler.into_scene();
    print_summary(scene.summary());
    scene.into_settings().save()?;

    Ok(())
}

fn apply_args(config: &mut GameConfig, args: &Args) {
    if let Some(ticks) = args.ticks {
        config.walk.ticks = ticks;
    }
    if let Some(seed) = args.seed {
        config.world.seed = Some(seed);
    }
    if let Some(structure) = &args.structure {
        config.world.origin_structure = Some(structure.clone());
    }
    if args.symmetric {
        config.world.neighborhood = Neighborhood::Symmetric;
    }
    if args.persist_textures {
        config.world.tile_textures = TexturePolicy::Persist;
    }
    if args.verbose {
        config.debug.verbose_logging = true;
    }
}

fn print_summary(summary: &RunSummary) {
    println!("seed            {}", summary.seed);
    println!("ticks           {}", summary.ticks);
    println!(
        "observer        ({:.1}, {:.1})",
        summary.observer.x, summary.observer.y
    );
    println!(
        "spawn point     ({:.1}, {:.1})",
        summary.spawn_point.x, summary.spawn_point.y
    );
    println!(
        "chunks          {} known, {} active at exit",
        summary.chunks_known, summary.chunks_active
    );
    println!(
        "streaming       {} generated, {} loaded, {} unloaded",
        summary.streaming.generated, summary.streaming.loaded, summary.streaming.unloaded
    );
    println!(
        "tiles           {} created, {} destroyed, {} frame changes",
        summary.tiles_created, summary.tiles_destroyed, summary.frame_changes
    );
    println!(
        "spawn failures  {}",
        summary.spawn_failures
    );
}
