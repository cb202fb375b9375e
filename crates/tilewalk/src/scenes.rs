//! The runner's single scene: a streamed world or a tile map, ticked headlessly

use anyhow::{Context, Result};
use glam::Vec2;
use rand::Rng;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;

use tilewalk_core::levels::{InfiniteLevel, Level, LevelEvent, TilemapLevel};
use tilewalk_core::scene::SceneLifecycle;
use tilewalk_core::settings::{Setting, SettingsExt, SettingsStore};
use tilewalk_core::tilemap::TiledStructureLoader;
use tilewalk_core::world::StreamingCounters;

use crate::config::GameConfig;
use crate::headless::{HeadlessWorld, ObserverPath};

pub const LAST_SEED: Setting<u64> = Setting::new("world.last_seed", 0);
pub const RUN_COUNT: Setting<u32> = Setting::new("runner.runs", 0);
pub const REUSE_SEED: Setting<bool> = Setting::new("world.reuse_seed", false);

/// What the scene plays
#[derive(Debug, Clone)]
pub enum SceneSource {
    Infinite,
    Map(PathBuf),
}

enum ActiveLevel {
    Infinite(InfiniteLevel),
    Tilemap(TilemapLevel),
}

impl ActiveLevel {
    fn as_level_mut(&mut self) -> &mut dyn Level {
        match self {
            ActiveLevel::Infinite(level) => level,
            ActiveLevel::Tilemap(level) => level,
        }
    }
}

/// Totals reported at the end of a run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub seed: u64,
    pub ticks: u32,
    pub observer: Vec2,
    pub spawn_point: Vec2,
    pub chunks_known: usize,
    pub chunks_active: usize,
    pub streaming: StreamingCounters,
    pub chunk_events: u64,
    pub spawn_failures: u64,
    pub tiles_created: u64,
    pub tiles_destroyed: u64,
    pub frame_changes: u64,
    pub live_tiles: usize,
    pub live_bodies: usize,
}

pub struct WorldScene<S: SettingsStore> {
    config: GameConfig,
    source: SceneSource,
    settings: S,
    world: HeadlessWorld,
    level: Option<ActiveLevel>,
    events: Option<Receiver<LevelEvent>>,
    path: ObserverPath,
    summary: RunSummary,
}

impl<S: SettingsStore> WorldScene<S> {
    pub fn new(config: GameConfig, source: SceneSource, settings: S) -> Self {
        let path = ObserverPath::new(Vec2::ZERO, config.walk.speed, config.walk.turn_every);
        Self {
            config,
            source,
            settings,
            world: HeadlessWorld::default(),
            level: None,
            events: None,
            path,
            summary: RunSummary::default(),
        }
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    pub fn into_settings(self) -> S {
        self.settings
    }

    pub fn world(&self) -> &HeadlessWorld {
        &self.world
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Explicit seed, the remembered one when asked to reuse it, or a fresh one
    fn resolve_seed(&mut self) -> u64 {
        if let Some(seed) = self.config.world.seed {
            return seed;
        }
        if self.settings.get(&REUSE_SEED) && self.settings.get_raw(LAST_SEED.name).is_some() {
            return self.settings.get(&LAST_SEED);
        }
        rand::thread_rng().r#gen()
    }

    fn drain_events(&mut self) {
        let Some(events) = &self.events else {
            return;
        };
        for event in events.try_iter() {
            match event {
                LevelEvent::ChunkGenerated(_)
                | LevelEvent::ChunkLoaded(_)
                | LevelEvent::ChunkUnloaded(_) => {
                    self.summary.chunk_events += 1;
                    if self.config.debug.verbose_logging {
                        log::debug!("{:?}", event);
                    }
                }
                LevelEvent::SpawnPointChanged(point) => self.summary.spawn_point = point,
                LevelEvent::ObjectSpawnFailed {
                    object_id,
                    kind,
                    message,
                } => {
                    self.summary.spawn_failures += 1;
                    log::warn!("Object {} ({:?}) was not placed: {}", object_id, kind, message);
                }
            }
        }
    }

    fn refresh_summary(&mut self) {
        let renderer = &self.world.renderer;
        self.summary.tiles_created = renderer.created;
        self.summary.tiles_destroyed = renderer.destroyed;
        self.summary.frame_changes = renderer.frame_changes;
        self.summary.live_tiles = renderer.live_tiles();
        self.summary.live_bodies = self.world.physics.body_count();
        self.summary.observer = self.path.position();

        match &self.level {
            Some(ActiveLevel::Infinite(level)) => {
                self.summary.chunks_known = level.grid().chunk_count();
                self.summary.chunks_active = level.grid().active().len();
                self.summary.streaming = level.stats();
            }
            Some(ActiveLevel::Tilemap(level)) => self.summary.streaming = level.stats(),
            None => {}
        }
    }
}

impl<S: SettingsStore> SceneLifecycle for WorldScene<S> {
    /// Resolve the seed and load the level's assets
    fn on_preload(&mut self) -> Result<()> {
        let seed = self.resolve_seed();
        self.summary.seed = seed;
        self.settings.set(&LAST_SEED, seed);
        let runs = self.settings.get(&RUN_COUNT);
        self.settings.set(&RUN_COUNT, runs.saturating_add(1));

        let mut level = match &self.source {
            SceneSource::Infinite => {
                let world = tilewalk_core::WorldConfig {
                    seed: Some(seed),
                    ..self.config.world.clone()
                };
                let loader = TiledStructureLoader::new(&self.config.paths.structures_dir);
                ActiveLevel::Infinite(
                    InfiniteLevel::new(world, &loader).context("Failed to build infinite level")?,
                )
            }
            SceneSource::Map(path) => ActiveLevel::Tilemap(
                TilemapLevel::from_path(path, Some(seed))
                    .with_context(|| format!("Failed to load map {}", path.display()))?,
            ),
        };

        self.events = Some(match &mut level {
            ActiveLevel::Infinite(level) => level.subscribe(),
            ActiveLevel::Tilemap(level) => level.subscribe(),
        });
        self.level = Some(level);
        log::info!("Preloaded {:?} scene with seed {}", self.source, seed);
        Ok(())
    }

    /// Build the map, or stream in the chunks around the origin
    fn on_create(&mut self) -> Result<()> {
        let Some(level) = self.level.as_mut() else {
            anyhow::bail!("Scene created before preload");
        };

        match level {
            ActiveLevel::Infinite(level) => {
                let report = level.reconcile(self.path.position(), &mut self.world.services());
                log::info!(
                    "Streamed {} chunks around ({}, {})",
                    report.loaded.len(),
                    report.target.x,
                    report.target.y
                );
            }
            ActiveLevel::Tilemap(level) => {
                level
                    .create(&mut self.world.services())
                    .context("Failed to build tile map level")?;
            }
        }

        self.drain_events();
        self.refresh_summary();
        Ok(())
    }

    fn on_update(&mut self, delta_ms: f32) {
        let observer = self.path.step(delta_ms);
        if let Some(level) = self.level.as_mut() {
            level
                .as_level_mut()
                .update(observer, delta_ms, &mut self.world.services());
        }
        self.summary.ticks += 1;
        self.drain_events();
    }

    fn on_pause(&mut self) {
        log::info!("Paused at tick {}", self.summary.ticks);
    }

    fn on_resume(&mut self) {
        log::info!("Resumed at tick {}", self.summary.ticks);
    }

    fn on_shutdown(&mut self) {
        self.refresh_summary();
        if let Some(level) = self.level.as_mut() {
            level.as_level_mut().shutdown(&mut self.world.services());
        }
        self.drain_events();
        self.events = None;
        log::info!(
            "Scene shut down: {} tiles still live, {} bodies",
            self.world.renderer.live_tiles(),
            self.world.physics.body_count()
        );
    }
}
