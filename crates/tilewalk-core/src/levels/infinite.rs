//! Infinite streamed level
//!
//! Each tick the observer's position picks a target chunk. Chunks in the
//! neighbourhood window around it are generated on a miss and loaded if
//! needed; loaded chunks outside the window are unloaded but kept for later.

use glam::{IVec2, Vec2};
use rand_xoshiro::Xoshiro256StarStar;
use std::sync::mpsc::Receiver;

use super::events::{LevelEvent, LevelEvents};
use super::level::{Level, LevelServices};
use super::spawn::PopulateReport;
use crate::animation::AnimatedTileScheduler;
use crate::config::WorldConfig;
use crate::error::LevelError;
use crate::tilemap::{Structure, StructureLoader};
use crate::world::{
    ChunkContext, ChunkGrid, StreamingCounters, TileCatalog, build_catalog, chunk_coord_for,
    seeded_rng,
};

/// What one reconciliation pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub target: IVec2,
    pub generated: Vec<IVec2>,
    pub loaded: Vec<IVec2>,
    pub unloaded: Vec<IVec2>,
    /// Chunks whose load was rolled back; retried next tick
    pub failed: Vec<IVec2>,
}

impl ReconcileReport {
    /// True when the pass did no generate, load or unload work
    pub fn is_noop(&self) -> bool {
        self.generated.is_empty()
            && self.loaded.is_empty()
            && self.unloaded.is_empty()
            && self.failed.is_empty()
    }
}

pub struct InfiniteLevel {
    config: WorldConfig,
    grid: ChunkGrid,
    catalog: Box<dyn TileCatalog>,
    /// Authored structure stamped into the origin chunk
    structure: Option<Structure>,
    animations: AnimatedTileScheduler,
    rng: Xoshiro256StarStar,
    spawn_point: Vec2,
    stats: StreamingCounters,
    events: LevelEvents,
    last_target: Option<IVec2>,
}

impl InfiniteLevel {
    /// Build the level with the catalog described by `config`
    pub fn new(config: WorldConfig, structures: &dyn StructureLoader) -> Result<Self, LevelError> {
        config.validate()?;
        let catalog = build_catalog(&config.catalog, config.seed);
        Self::with_catalog(config, catalog, structures)
    }

    /// Build the level with a caller-supplied tile rule
    ///
    /// Fails on invalid sizes or a missing origin structure.
    pub fn with_catalog(
        config: WorldConfig,
        catalog: Box<dyn TileCatalog>,
        structures: &dyn StructureLoader,
    ) -> Result<Self, LevelError> {
        config.validate()?;

        let structure = match &config.origin_structure {
            Some(key) => Some(structures.load(key)?),
            None => None,
        };

        log::info!(
            "Infinite level ready: chunk {}x{} tiles of {} units, {:?} window, {:?} textures, origin structure {:?}",
            config.chunk_size,
            config.chunk_size,
            config.tile_size,
            config.neighborhood,
            config.tile_textures,
            config.origin_structure
        );

        Ok(Self {
            rng: seeded_rng(config.seed),
            config,
            grid: ChunkGrid::new(),
            catalog,
            structure,
            animations: AnimatedTileScheduler::new(),
            spawn_point: Vec2::ZERO,
            stats: StreamingCounters::default(),
            events: LevelEvents::new(),
            last_target: None,
        })
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn grid(&self) -> &ChunkGrid {
        &self.grid
    }

    pub fn structure(&self) -> Option<&Structure> {
        self.structure.as_ref()
    }

    pub fn stats(&self) -> StreamingCounters {
        self.stats
    }

    pub fn subscribe(&mut self) -> Receiver<LevelEvent> {
        self.events.subscribe()
    }

    /// Chunk the observer is considered to be in
    pub fn target_chunk(&self, observer: Vec2) -> IVec2 {
        chunk_coord_for(observer, self.config.chunk_span())
    }

    /// Bring the loaded set in line with the observer's neighbourhood
    ///
    /// Running it again with the same observer position does no work.
    pub fn reconcile(
        &mut self,
        observer: Vec2,
        services: &mut LevelServices<'_>,
    ) -> ReconcileReport {
        let target = self.target_chunk(observer);
        let window = self.config.neighborhood.window(target);
        let mut report = ReconcileReport {
            target,
            ..Default::default()
        };
        let mut populated: Vec<PopulateReport> = Vec::new();

        if self.last_target != Some(target) {
            log::debug!("Observer entered chunk ({}, {})", target.x, target.y);
            self.last_target = Some(target);
        }

        let mut ctx = ChunkContext {
            chunk_size: self.config.chunk_size,
            tile_size: self.config.tile_size,
            texture_policy: self.config.tile_textures,
            catalog: &mut *self.catalog,
            structure: self.structure.as_ref(),
            services,
            animations: &mut self.animations,
            rng: &mut self.rng,
            stats: &mut self.stats,
        };

        for &coord in &window {
            let outcome = self.grid.ensure_loaded(coord, &mut ctx);
            if outcome.generated {
                report.generated.push(coord);
            }
            if outcome.loaded {
                report.loaded.push(coord);
            }
            populated.extend(outcome.populated);
            if let Some(e) = outcome.failure {
                log::warn!("{}; retrying next tick", e);
                report.failed.push(coord);
            }
        }

        let stale: Vec<IVec2> = self
            .grid
            .active()
            .iter()
            .filter(|coord| !window.contains(coord))
            .copied()
            .collect();
        for coord in stale {
            if self.grid.unload(coord, &mut ctx) {
                report.unloaded.push(coord);
            }
        }

        for populate in populated {
            self.apply_populate(populate);
        }
        self.emit_report(&report);

        report
    }

    fn apply_populate(&mut self, report: PopulateReport) {
        if let Some(spawn_point) = report.spawn_point {
            self.spawn_point = spawn_point;
            self.events.emit(LevelEvent::SpawnPointChanged(spawn_point));
        }
        for failure in report.failures {
            self.events.emit(LevelEvent::ObjectSpawnFailed {
                object_id: failure.object_id,
                kind: failure.kind,
                message: failure.message,
            });
        }
    }

    fn emit_report(&mut self, report: &ReconcileReport) {
        for &coord in &report.generated {
            self.events.emit(LevelEvent::ChunkGenerated(coord));
        }
        for &coord in &report.loaded {
            self.events.emit(LevelEvent::ChunkLoaded(coord));
        }
        for &coord in &report.unloaded {
            self.events.emit(LevelEvent::ChunkUnloaded(coord));
        }
    }
}

impl Level for InfiniteLevel {
    fn spawn_point(&self) -> Vec2 {
        self.spawn_point
    }

    fn update(&mut self, observer: Vec2, delta_ms: f32, services: &mut LevelServices<'_>) {
        self.reconcile(observer, services);
        self.animations.tick(delta_ms, services.renderer);
    }

    fn animated_tiles(&self) -> &AnimatedTileScheduler {
        &self.animations
    }

    /// Unload every chunk and drop all chunk records
    fn shutdown(&mut self, services: &mut LevelServices<'_>) {
        let mut ctx = ChunkContext {
            chunk_size: self.config.chunk_size,
            tile_size: self.config.tile_size,
            texture_policy: self.config.tile_textures,
            catalog: &mut *self.catalog,
            structure: self.structure.as_ref(),
            services,
            animations: &mut self.animations,
            rng: &mut self.rng,
            stats: &mut self.stats,
        };

        let active: Vec<IVec2> = self.grid.active().to_vec();
        for coord in active {
            self.grid.unload(coord, &mut ctx);
        }

        log::info!(
            "Infinite level shut down after generating {} chunks",
            self.grid.chunk_count()
        );
        self.animations.clear();
        self.grid = ChunkGrid::new();
        self.last_target = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Neighborhood, TexturePolicy};
    use crate::test_support::{RecordingHooks, RecordingPhysics, RecordingRenderer, camp_structure};
    use crate::tilemap::StaticStructureLoader;
    use crate::world::TextureKey;

    #[derive(Default)]
    struct Harness {
        renderer: RecordingRenderer,
        physics: RecordingPhysics,
        hooks: RecordingHooks,
    }

    impl Harness {
        fn services(&mut self) -> LevelServices<'_> {
            LevelServices::new(&mut self.renderer, &mut self.physics, &mut self.hooks)
        }
    }

    /// Hands out a fresh texture name on every call
    #[derive(Default)]
    struct SequenceCatalog {
        calls: u32,
    }

    impl TileCatalog for SequenceCatalog {
        fn texture_for(&mut self, _tile_x: i32, _tile_y: i32) -> TextureKey {
            self.calls += 1;
            TextureKey::named(&format!("t{}", self.calls))
        }
    }

    /// 2x2 tile chunks of 10 units, so one chunk spans 20 units
    fn small_config() -> WorldConfig {
        WorldConfig {
            chunk_size: 2,
            tile_size: 10,
            seed: Some(7),
            ..Default::default()
        }
    }

    fn camp_level(config: WorldConfig) -> InfiniteLevel {
        let loader = StaticStructureLoader::new().with(camp_structure());
        InfiniteLevel::new(
            WorldConfig {
                origin_structure: Some("camp".to_string()),
                ..config
            },
            &loader,
        )
        .unwrap()
    }

    fn coords(list: &[(i32, i32)]) -> Vec<IVec2> {
        list.iter().map(|&(x, y)| IVec2::new(x, y)).collect()
    }

    #[test]
    fn test_first_reconcile_builds_origin_window() {
        let mut level = InfiniteLevel::new(small_config(), &StaticStructureLoader::new()).unwrap();
        let mut h = Harness::default();

        let report = level.reconcile(Vec2::ZERO, &mut h.services());

        let window = coords(&[(-1, -1), (-1, 0), (0, -1), (0, 0)]);
        assert_eq!(report.target, IVec2::ZERO);
        assert_eq!(report.generated, window);
        assert_eq!(report.loaded, window);
        assert!(report.unloaded.is_empty());
        assert_eq!(level.grid().active(), window.as_slice());
        assert_eq!(h.renderer.live.len(), 16);
        assert_eq!(level.stats().generated, 4);
        assert_eq!(level.stats().loaded, 4);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut level = InfiniteLevel::new(small_config(), &StaticStructureLoader::new()).unwrap();
        let mut h = Harness::default();

        level.reconcile(Vec2::new(3.0, -4.0), &mut h.services());
        let created = h.renderer.created;
        let report = level.reconcile(Vec2::new(3.0, -4.0), &mut h.services());

        assert!(report.is_noop());
        assert_eq!(h.renderer.created, created);
        assert_eq!(h.renderer.destroyed, 0);
    }

    #[test]
    fn test_moving_unloads_stale_chunks_and_keeps_records() {
        let mut level = InfiniteLevel::new(small_config(), &StaticStructureLoader::new()).unwrap();
        let mut h = Harness::default();
        level.reconcile(Vec2::ZERO, &mut h.services());

        let report = level.reconcile(Vec2::new(21.0, 0.0), &mut h.services());

        assert_eq!(report.target, IVec2::new(1, 0));
        assert_eq!(report.generated, coords(&[(1, -1), (1, 0)]));
        assert_eq!(report.loaded, coords(&[(1, -1), (1, 0)]));
        assert_eq!(report.unloaded, coords(&[(-1, -1), (-1, 0)]));
        assert_eq!(level.grid().chunk_count(), 6);
        assert_eq!(level.grid().active().len(), 4);
        assert_eq!(h.renderer.live.len(), 16);

        let stale = level.grid().get(IVec2::new(-1, -1)).unwrap();
        assert!(!stale.is_loaded());
        assert!(stale.tiles().is_empty());

        let back = level.reconcile(Vec2::ZERO, &mut h.services());
        assert!(back.generated.is_empty());
        assert_eq!(back.loaded, coords(&[(-1, -1), (-1, 0)]));
        assert_eq!(level.grid().chunk_count(), 6);
    }

    #[test]
    fn test_symmetric_window_loads_nine() {
        let config = WorldConfig {
            neighborhood: Neighborhood::Symmetric,
            ..small_config()
        };
        let mut level = InfiniteLevel::new(config, &StaticStructureLoader::new()).unwrap();
        let mut h = Harness::default();

        level.reconcile(Vec2::ZERO, &mut h.services());
        assert_eq!(level.grid().active().len(), 9);

        let report = level.reconcile(Vec2::new(20.0, 0.0), &mut h.services());
        assert_eq!(report.unloaded, coords(&[(-1, -1), (-1, 0), (-1, 1)]));
        assert_eq!(level.grid().active().len(), 9);
    }

    #[test]
    fn test_reroll_picks_new_textures_on_reload() {
        let mut level = InfiniteLevel::with_catalog(
            small_config(),
            Box::new(SequenceCatalog::default()),
            &StaticStructureLoader::new(),
        )
        .unwrap();
        let mut h = Harness::default();
        let corner = [Vec2::new(-20.0, -20.0), Vec2::new(-10.0, -10.0)];

        level.reconcile(Vec2::ZERO, &mut h.services());
        let first = h.renderer.textures_at(&corner);
        level.reconcile(Vec2::new(40.0, 0.0), &mut h.services());
        level.reconcile(Vec2::ZERO, &mut h.services());

        assert_ne!(h.renderer.textures_at(&corner), first);
    }

    #[test]
    fn test_persist_replays_textures_on_reload() {
        let config = WorldConfig {
            tile_textures: TexturePolicy::Persist,
            ..small_config()
        };
        let mut level = InfiniteLevel::with_catalog(
            config,
            Box::new(SequenceCatalog::default()),
            &StaticStructureLoader::new(),
        )
        .unwrap();
        let mut h = Harness::default();
        let corner = [Vec2::new(-20.0, -20.0), Vec2::new(-10.0, -10.0)];

        level.reconcile(Vec2::ZERO, &mut h.services());
        let first = h.renderer.textures_at(&corner);
        level.reconcile(Vec2::new(40.0, 0.0), &mut h.services());
        level.reconcile(Vec2::ZERO, &mut h.services());

        assert_eq!(h.renderer.textures_at(&corner), first);
    }

    #[test]
    fn test_origin_structure_populates_once() {
        let mut level = camp_level(small_config());
        let mut h = Harness::default();
        let events = level.subscribe();

        level.reconcile(Vec2::ZERO, &mut h.services());

        let origin = level.grid().get(IVec2::ZERO).unwrap();
        assert!(origin.hosts_structure());
        assert!(origin.structure_populated());
        assert_eq!(origin.structure_tiles().len(), 3);
        assert_eq!(origin.structure_bodies().len(), 1);
        assert_eq!(level.animated_tiles().len(), 1);
        assert_eq!(h.physics.live.len(), 1);
        assert_eq!(h.hooks.spawn_points, vec![Vec2::new(10.0, 10.0)]);
        assert_eq!(h.hooks.enemies, vec![("slime".to_string(), Vec2::new(5.0, 0.0))]);
        assert_eq!(level.spawn_point(), Vec2::new(10.0, 10.0));
        assert!(
            events
                .try_iter()
                .any(|e| e == LevelEvent::SpawnPointChanged(Vec2::new(10.0, 10.0)))
        );

        // Leave the origin, then come back
        level.reconcile(Vec2::new(40.0, 0.0), &mut h.services());
        assert!(level.animated_tiles().is_empty());
        assert!(h.physics.live.is_empty());

        level.reconcile(Vec2::ZERO, &mut h.services());
        assert_eq!(h.hooks.spawn_points.len(), 1);
        assert_eq!(h.hooks.enemies.len(), 1);
        assert_eq!(level.animated_tiles().len(), 1);
        assert_eq!(h.physics.live.len(), 1);
        assert_eq!(level.grid().get(IVec2::ZERO).unwrap().structure_tiles().len(), 3);
    }

    #[test]
    fn test_spawn_failure_is_reported_and_skipped() {
        let mut level = camp_level(small_config());
        let mut h = Harness::default();
        h.hooks.fail_enemies = true;
        let events = level.subscribe();

        level.reconcile(Vec2::ZERO, &mut h.services());

        assert_eq!(h.hooks.spawn_points.len(), 1);
        assert_eq!(level.stats().spawn_failures, 1);
        let failed: Vec<LevelEvent> = events
            .try_iter()
            .filter(|e| matches!(e, LevelEvent::ObjectSpawnFailed { .. }))
            .collect();
        assert_eq!(failed.len(), 1);
        assert!(level.grid().is_active(IVec2::ZERO));
    }

    #[test]
    fn test_renderer_failure_rolls_back_and_retries() {
        let mut level = InfiniteLevel::new(small_config(), &StaticStructureLoader::new()).unwrap();
        let mut h = Harness::default();
        h.renderer.fail_after = Some(5);
        let events = level.subscribe();

        let report = level.reconcile(Vec2::ZERO, &mut h.services());

        let window = coords(&[(-1, -1), (-1, 0), (0, -1), (0, 0)]);
        assert_eq!(report.loaded, coords(&[(-1, -1)]));
        assert_eq!(report.failed, coords(&[(-1, 0), (0, -1), (0, 0)]));
        assert_eq!(report.generated, window);
        assert_eq!(level.stats().generated, 4);
        assert_eq!(level.grid().chunk_count(), 4);
        assert_eq!(h.renderer.live.len(), 4);
        assert_eq!(level.grid().active(), coords(&[(-1, -1)]).as_slice());
        assert!(!level.grid().get(IVec2::new(-1, 0)).unwrap().is_loaded());

        let generated: Vec<IVec2> = events
            .try_iter()
            .filter_map(|e| match e {
                LevelEvent::ChunkGenerated(coord) => Some(coord),
                _ => None,
            })
            .collect();
        assert_eq!(generated, window);

        h.renderer.fail_after = None;
        let retry = level.reconcile(Vec2::ZERO, &mut h.services());
        assert!(retry.generated.is_empty());
        assert_eq!(retry.loaded, coords(&[(-1, 0), (0, -1), (0, 0)]));
        assert_eq!(h.renderer.live.len(), 16);
        assert!(
            !events
                .try_iter()
                .any(|e| matches!(e, LevelEvent::ChunkGenerated(_)))
        );
    }

    #[test]
    fn test_far_observer_saturates_at_coordinate_edge() {
        let config = WorldConfig {
            chunk_size: 1,
            tile_size: 1,
            ..small_config()
        };
        let mut level = InfiniteLevel::new(config, &StaticStructureLoader::new()).unwrap();
        let mut h = Harness::default();

        let east = level.reconcile(Vec2::new(3.0e9, 0.0), &mut h.services());
        assert_eq!(east.target, IVec2::new(i32::MAX, 0));
        assert_eq!(east.loaded.len(), 4);
        assert!(east.loaded.contains(&IVec2::new(i32::MAX, 0)));

        let west = level.reconcile(Vec2::new(-3.0e9, -3.0e9), &mut h.services());
        assert_eq!(west.target, IVec2::new(i32::MIN, i32::MIN));
        assert_eq!(west.loaded.len(), 4);
        assert_eq!(west.unloaded.len(), 4);
        assert_eq!(level.grid().active().len(), 4);
        assert_eq!(h.renderer.live.len(), 4);
    }

    #[test]
    fn test_structure_failure_rolls_back_ground_tiles() {
        let mut level = camp_level(small_config());
        let mut h = Harness::default();
        // Three ground chunks plus the origin's ground fit, its structure does not
        h.renderer.fail_after = Some(17);

        let report = level.reconcile(Vec2::ZERO, &mut h.services());

        assert_eq!(report.failed, coords(&[(0, 0)]));
        assert_eq!(h.renderer.live.len(), 12);
        assert!(h.physics.live.is_empty());
        assert!(level.animated_tiles().is_empty());
        assert!(h.hooks.spawn_points.is_empty());
        assert!(!level.grid().get(IVec2::ZERO).unwrap().structure_populated());
    }

    #[test]
    fn test_update_advances_structure_animation() {
        let mut level = camp_level(small_config());
        let mut h = Harness::default();

        level.update(Vec2::ZERO, 50.0, &mut h.services());
        assert!(h.renderer.frame_changes.is_empty());

        level.update(Vec2::ZERO, 50.0, &mut h.services());
        assert_eq!(h.renderer.frame_changes.len(), 1);
        assert_eq!(h.renderer.frame_changes[0].1, 14);
    }

    #[test]
    fn test_shutdown_disposes_everything() {
        let mut level = camp_level(small_config());
        let mut h = Harness::default();
        level.reconcile(Vec2::ZERO, &mut h.services());

        level.shutdown(&mut h.services());

        assert!(h.renderer.live.is_empty());
        assert!(h.physics.live.is_empty());
        assert!(level.animated_tiles().is_empty());
        assert_eq!(level.grid().chunk_count(), 0);
        assert!(level.grid().active().is_empty());
    }

    #[test]
    fn test_missing_origin_structure_fails() {
        let config = WorldConfig {
            origin_structure: Some("nowhere".to_string()),
            ..small_config()
        };
        let err = InfiniteLevel::new(config, &StaticStructureLoader::new()).err().unwrap();
        assert!(matches!(err, LevelError::Structure(_)));
    }
}
