//! Finite level built once from an authored tile map

use glam::Vec2;
use rand_xoshiro::Xoshiro256StarStar;
use std::path::Path;
use std::sync::mpsc::Receiver;

use super::events::{LevelEvent, LevelEvents};
use super::level::{Level, LevelServices};
use super::spawn::{ObjectPlacement, PopulateReport, SpawnHooks, populate_objects};
use crate::animation::{AnimatedTileScheduler, AnimationOwner, ChunkAnimationTable};
use crate::error::LevelError;
use crate::tilemap::{GID_MASK, MapObject, TiledMap};
use crate::world::{
    BodyHandle, CollisionWorld, StreamingCounters, TextureKey, TileHandle, TileRenderer,
    seeded_rng,
};

/// One-way build progression of a tile map level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TilemapState {
    Uninitialized,
    LayersBuilt,
    ObjectsPopulated,
    Running,
    Shutdown,
}

impl TilemapState {
    pub fn name(self) -> &'static str {
        match self {
            TilemapState::Uninitialized => "Uninitialized",
            TilemapState::LayersBuilt => "LayersBuilt",
            TilemapState::ObjectsPopulated => "ObjectsPopulated",
            TilemapState::Running => "Running",
            TilemapState::Shutdown => "Shutdown",
        }
    }
}

pub struct TilemapLevel {
    map: TiledMap,
    state: TilemapState,
    animation_table: ChunkAnimationTable,
    animations: AnimatedTileScheduler,
    tiles: Vec<TileHandle>,
    bodies: Vec<BodyHandle>,
    spawn_point: Vec2,
    rng: Xoshiro256StarStar,
    stats: StreamingCounters,
    events: LevelEvents,
}

impl TilemapLevel {
    pub fn new(map: TiledMap, seed: Option<u64>) -> Result<Self, LevelError> {
        map.validate()?;
        Ok(Self {
            map,
            state: TilemapState::Uninitialized,
            animation_table: ChunkAnimationTable::new(),
            animations: AnimatedTileScheduler::new(),
            tiles: Vec::new(),
            bodies: Vec::new(),
            spawn_point: Vec2::ZERO,
            rng: seeded_rng(seed),
            stats: StreamingCounters::default(),
            events: LevelEvents::new(),
        })
    }

    pub fn from_path(path: &Path, seed: Option<u64>) -> Result<Self, LevelError> {
        Self::new(TiledMap::from_path(path)?, seed)
    }

    pub fn state(&self) -> TilemapState {
        self.state
    }

    pub fn tiles(&self) -> &[TileHandle] {
        &self.tiles
    }

    pub fn bodies(&self) -> &[BodyHandle] {
        &self.bodies
    }

    pub fn animation_table(&self) -> &ChunkAnimationTable {
        &self.animation_table
    }

    pub fn stats(&self) -> StreamingCounters {
        self.stats
    }

    pub fn subscribe(&mut self) -> Receiver<LevelEvent> {
        self.events.subscribe()
    }

    fn transition(&mut self, from: TilemapState, to: TilemapState) -> Result<(), LevelError> {
        if self.state != from {
            return Err(LevelError::InvalidTransition {
                from: self.state.name(),
                to: to.name(),
            });
        }
        self.state = to;
        Ok(())
    }

    /// Run the whole build: layers, objects, then start
    pub fn create(&mut self, services: &mut LevelServices<'_>) -> Result<PopulateReport, LevelError> {
        self.build_layers(services.renderer, services.physics)?;
        let report = self.populate_objects(services.hooks)?;
        self.start()?;
        Ok(report)
    }

    /// Instantiate every tile, tag animated ones and build static collision
    ///
    /// A renderer failure disposes what was created and leaves the level
    /// uninitialized.
    pub fn build_layers(
        &mut self,
        renderer: &mut dyn TileRenderer,
        physics: &mut dyn CollisionWorld,
    ) -> Result<(), LevelError> {
        if self.state != TilemapState::Uninitialized {
            return Err(LevelError::InvalidTransition {
                from: self.state.name(),
                to: TilemapState::LayersBuilt.name(),
            });
        }

        self.animation_table = ChunkAnimationTable::from_tilesets(&self.map.tilesets);
        let tile_size = Vec2::new(self.map.tilewidth as f32, self.map.tileheight as f32);

        let mut failure = None;
        'layers: for layer in self.map.tile_layers() {
            let collides = layer.collides();
            let width = layer.width.max(1);

            for (index, raw_gid) in layer.data.iter().enumerate() {
                let gid = raw_gid & GID_MASK;
                if gid == 0 {
                    continue;
                }
                let (x, y) = (index as u32 % width, index as u32 / width);
                let position = Vec2::new(x as f32, y as f32) * tile_size;

                let created = match self.animation_table.get(gid) {
                    Some(def) => {
                        let start = AnimatedTileScheduler::start_frame(def, &mut self.rng);
                        renderer
                            .create_tile(position, &TextureKey::Gid(def.frames[start].gid))
                            .map(|handle| {
                                self.animations.register(
                                    handle,
                                    AnimationOwner::Map,
                                    def.frames.clone(),
                                    start,
                                );
                                handle
                            })
                    }
                    None => renderer.create_tile(position, &TextureKey::Gid(gid)),
                };

                match created {
                    Ok(handle) => self.tiles.push(handle),
                    Err(source) => {
                        failure = Some(LevelError::Map {
                            layer: layer.name.clone(),
                            source,
                        });
                        break 'layers;
                    }
                }

                if collides {
                    self.bodies.push(physics.add_static_rect(position, tile_size));
                }
            }
        }

        if let Some(err) = failure {
            self.dispose(renderer, physics);
            return Err(err);
        }

        log::info!(
            "Built tile map layers: {} tiles, {} animated, {} collision bodies",
            self.tiles.len(),
            self.animations.len(),
            self.bodies.len()
        );
        self.state = TilemapState::LayersBuilt;
        Ok(())
    }

    /// Dispatch the object layers to the spawners, once
    pub fn populate_objects(
        &mut self,
        hooks: &mut dyn SpawnHooks,
    ) -> Result<PopulateReport, LevelError> {
        self.transition(TilemapState::LayersBuilt, TilemapState::ObjectsPopulated)?;

        let objects: Vec<MapObject> = self.map.objects().map(MapObject::from).collect();
        let report = populate_objects(&objects, ObjectPlacement::IDENTITY, hooks, &mut self.stats);

        if let Some(spawn_point) = report.spawn_point {
            self.spawn_point = spawn_point;
            self.events.emit(LevelEvent::SpawnPointChanged(spawn_point));
        }
        for failure in &report.failures {
            self.events.emit(LevelEvent::ObjectSpawnFailed {
                object_id: failure.object_id,
                kind: failure.kind,
                message: failure.message.clone(),
            });
        }

        Ok(report)
    }

    pub fn start(&mut self) -> Result<(), LevelError> {
        self.transition(TilemapState::ObjectsPopulated, TilemapState::Running)
    }

    fn dispose(&mut self, renderer: &mut dyn TileRenderer, physics: &mut dyn CollisionWorld) {
        self.animations.clear();
        for handle in self.tiles.drain(..) {
            renderer.destroy_tile(handle);
        }
        for body in self.bodies.drain(..) {
            physics.remove_body(body);
        }
    }
}

impl Level for TilemapLevel {
    fn spawn_point(&self) -> Vec2 {
        self.spawn_point
    }

    /// Only animations advance; the map never streams
    fn update(&mut self, _observer: Vec2, delta_ms: f32, services: &mut LevelServices<'_>) {
        if self.state == TilemapState::Running {
            self.animations.tick(delta_ms, services.renderer);
        }
    }

    fn animated_tiles(&self) -> &AnimatedTileScheduler {
        &self.animations
    }

    fn shutdown(&mut self, services: &mut LevelServices<'_>) {
        self.dispose(services.renderer, services.physics);
        self.state = TilemapState::Shutdown;
        log::info!("Tile map level shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CAMP_JSON, RecordingHooks, RecordingPhysics, RecordingRenderer};

    fn camp_map() -> TiledMap {
        TiledMap::from_json_str(CAMP_JSON).unwrap()
    }

    #[test]
    fn test_create_runs_full_build() {
        let mut level = TilemapLevel::new(camp_map(), Some(1)).unwrap();
        let (mut renderer, mut physics, mut hooks) = (
            RecordingRenderer::default(),
            RecordingPhysics::default(),
            RecordingHooks::default(),
        );
        let events = level.subscribe();

        let report = level
            .create(&mut LevelServices::new(&mut renderer, &mut physics, &mut hooks))
            .unwrap();

        assert_eq!(level.state(), TilemapState::Running);
        assert_eq!(level.tiles().len(), 3);
        assert_eq!(level.bodies().len(), 1);
        assert_eq!(physics.live[&level.bodies()[0]], (Vec2::new(16.0, 0.0), Vec2::splat(16.0)));
        assert_eq!(level.animated_tiles().len(), 1);
        assert_eq!(level.animation_table().len(), 1);
        assert_eq!(report.spawned, 2);
        assert_eq!(level.spawn_point(), Vec2::new(16.0, 16.0));
        assert_eq!(hooks.enemies, vec![("slime".to_string(), Vec2::new(8.0, 0.0))]);
        assert_eq!(
            events.try_recv().unwrap(),
            LevelEvent::SpawnPointChanged(Vec2::new(16.0, 16.0))
        );
    }

    #[test]
    fn test_steps_must_run_in_order() {
        let mut level = TilemapLevel::new(camp_map(), Some(1)).unwrap();
        let mut hooks = RecordingHooks::default();

        let err = level.populate_objects(&mut hooks).unwrap_err();
        assert!(matches!(
            err,
            LevelError::InvalidTransition {
                from: "Uninitialized",
                to: "ObjectsPopulated"
            }
        ));
        assert!(level.start().is_err());
        assert!(hooks.spawn_points.is_empty());
    }

    #[test]
    fn test_layers_build_only_once() {
        let mut level = TilemapLevel::new(camp_map(), Some(1)).unwrap();
        let (mut renderer, mut physics) = (RecordingRenderer::default(), RecordingPhysics::default());

        level.build_layers(&mut renderer, &mut physics).unwrap();
        assert!(level.build_layers(&mut renderer, &mut physics).is_err());
        assert_eq!(renderer.created, 3);
    }

    #[test]
    fn test_layer_failure_disposes_partial_build() {
        let mut level = TilemapLevel::new(camp_map(), Some(1)).unwrap();
        let (mut renderer, mut physics) = (RecordingRenderer::default(), RecordingPhysics::default());
        renderer.fail_after = Some(2);

        let err = level.build_layers(&mut renderer, &mut physics).unwrap_err();

        assert!(matches!(err, LevelError::Map { ref layer, .. } if layer == "walls"));
        assert_eq!(level.state(), TilemapState::Uninitialized);
        assert!(renderer.live.is_empty());
        assert!(level.tiles().is_empty());
        assert!(level.animated_tiles().is_empty());
    }

    #[test]
    fn test_update_only_animates_while_running() {
        let mut level = TilemapLevel::new(camp_map(), Some(1)).unwrap();
        let (mut renderer, mut physics, mut hooks) = (
            RecordingRenderer::default(),
            RecordingPhysics::default(),
            RecordingHooks::default(),
        );

        level.build_layers(&mut renderer, &mut physics).unwrap();
        let mut services = LevelServices::new(&mut renderer, &mut physics, &mut hooks);
        level.update(Vec2::ZERO, 500.0, &mut services);
        assert!(level.animated_tiles().entries()[0].current_frame() == 0);

        level.populate_objects(services.hooks).unwrap();
        level.start().unwrap();
        level.update(Vec2::ZERO, 100.0, &mut services);
        assert_eq!(level.animated_tiles().entries()[0].current_frame(), 1);

        level.shutdown(&mut services);
        assert_eq!(level.state(), TilemapState::Shutdown);
        assert!(renderer.live.is_empty());
        assert!(physics.live.is_empty());
    }

    #[test]
    fn test_rejects_malformed_layer() {
        let map = TiledMap::from_json_str(
            r#"{ "width": 2, "height": 2, "tilewidth": 8, "tileheight": 8,
                 "layers": [{ "type": "tilelayer", "name": "ground", "width": 2, "height": 2, "data": [1] }] }"#,
        )
        .unwrap();
        assert!(matches!(
            TilemapLevel::new(map, None).err().unwrap(),
            LevelError::Structure(_)
        ));
    }
}
