//! Chunk - fixed-size square of tiles, the unit of streaming

use glam::{IVec2, Vec2};
use rand_xoshiro::Xoshiro256StarStar;

use super::render::{BodyHandle, TextureKey, TileHandle, TileRenderer};
use super::stats::StreamingStats;
use super::tile_catalog::TileCatalog;
use crate::animation::{AnimatedTileScheduler, AnimationOwner};
use crate::config::TexturePolicy;
use crate::error::LevelError;
use crate::levels::{LevelServices, ObjectPlacement, PopulateReport, populate_objects};
use crate::tilemap::Structure;

/// Everything a chunk needs while loading or unloading
pub(crate) struct ChunkContext<'a, 's> {
    pub chunk_size: u32,
    pub tile_size: u32,
    pub texture_policy: TexturePolicy,
    pub catalog: &'a mut dyn TileCatalog,
    /// Structure stamped into chunks that host one
    pub structure: Option<&'a Structure>,
    pub services: &'a mut LevelServices<'s>,
    pub animations: &'a mut AnimatedTileScheduler,
    pub rng: &'a mut Xoshiro256StarStar,
    pub stats: &'a mut dyn StreamingStats,
}

/// A square region of tiles at a fixed chunk coordinate
///
/// The record is created once per coordinate and lives as long as the level.
/// Only `load` and `unload` flip `loaded`; while unloaded no tile visuals,
/// collision bodies or animation entries exist for the chunk.
#[derive(Debug)]
pub struct Chunk {
    coord: IVec2,
    world_origin: Vec2,
    loaded: bool,

    /// Ground visuals, row-major, `chunk_size * chunk_size` while loaded
    tiles: Vec<TileHandle>,

    /// Ground textures picked on first load (`TexturePolicy::Persist` only)
    textures: Option<Vec<TextureKey>>,

    hosts_structure: bool,
    structure_populated: bool,
    structure_tiles: Vec<TileHandle>,
    structure_bodies: Vec<BodyHandle>,
}

impl Chunk {
    /// Create the record for a coordinate seen for the first time
    pub(crate) fn generate(coord: IVec2, chunk_size: u32, tile_size: u32, hosts_structure: bool) -> Self {
        let span = chunk_size as f32 * tile_size as f32;
        Self {
            coord,
            world_origin: coord.as_vec2() * span,
            loaded: false,
            tiles: Vec::new(),
            textures: None,
            hosts_structure,
            structure_populated: false,
            structure_tiles: Vec::new(),
            structure_bodies: Vec::new(),
        }
    }

    pub fn coord(&self) -> IVec2 {
        self.coord
    }

    /// World position of the chunk's top-left corner
    pub fn world_origin(&self) -> Vec2 {
        self.world_origin
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn tiles(&self) -> &[TileHandle] {
        &self.tiles
    }

    pub fn structure_tiles(&self) -> &[TileHandle] {
        &self.structure_tiles
    }

    pub fn structure_bodies(&self) -> &[BodyHandle] {
        &self.structure_bodies
    }

    pub fn hosts_structure(&self) -> bool {
        self.hosts_structure
    }

    /// Whether the hosted structure's objects have been handed to the spawners
    pub fn structure_populated(&self) -> bool {
        self.structure_populated
    }

    /// Instantiate visuals; the structure's objects are populated on the first
    /// successful load only
    ///
    /// On a renderer failure everything created so far is disposed and the
    /// chunk stays unloaded.
    pub(crate) fn load(
        &mut self,
        ctx: &mut ChunkContext<'_, '_>,
    ) -> Result<Option<PopulateReport>, LevelError> {
        if self.loaded {
            log::trace!("Chunk ({}, {}) already loaded", self.coord.x, self.coord.y);
            return Ok(None);
        }

        let area = ctx.chunk_size as usize * ctx.chunk_size as usize;
        let mut tiles = Vec::with_capacity(area);
        let mut result = self.create_ground(ctx, &mut tiles);

        let structure = ctx.structure.filter(|_| self.hosts_structure);
        if result.is_ok()
            && let Some(structure) = structure
        {
            result = self.stamp_structure(structure, ctx);
        }

        if let Err(source) = result {
            log::error!(
                "Chunk ({}, {}) failed to load, rolling back {} tiles: {:#}",
                self.coord.x,
                self.coord.y,
                tiles.len() + self.structure_tiles.len(),
                source
            );
            for handle in tiles {
                ctx.services.renderer.destroy_tile(handle);
            }
            self.release(ctx);
            return Err(LevelError::ChunkLoad {
                coord: self.coord,
                source,
            });
        }

        self.tiles = tiles;
        self.loaded = true;
        ctx.stats.record_loaded();
        log::debug!(
            "Loaded chunk ({}, {}) with {} tiles",
            self.coord.x,
            self.coord.y,
            self.tiles.len() + self.structure_tiles.len()
        );

        let mut report = None;
        if let Some(structure) = structure
            && !self.structure_populated
        {
            let placement = ObjectPlacement {
                origin: self.world_origin,
                scale: Vec2::new(
                    ctx.tile_size as f32 / structure.tile_width as f32,
                    ctx.tile_size as f32 / structure.tile_height as f32,
                ),
            };
            let populated =
                populate_objects(&structure.objects, placement, ctx.services.hooks, ctx.stats);
            log::info!(
                "Populated structure '{}' in chunk ({}, {}): {} spawned, {} ignored, {} failed",
                structure.key,
                self.coord.x,
                self.coord.y,
                populated.spawned,
                populated.ignored,
                populated.failures.len()
            );
            self.structure_populated = true;
            report = Some(populated);
        }

        Ok(report)
    }

    /// Dispose visuals, bodies and animation entries; the record survives
    pub(crate) fn unload(&mut self, ctx: &mut ChunkContext<'_, '_>) -> bool {
        if !self.loaded {
            log::trace!("Chunk ({}, {}) already unloaded", self.coord.x, self.coord.y);
            return false;
        }

        let tiles = std::mem::take(&mut self.tiles);
        for handle in tiles {
            ctx.services.renderer.destroy_tile(handle);
        }
        self.release(ctx);
        self.loaded = false;
        ctx.stats.record_unloaded();
        log::debug!("Unloaded chunk ({}, {})", self.coord.x, self.coord.y);
        true
    }

    fn create_ground(
        &mut self,
        ctx: &mut ChunkContext<'_, '_>,
        tiles: &mut Vec<TileHandle>,
    ) -> anyhow::Result<()> {
        let size = ctx.chunk_size as i32;
        let tile_size = ctx.tile_size as f32;
        let replay = match ctx.texture_policy {
            TexturePolicy::Persist => self.textures.take(),
            TexturePolicy::Reroll => None,
        };
        let mut picked = Vec::with_capacity(ctx.chunk_size as usize * ctx.chunk_size as usize);

        for local_y in 0..size {
            for local_x in 0..size {
                let texture = match &replay {
                    Some(textures) => textures[picked.len()].clone(),
                    None => ctx.catalog.texture_for(
                        self.coord.x.saturating_mul(size).saturating_add(local_x),
                        self.coord.y.saturating_mul(size).saturating_add(local_y),
                    ),
                };
                let position =
                    self.world_origin + Vec2::new(local_x as f32, local_y as f32) * tile_size;
                let created = ctx.services.renderer.create_tile(position, &texture);
                picked.push(texture);
                match created {
                    Ok(handle) => tiles.push(handle),
                    Err(e) => {
                        // Keep replayed textures for the next attempt
                        self.textures = replay;
                        return Err(e);
                    }
                }
            }
        }

        if ctx.texture_policy == TexturePolicy::Persist {
            self.textures = Some(picked);
        }
        Ok(())
    }

    fn stamp_structure(
        &mut self,
        structure: &Structure,
        ctx: &mut ChunkContext<'_, '_>,
    ) -> anyhow::Result<()> {
        let tile_size = ctx.tile_size as f32;
        let owner = AnimationOwner::Chunk(self.coord);

        for layer in &structure.layers {
            for (local_x, local_y, gid) in layer.placed_tiles() {
                let position =
                    self.world_origin + Vec2::new(local_x as f32, local_y as f32) * tile_size;

                match structure.animations.get(gid) {
                    Some(def) => {
                        let start = AnimatedTileScheduler::start_frame(def, ctx.rng);
                        let texture = TextureKey::Gid(def.frames[start].gid);
                        let handle = ctx.services.renderer.create_tile(position, &texture)?;
                        self.structure_tiles.push(handle);
                        ctx.animations
                            .register(handle, owner, def.frames.clone(), start);
                    }
                    None => {
                        let handle = ctx
                            .services
                            .renderer
                            .create_tile(position, &TextureKey::Gid(gid))?;
                        self.structure_tiles.push(handle);
                    }
                }

                if layer.collides {
                    let body = ctx
                        .services
                        .physics
                        .add_static_rect(position, Vec2::splat(tile_size));
                    self.structure_bodies.push(body);
                }
            }
        }

        Ok(())
    }

    /// Drop structure visuals, bodies and this chunk's animation entries
    fn release(&mut self, ctx: &mut ChunkContext<'_, '_>) {
        ctx.animations.remove_owner(AnimationOwner::Chunk(self.coord));
        for handle in self.structure_tiles.drain(..) {
            ctx.services.renderer.destroy_tile(handle);
        }
        for body in self.structure_bodies.drain(..) {
            ctx.services.physics.remove_body(body);
        }
    }
}
