//! Tileset animation metadata, resolved to global tile ids

use std::collections::HashMap;
use std::sync::Arc;

use crate::tilemap::{TiledTileset, property_bool};

/// Tile property that starts each instance on a random frame
pub const RANDOM_START_PROPERTY: &str = "randomStart";

/// One step of a tile animation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationFrame {
    pub duration_ms: f32,
    /// Global tile id shown during this frame
    pub gid: u32,
}

impl AnimationFrame {
    pub fn new(duration_ms: f32, gid: u32) -> Self {
        Self { duration_ms, gid }
    }
}

/// Animation attached to one tileset tile
#[derive(Debug, Clone)]
pub struct AnimationDef {
    pub frames: Arc<[AnimationFrame]>,
    pub random_start: bool,
}

/// Global tile id -> animation, built once from map metadata
#[derive(Debug, Clone, Default)]
pub struct ChunkAnimationTable {
    entries: HashMap<u32, AnimationDef>,
}

impl ChunkAnimationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every animated tile across the tilesets
    ///
    /// Tile ids inside a tileset are local; frame and key gids are offset by
    /// the tileset's `firstgid`. Tiles without frames are skipped.
    pub fn from_tilesets(tilesets: &[TiledTileset]) -> Self {
        let mut table = Self::new();

        for tileset in tilesets {
            if let Some(source) = &tileset.source {
                log::warn!(
                    "External tileset '{}' (firstgid {}) is not embedded; its animations are ignored",
                    source,
                    tileset.firstgid
                );
                continue;
            }

            for tile in &tileset.tiles {
                if tile.animation.is_empty() {
                    continue;
                }
                let frames: Vec<AnimationFrame> = tile
                    .animation
                    .iter()
                    .map(|f| AnimationFrame::new(f.duration as f32, tileset.firstgid + f.tileid))
                    .collect();
                let random_start = property_bool(&tile.properties, RANDOM_START_PROPERTY);
                table.insert(tileset.firstgid + tile.id, frames, random_start);
            }
        }

        log::debug!("Built animation table with {} animated tiles", table.len());
        table
    }

    pub fn insert(&mut self, gid: u32, frames: Vec<AnimationFrame>, random_start: bool) {
        self.entries.insert(
            gid,
            AnimationDef {
                frames: frames.into(),
                random_start,
            },
        );
    }

    pub fn get(&self, gid: u32) -> Option<&AnimationDef> {
        self.entries.get(&gid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
