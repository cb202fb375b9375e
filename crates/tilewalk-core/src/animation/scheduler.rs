//! Advances animated tile instances independently of chunk streaming

use glam::IVec2;
use std::sync::Arc;

use super::table::{AnimationDef, AnimationFrame};
use crate::world::render::{TileHandle, TileRenderer};
use crate::world::rng_trait::WorldRng;

/// Who created an animated tile, so its entries can be dropped together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationOwner {
    Chunk(IVec2),
    Map,
}

/// Frame state for one placed animated tile
#[derive(Debug, Clone)]
pub struct AnimatedTileEntry {
    tile: TileHandle,
    owner: AnimationOwner,
    frames: Arc<[AnimationFrame]>,
    current_frame: usize,
    remaining_ms: f32,
}

impl AnimatedTileEntry {
    /// `frames` must be non-empty and `start_frame` in range
    fn new(
        tile: TileHandle,
        owner: AnimationOwner,
        frames: Arc<[AnimationFrame]>,
        start_frame: usize,
    ) -> Self {
        let remaining_ms = frames[start_frame].duration_ms;
        Self {
            tile,
            owner,
            frames,
            current_frame: start_frame,
            remaining_ms,
        }
    }

    pub fn tile(&self) -> TileHandle {
        self.tile
    }

    pub fn owner(&self) -> AnimationOwner {
        self.owner
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn current_gid(&self) -> u32 {
        self.frames[self.current_frame].gid
    }

    pub fn remaining_ms(&self) -> f32 {
        self.remaining_ms
    }

    /// Returns the gid to display when the frame changed
    fn advance(&mut self, delta_ms: f32) -> Option<u32> {
        self.remaining_ms -= delta_ms;
        if self.remaining_ms > 0.0 {
            return None;
        }

        // One frame per tick; the new frame gets its full duration
        self.current_frame = (self.current_frame + 1) % self.frames.len();
        let frame = self.frames[self.current_frame];
        self.remaining_ms = frame.duration_ms;
        Some(frame.gid)
    }
}

/// All animated tile instances that currently have live visuals
#[derive(Debug, Default)]
pub struct AnimatedTileScheduler {
    entries: Vec<AnimatedTileEntry>,
}

impl AnimatedTileScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick the frame a new instance starts on
    ///
    /// Create the tile visual with `def.frames[start].gid`, then `register` it.
    pub fn start_frame<R: WorldRng + ?Sized>(def: &AnimationDef, rng: &mut R) -> usize {
        if def.random_start && def.frames.len() > 1 {
            rng.gen_index(def.frames.len())
        } else {
            0
        }
    }

    /// Track a tile visual; empty frame lists are ignored
    pub fn register(
        &mut self,
        tile: TileHandle,
        owner: AnimationOwner,
        frames: Arc<[AnimationFrame]>,
        start_frame: usize,
    ) -> bool {
        if frames.is_empty() {
            return false;
        }
        let start_frame = start_frame.min(frames.len() - 1);
        self.entries
            .push(AnimatedTileEntry::new(tile, owner, frames, start_frame));
        true
    }

    /// Drop every entry created by `owner`, returning how many were removed
    pub fn remove_owner(&mut self, owner: AnimationOwner) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.owner != owner);
        before - self.entries.len()
    }

    /// Advance every entry by `delta_ms` and push frame changes to the renderer
    pub fn tick(&mut self, delta_ms: f32, renderer: &mut dyn TileRenderer) {
        for entry in &mut self.entries {
            if let Some(gid) = entry.advance(delta_ms) {
                renderer.set_tile_frame(entry.tile, gid);
            }
        }
    }

    pub fn entry(&self, tile: TileHandle) -> Option<&AnimatedTileEntry> {
        self.entries.iter().find(|entry| entry.tile == tile)
    }

    pub fn entries(&self) -> &[AnimatedTileEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
