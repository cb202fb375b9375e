//! Sparse chunk storage split into four quadrants, plus the active list

use glam::{IVec2, Vec2};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use super::chunk::{Chunk, ChunkContext};
use crate::error::LevelError;
use crate::levels::PopulateReport;

/// Quadrant of chunk space; `(0, 0)` belongs to `BottomRight`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    /// x >= 0, y >= 0
    BottomRight,
    /// x < 0, y >= 0
    BottomLeft,
    /// x >= 0, y < 0
    TopRight,
    /// x < 0, y < 0
    TopLeft,
}

impl Quadrant {
    /// Quadrant and unsigned column/row of a chunk coordinate
    pub fn split(coord: IVec2) -> (Quadrant, u32, u32) {
        let quadrant = match (coord.x >= 0, coord.y >= 0) {
            (true, true) => Quadrant::BottomRight,
            (false, true) => Quadrant::BottomLeft,
            (true, false) => Quadrant::TopRight,
            (false, false) => Quadrant::TopLeft,
        };
        (quadrant, coord.x.unsigned_abs(), coord.y.unsigned_abs())
    }

    fn index(self) -> usize {
        match self {
            Quadrant::BottomRight => 0,
            Quadrant::BottomLeft => 1,
            Quadrant::TopRight => 2,
            Quadrant::TopLeft => 3,
        }
    }
}

/// Chunks of one quadrant keyed by unsigned column and row
#[derive(Debug, Default)]
struct QuadrantGrid {
    cells: HashMap<(u32, u32), Chunk>,
}

impl QuadrantGrid {
    fn get(&self, col: u32, row: u32) -> Option<&Chunk> {
        self.cells.get(&(col, row))
    }

    fn get_mut(&mut self, col: u32, row: u32) -> Option<&mut Chunk> {
        self.cells.get_mut(&(col, row))
    }

    fn entry(&mut self, col: u32, row: u32) -> Entry<'_, (u32, u32), Chunk> {
        self.cells.entry((col, row))
    }

    fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.cells.values()
    }
}

/// What `ensure_loaded` did for one coordinate
///
/// `generated` is reported even when the load that followed failed.
#[derive(Debug, Default)]
pub(crate) struct EnsureOutcome {
    pub generated: bool,
    pub loaded: bool,
    pub populated: Option<PopulateReport>,
    /// Load error; the chunk was rolled back and stays unloaded
    pub failure: Option<LevelError>,
}

/// Every chunk ever generated, keyed by signed chunk coordinate
#[derive(Debug, Default)]
pub struct ChunkGrid {
    quadrants: [QuadrantGrid; 4],
    /// Loaded chunk coordinates in load order
    active: Vec<IVec2>,
    count: usize,
}

impl ChunkGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, coord: IVec2) -> Option<&Chunk> {
        let (quadrant, col, row) = Quadrant::split(coord);
        self.quadrants[quadrant.index()].get(col, row)
    }

    pub fn contains(&self, coord: IVec2) -> bool {
        self.get(coord).is_some()
    }

    /// Number of chunk records, loaded or not
    pub fn chunk_count(&self) -> usize {
        self.count
    }

    /// Currently loaded chunk coordinates
    pub fn active(&self) -> &[IVec2] {
        &self.active
    }

    pub fn is_active(&self, coord: IVec2) -> bool {
        self.active.contains(&coord)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.quadrants.iter().flat_map(QuadrantGrid::iter)
    }

    fn get_mut(&mut self, coord: IVec2) -> Option<&mut Chunk> {
        let (quadrant, col, row) = Quadrant::split(coord);
        self.quadrants[quadrant.index()].get_mut(col, row)
    }

    /// Generate the chunk on a miss, then load it if it is not loaded
    pub(crate) fn ensure_loaded(
        &mut self,
        coord: IVec2,
        ctx: &mut ChunkContext<'_, '_>,
    ) -> EnsureOutcome {
        let mut outcome = EnsureOutcome::default();

        let (quadrant, col, row) = Quadrant::split(coord);
        let chunk = match self.quadrants[quadrant.index()].entry(col, row) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let hosts_structure = coord == IVec2::ZERO && ctx.structure.is_some();
                log::debug!("Generated chunk ({}, {})", coord.x, coord.y);
                ctx.stats.record_generated();
                self.count += 1;
                outcome.generated = true;
                entry.insert(Chunk::generate(
                    coord,
                    ctx.chunk_size,
                    ctx.tile_size,
                    hosts_structure,
                ))
            }
        };

        if chunk.is_loaded() {
            return outcome;
        }

        match chunk.load(ctx) {
            Ok(populated) => {
                outcome.populated = populated;
                outcome.loaded = true;
                self.active.push(coord);
            }
            Err(e) => outcome.failure = Some(e),
        }
        outcome
    }

    /// Unload a loaded chunk and drop it from the active list
    pub(crate) fn unload(&mut self, coord: IVec2, ctx: &mut ChunkContext<'_, '_>) -> bool {
        let unloaded = self
            .get_mut(coord)
            .is_some_and(|chunk| chunk.unload(ctx));
        if unloaded {
            self.active.retain(|active| *active != coord);
        }
        unloaded
    }
}

/// Chunk containing a world position, rounding half away from zero
pub fn chunk_coord_for(position: Vec2, chunk_span: f32) -> IVec2 {
    let scaled = position / chunk_span;
    IVec2::new(scaled.x.round() as i32, scaled.y.round() as i32)
}
