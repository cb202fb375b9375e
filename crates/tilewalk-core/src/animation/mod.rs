//! Tile animation - per-tileset frame tables and the per-instance scheduler

mod scheduler;
mod table;

pub use scheduler::{AnimatedTileEntry, AnimatedTileScheduler, AnimationOwner};
pub use table::{AnimationDef, AnimationFrame, ChunkAnimationTable, RANDOM_START_PROPERTY};
