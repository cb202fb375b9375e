//! Levels - the infinite streamed world and authored tile maps

mod events;
mod infinite;
mod level;
mod spawn;
mod tilemap_level;

pub use events::{LevelEvent, LevelEvents};
pub use infinite::{InfiniteLevel, ReconcileReport};
pub use level::{Level, LevelServices};
pub use spawn::{
    ObjectKind, ObjectPlacement, PopulateReport, SpawnFailure, SpawnHooks, populate_objects,
};
pub use tilemap_level::{TilemapLevel, TilemapState};
