//! World management - chunks, the chunk grid and tile selection

mod chunk;
mod chunk_grid;
pub mod render;
pub mod rng_trait;
pub mod stats;
pub mod tile_catalog;

pub(crate) use chunk::ChunkContext;
pub use chunk::Chunk;
pub use chunk_grid::{ChunkGrid, Quadrant, chunk_coord_for};
pub use render::{BodyHandle, CollisionWorld, TextureKey, TileHandle, TileRenderer};
pub use rng_trait::{WorldRng, seeded_rng};
pub use stats::{NoopStats, StreamingCounters, StreamingStats};
pub use tile_catalog::{
    NoiseCatalog, RandomPickCatalog, TileCatalog, WeightedCatalog, build_catalog,
};
