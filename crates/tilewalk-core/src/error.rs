//! Error types for world configuration, structures and levels

use glam::IVec2;
use std::path::PathBuf;
use thiserror::Error;

/// Invalid startup configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("chunk size must be greater than zero (got {0})")]
    InvalidChunkSize(u32),
    #[error("tile size must be greater than zero (got {0})")]
    InvalidTileSize(u32),
    #[error("chunk of {chunk_size} tiles of {tile_size} units overflows the coordinate range")]
    ChunkTooLarge { chunk_size: u32, tile_size: u32 },
    #[error("tile catalog has no selectable textures")]
    EmptyCatalog,
    #[error("texture '{texture}' has invalid weight {weight}")]
    InvalidWeight { texture: String, weight: f32 },
}

/// Failure to obtain or interpret an authored structure or map
#[derive(Debug, Error)]
pub enum StructureError {
    #[error("structure '{0}' not found")]
    NotFound(String),
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse tile map")]
    Parse(#[from] serde_json::Error),
    #[error("tile layer '{layer}' has {actual} tiles, expected {expected}")]
    LayerSize {
        layer: String,
        expected: usize,
        actual: usize,
    },
}

/// Level lifecycle failures
#[derive(Debug, Error)]
pub enum LevelError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Structure(#[from] StructureError),
    #[error("cannot move tile map level from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
    #[error("chunk ({}, {}) failed to load", coord.x, coord.y)]
    ChunkLoad {
        coord: IVec2,
        #[source]
        source: anyhow::Error,
    },
    #[error("tile map layer '{layer}' failed to build")]
    Map {
        layer: String,
        #[source]
        source: anyhow::Error,
    },
}
