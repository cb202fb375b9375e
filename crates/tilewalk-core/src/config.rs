//! World streaming configuration

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which chunks around the observer's chunk stay loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Neighborhood {
    /// `[t-1, t+1)` on each axis: the observer's chunk plus the three chunks
    /// up and to the left of it (2x2 = 4 chunks)
    #[default]
    HalfOpen,
    /// `[t-1, t+1]` on each axis (3x3 = 9 chunks)
    Symmetric,
}

impl Neighborhood {
    /// Inclusive min and exclusive max offsets relative to the target chunk
    fn offsets(self) -> (i32, i32) {
        match self {
            Neighborhood::HalfOpen => (-1, 1),
            Neighborhood::Symmetric => (-1, 2),
        }
    }

    /// Number of chunks in the window (upper bound on loaded chunks)
    pub fn window_size(self) -> usize {
        let (min, max) = self.offsets();
        let edge = (max - min) as usize;
        edge * edge
    }

    /// Chunk coordinates in the window around `target`, column-major from the
    /// lowest x
    ///
    /// At the edge of the `i32` coordinate range the window is shifted inwards
    /// so it keeps its full size.
    pub fn window(self, target: IVec2) -> Vec<IVec2> {
        let (min, max) = self.offsets();
        let clamp = |t: i32| t.clamp(i32::MIN - min, i32::MAX - (max - 1));
        let (tx, ty) = (clamp(target.x), clamp(target.y));
        let mut coords = Vec::with_capacity(self.window_size());
        for x in (tx + min)..=(tx + (max - 1)) {
            for y in (ty + min)..=(ty + (max - 1)) {
                coords.push(IVec2::new(x, y));
            }
        }
        coords
    }
}

/// Whether a reloaded chunk asks the catalog again for its ground textures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TexturePolicy {
    /// Query the catalog on every load (random catalogs re-roll)
    #[default]
    Reroll,
    /// Remember the keys picked on first load and replay them on reload
    Persist,
}

/// Procedural rule that picks ground textures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CatalogConfig {
    /// Uniform pick among the textures
    RandomPick { textures: Vec<String> },
    /// Weighted pick; weights need not sum to one
    Weighted { entries: Vec<(String, f32)> },
    /// Coherent noise bucketed into the texture list
    Noise { textures: Vec<String>, frequency: f32 },
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig::RandomPick {
            textures: vec!["grass_a".to_string(), "grass_b".to_string()],
        }
    }
}

impl CatalogConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            CatalogConfig::RandomPick { textures } | CatalogConfig::Noise { textures, .. } => {
                if textures.is_empty() {
                    return Err(ConfigError::EmptyCatalog);
                }
            }
            CatalogConfig::Weighted { entries } => {
                if entries.is_empty() {
                    return Err(ConfigError::EmptyCatalog);
                }
                if let Some((texture, weight)) = entries
                    .iter()
                    .find(|(_, weight)| !weight.is_finite() || *weight < 0.0)
                {
                    return Err(ConfigError::InvalidWeight {
                        texture: texture.clone(),
                        weight: *weight,
                    });
                }
                if entries.iter().all(|(_, weight)| *weight == 0.0) {
                    return Err(ConfigError::EmptyCatalog);
                }
            }
        }
        Ok(())
    }
}

/// Infinite world settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Tiles per chunk edge
    pub chunk_size: u32,
    /// World units per tile edge
    pub tile_size: u32,
    pub neighborhood: Neighborhood,
    pub tile_textures: TexturePolicy,
    /// Structure key stamped into the origin chunk
    pub origin_structure: Option<String>,
    pub catalog: CatalogConfig,
    /// Seed for the catalog; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_size: 18,
            tile_size: 25,
            neighborhood: Neighborhood::default(),
            tile_textures: TexturePolicy::default(),
            origin_structure: None,
            catalog: CatalogConfig::default(),
            seed: None,
        }
    }
}

impl WorldConfig {
    /// Reject configurations the streaming code cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize(self.chunk_size));
        }
        if self.tile_size == 0 {
            return Err(ConfigError::InvalidTileSize(self.tile_size));
        }
        // Tiles per chunk and the chunk span are both u32 products
        let oversized = self.chunk_size.checked_mul(self.chunk_size).is_none()
            || self.chunk_size.checked_mul(self.tile_size).is_none();
        if oversized {
            return Err(ConfigError::ChunkTooLarge {
                chunk_size: self.chunk_size,
                tile_size: self.tile_size,
            });
        }
        self.catalog.validate()
    }

    /// World units covered by one chunk edge
    pub fn chunk_span(&self) -> f32 {
        self.chunk_size as f32 * self.tile_size as f32
    }
}
