//! Procedural ground texture selection

use fastnoise_lite::{FastNoiseLite, NoiseType};
use rand_xoshiro::Xoshiro256StarStar;

use super::render::TextureKey;
use super::rng_trait::{WorldRng, seeded_rng};
use crate::config::CatalogConfig;

/// Maps a world tile coordinate to the texture drawn there
pub trait TileCatalog {
    fn texture_for(&mut self, tile_x: i32, tile_y: i32) -> TextureKey;
}

/// Uniform random pick, independent of position
pub struct RandomPickCatalog {
    textures: Vec<TextureKey>,
    rng: Xoshiro256StarStar,
}

impl RandomPickCatalog {
    pub fn new(textures: &[String], seed: Option<u64>) -> Self {
        Self {
            textures: textures.iter().map(|t| TextureKey::named(t)).collect(),
            rng: seeded_rng(seed),
        }
    }
}

impl TileCatalog for RandomPickCatalog {
    fn texture_for(&mut self, _tile_x: i32, _tile_y: i32) -> TextureKey {
        let index = self.rng.gen_index(self.textures.len());
        self.textures[index].clone()
    }
}

/// Weighted random pick over cumulative weights
pub struct WeightedCatalog {
    textures: Vec<TextureKey>,
    cumulative: Vec<f32>,
    rng: Xoshiro256StarStar,
}

impl WeightedCatalog {
    pub fn new(entries: &[(String, f32)], seed: Option<u64>) -> Self {
        let mut total = 0.0;
        let mut cumulative = Vec::with_capacity(entries.len());
        for (_, weight) in entries {
            total += weight;
            cumulative.push(total);
        }

        Self {
            textures: entries.iter().map(|(t, _)| TextureKey::named(t)).collect(),
            cumulative,
            rng: seeded_rng(seed),
        }
    }

    fn pick(&self, roll: f32) -> usize {
        let total = self.cumulative.last().copied().unwrap_or(0.0);
        let target = roll * total;
        self.cumulative
            .iter()
            .position(|&c| target < c)
            .unwrap_or(self.cumulative.len().saturating_sub(1))
    }
}

impl TileCatalog for WeightedCatalog {
    fn texture_for(&mut self, _tile_x: i32, _tile_y: i32) -> TextureKey {
        let roll = self.rng.gen_f32();
        self.textures[self.pick(roll)].clone()
    }
}

/// Coherent noise bucketed into the texture list
///
/// Deterministic for a given seed, so reloads reproduce the same ground even
/// when the chunk does not remember its textures.
pub struct NoiseCatalog {
    textures: Vec<TextureKey>,
    noise: FastNoiseLite,
}

impl NoiseCatalog {
    pub fn new(textures: &[String], frequency: f32, seed: u64) -> Self {
        let mut noise = FastNoiseLite::with_seed(seed as i32);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(frequency));

        Self {
            textures: textures.iter().map(|t| TextureKey::named(t)).collect(),
            noise,
        }
    }
}

impl TileCatalog for NoiseCatalog {
    fn texture_for(&mut self, tile_x: i32, tile_y: i32) -> TextureKey {
        // get_noise_2d is in [-1, 1]
        let value = self.noise.get_noise_2d(tile_x as f32, tile_y as f32);
        let normalized = ((value + 1.0) * 0.5).clamp(0.0, 1.0);
        let index = ((normalized * self.textures.len() as f32) as usize).min(self.textures.len() - 1);
        self.textures[index].clone()
    }
}

/// Build the catalog described by a validated config
pub fn build_catalog(config: &CatalogConfig, seed: Option<u64>) -> Box<dyn TileCatalog> {
    match config {
        CatalogConfig::RandomPick { textures } => Box::new(RandomPickCatalog::new(textures, seed)),
        CatalogConfig::Weighted { entries } => Box::new(WeightedCatalog::new(entries, seed)),
        CatalogConfig::Noise {
            textures,
            frequency,
        } => Box::new(NoiseCatalog::new(textures, *frequency, seed.unwrap_or_default())),
    }
}
