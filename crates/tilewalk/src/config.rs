//! Runner configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults
//! 2. `tilewalk.ron` file (if exists)
//! 3. Environment variables prefixed with `TILEWALK_`
//!
//! Example environment variable: `TILEWALK_WORLD__CHUNK_SIZE=24`

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tilewalk_core::WorldConfig;

/// Default config file stem, looked up in the working directory
pub const CONFIG_FILE: &str = "tilewalk";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GameConfig {
    #[serde(default)]
    pub world: WorldConfig,

    #[serde(default)]
    pub walk: WalkConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub debug: DebugConfig,
}

/// Scripted observer movement for headless runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Simulation ticks to run
    pub ticks: u32,
    /// Milliseconds per tick
    pub tick_ms: f32,
    /// Observer speed in world units/sec
    pub speed: f32,
    /// Turn 90 degrees clockwise every N ticks (0 = walk straight)
    pub turn_every: u32,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            ticks: 600,
            tick_ms: 16.0,
            speed: 240.0,
            turn_every: 150,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding `<key>.json` structures
    pub structures_dir: String,
    /// Persisted user settings
    pub settings_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            structures_dir: "demos/structures".to_string(),
            settings_file: "tilewalk_settings.ron".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DebugConfig {
    /// Log every chunk event instead of a per-run summary
    pub verbose_logging: bool,
}

impl GameConfig {
    /// Load from `tilewalk.ron` in the working directory
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Load configuration with layered priority:
    /// 1. Compiled defaults (lowest priority)
    /// 2. RON file at `path` (if exists)
    /// 3. Environment variables prefixed with `TILEWALK_` (highest priority)
    pub fn load_from(path: &Path) -> Result<Self> {
        let name = path.to_string_lossy();
        let builder = Config::builder()
            // Layer 1: Compiled defaults
            .set_default("world.chunk_size", 18_i64)?
            .set_default("world.tile_size", 25_i64)?
            .set_default("world.neighborhood", "HalfOpen")?
            .set_default("world.tile_textures", "Reroll")?
            .set_default("walk.ticks", 600_i64)?
            .set_default("walk.tick_ms", 16.0)?
            .set_default("walk.speed", 240.0)?
            .set_default("walk.turn_every", 150_i64)?
            .set_default("paths.structures_dir", "demos/structures")?
            .set_default("paths.settings_file", "tilewalk_settings.ron")?
            .set_default("debug.verbose_logging", false)?
            // Layer 2: Config file (optional, won't error if missing)
            .add_source(File::with_name(&name).format(FileFormat::Ron).required(false))
            // Layer 3: Environment variables (TILEWALK_WORLD__CHUNK_SIZE, etc.)
            .add_source(
                Environment::with_prefix("TILEWALK")
                    .prefix_separator("_")
                    .separator("__"),
            );

        let config = builder.build().context("Failed to build configuration")?;

        let game: GameConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        game.world.validate().context("Invalid world configuration")?;
        Ok(game)
    }

    /// Pretty RON, suitable as a starting `tilewalk.ron`
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .context("Failed to serialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilewalk_core::{CatalogConfig, Neighborhood, TexturePolicy};

    #[test]
    fn test_default_config() {
        let config = GameConfig::default();
        assert_eq!(config.world.chunk_size, 18);
        assert_eq!(config.world.tile_size, 25);
        assert_eq!(config.walk.ticks, 600);
        assert_eq!(config.paths.structures_dir, "demos/structures");
        assert!(!config.debug.verbose_logging);
    }

    #[test]
    fn test_load_config_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = GameConfig::load_from(&dir.path().join("missing")).expect("Failed to load config");
        assert_eq!(config.world.chunk_size, 18);
        assert_eq!(config.world.neighborhood, Neighborhood::HalfOpen);
        assert_eq!(config.walk.tick_ms, 16.0);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tilewalk.ron");
        std::fs::write(
            &path,
            r#"(
                world: (
                    chunk_size: 12,
                    neighborhood: "Symmetric",
                    tile_textures: "Persist",
                    origin_structure: Some("origin_camp"),
                ),
                walk: ( ticks: 30 ),
            )"#,
        )
        .unwrap();

        let config = GameConfig::load_from(&dir.path().join("tilewalk")).unwrap();

        assert_eq!(config.world.chunk_size, 12);
        assert_eq!(config.world.tile_size, 25);
        assert_eq!(config.world.neighborhood, Neighborhood::Symmetric);
        assert_eq!(config.world.tile_textures, TexturePolicy::Persist);
        assert_eq!(config.world.origin_structure.as_deref(), Some("origin_camp"));
        assert_eq!(config.world.catalog, CatalogConfig::default());
        assert_eq!(config.walk.ticks, 30);
        assert_eq!(config.walk.turn_every, 150);
    }

    #[test]
    fn test_invalid_world_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.ron"), "(world: (tile_size: 0))").unwrap();
        assert!(GameConfig::load_from(&dir.path().join("bad")).is_err());

        std::fs::write(
            dir.path().join("huge.ron"),
            "(world: (chunk_size: 70000, tile_size: 70000))",
        )
        .unwrap();
        let err = GameConfig::load_from(&dir.path().join("huge")).unwrap_err();
        assert!(format!("{:#}", err).contains("overflows"));
    }

    #[test]
    fn test_ron_dump_parses_back() {
        let text = GameConfig::default().to_ron_string().unwrap();
        let parsed: GameConfig = ron::from_str(&text).unwrap();
        assert_eq!(parsed.world, WorldConfig::default());
    }
}
