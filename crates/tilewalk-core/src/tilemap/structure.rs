//! Authored structures stamped into generated chunks

use glam::Vec2;
use std::collections::HashMap;
use std::path::PathBuf;

use super::tiled::{GID_MASK, TiledMap, TiledObject};
use crate::animation::ChunkAnimationTable;
use crate::error::StructureError;

/// Object placed from an authored object layer
#[derive(Debug, Clone, PartialEq)]
pub struct MapObject {
    pub id: u32,
    pub name: String,
    /// `spawn`, `enemy`, `teleporter`, `lootable`, or anything else (ignored)
    pub kind: String,
    /// Position in the authoring tile map's pixel space
    pub position: Vec2,
}

impl From<&TiledObject> for MapObject {
    fn from(object: &TiledObject) -> Self {
        Self {
            id: object.id,
            name: object.name.clone(),
            kind: object.object_type().to_string(),
            position: Vec2::new(object.x, object.y),
        }
    }
}

/// One tile layer of a structure, row-major, `0` = empty
#[derive(Debug, Clone)]
pub struct StructureLayer {
    pub name: String,
    /// Row length in tiles; may differ from the map width
    pub width: u32,
    pub tiles: Vec<u32>,
    pub collides: bool,
}

impl StructureLayer {
    /// Non-empty tiles as `(local_x, local_y, gid)`
    pub fn placed_tiles(&self) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
        let width = self.width.max(1);
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, gid)| **gid != 0)
            .map(move |(i, gid)| (i as u32 % width, i as u32 / width, *gid))
    }
}

/// Small hand-built tile region with its own object layer
#[derive(Debug, Clone)]
pub struct Structure {
    pub key: String,
    /// Size in tiles
    pub width: u32,
    pub height: u32,
    /// Authoring tile size in pixels, used to scale object positions
    pub tile_width: u32,
    pub tile_height: u32,
    pub layers: Vec<StructureLayer>,
    pub objects: Vec<MapObject>,
    pub animations: ChunkAnimationTable,
}

impl Structure {
    pub fn from_tiled(key: &str, map: &TiledMap) -> Result<Self, StructureError> {
        map.validate()?;

        let layers = map
            .tile_layers()
            .map(|layer| StructureLayer {
                name: layer.name.clone(),
                width: layer.width,
                tiles: layer.data.iter().map(|gid| gid & GID_MASK).collect(),
                collides: layer.collides(),
            })
            .collect();

        Ok(Self {
            key: key.to_string(),
            width: map.width,
            height: map.height,
            tile_width: map.tilewidth.max(1),
            tile_height: map.tileheight.max(1),
            layers,
            objects: map.objects().map(MapObject::from).collect(),
            animations: ChunkAnimationTable::from_tilesets(&map.tilesets),
        })
    }
}

/// Supplies authored structures by key
pub trait StructureLoader {
    fn load(&self, key: &str) -> Result<Structure, StructureError>;
}

/// Loads `<key>.json` Tiled maps from a directory
pub struct TiledStructureLoader {
    root: PathBuf,
}

impl TiledStructureLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl StructureLoader for TiledStructureLoader {
    fn load(&self, key: &str) -> Result<Structure, StructureError> {
        let path = self.root.join(format!("{}.json", key));
        if !path.is_file() {
            return Err(StructureError::NotFound(key.to_string()));
        }
        let map = TiledMap::from_path(&path)?;
        let structure = Structure::from_tiled(key, &map)?;
        log::info!(
            "Loaded structure '{}' ({}x{} tiles, {} objects) from {}",
            key,
            structure.width,
            structure.height,
            structure.objects.len(),
            path.display()
        );
        Ok(structure)
    }
}

/// In-memory structures, for embedded assets and tests
#[derive(Default)]
pub struct StaticStructureLoader {
    structures: HashMap<String, Structure>,
}

impl StaticStructureLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, structure: Structure) -> Self {
        self.structures.insert(structure.key.clone(), structure);
        self
    }
}

impl StructureLoader for StaticStructureLoader {
    fn load(&self, key: &str) -> Result<Structure, StructureError> {
        self.structures
            .get(key)
            .cloned()
            .ok_or_else(|| StructureError::NotFound(key.to_string()))
    }
}
