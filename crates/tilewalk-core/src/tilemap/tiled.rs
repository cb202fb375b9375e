//! Serde model of the Tiled JSON subset the game authors maps in
//!
//! Only uncompressed CSV-style layer data is supported (`"data": [..]`).

use serde::Deserialize;
use std::path::Path;

use crate::error::StructureError;

/// Tile layer property marking a layer as static collision
pub const COLLIDES_PROPERTY: &str = "collides";

/// Strips Tiled's flip/rotation flags from a gid
pub const GID_MASK: u32 = 0x1FFF_FFFF;

#[derive(Debug, Clone, Deserialize)]
pub struct TiledMap {
    pub width: u32,
    pub height: u32,
    pub tilewidth: u32,
    pub tileheight: u32,
    #[serde(default)]
    pub layers: Vec<TiledLayer>,
    #[serde(default)]
    pub tilesets: Vec<TiledTileset>,
}

impl TiledMap {
    pub fn from_json_str(json: &str) -> Result<Self, StructureError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, StructureError> {
        let json = std::fs::read_to_string(path).map_err(|source| StructureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn tile_layers(&self) -> impl Iterator<Item = &TileLayerData> {
        self.layers.iter().filter_map(|layer| match layer {
            TiledLayer::TileLayer(data) => Some(data),
            _ => None,
        })
    }

    pub fn objects(&self) -> impl Iterator<Item = &TiledObject> {
        self.layers
            .iter()
            .filter_map(|layer| match layer {
                TiledLayer::ObjectGroup(group) => Some(group.objects.iter()),
                _ => None,
            })
            .flatten()
    }

    /// Check every tile layer holds `width * height` entries
    pub fn validate(&self) -> Result<(), StructureError> {
        for layer in self.tile_layers() {
            let expected = (layer.width * layer.height) as usize;
            if layer.data.len() != expected {
                return Err(StructureError::LayerSize {
                    layer: layer.name.clone(),
                    expected,
                    actual: layer.data.len(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum TiledLayer {
    #[serde(rename = "tilelayer")]
    TileLayer(TileLayerData),
    #[serde(rename = "objectgroup")]
    ObjectGroup(ObjectGroupData),
    /// Image and group layers carry nothing the levels use
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TileLayerData {
    #[serde(default)]
    pub name: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub data: Vec<u32>,
    #[serde(default)]
    pub properties: Vec<TiledProperty>,
}

impl TileLayerData {
    pub fn collides(&self) -> bool {
        property_bool(&self.properties, COLLIDES_PROPERTY)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectGroupData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub objects: Vec<TiledObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TiledObject {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub properties: Vec<TiledProperty>,
}

impl TiledObject {
    /// Object type, falling back to a custom `type` property
    pub fn object_type(&self) -> &str {
        if !self.kind.is_empty() {
            return &self.kind;
        }
        self.properties
            .iter()
            .find(|p| p.name == "type")
            .and_then(|p| p.value.as_str())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TiledProperty {
    pub name: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Read a boolean custom property; absent or non-bool is `false`
pub fn property_bool(properties: &[TiledProperty], name: &str) -> bool {
    properties
        .iter()
        .find(|p| p.name == name)
        .and_then(|p| p.value.as_bool())
        .unwrap_or(false)
}

#[derive(Debug, Clone, Deserialize)]
pub struct TiledTileset {
    pub firstgid: u32,
    #[serde(default)]
    pub name: String,
    /// Set for external tilesets, which are not resolved
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub tiles: Vec<TiledTile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TiledTile {
    pub id: u32,
    #[serde(default)]
    pub animation: Vec<TiledFrame>,
    #[serde(default)]
    pub properties: Vec<TiledProperty>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TiledFrame {
    pub tileid: u32,
    pub duration: u32,
}
