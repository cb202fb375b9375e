//! Authored tile maps and structures (Tiled JSON)

mod structure;
mod tiled;

pub use structure::{
    MapObject, StaticStructureLoader, Structure, StructureLayer, StructureLoader,
    TiledStructureLoader,
};
pub use tiled::{
    GID_MASK, TiledFrame, TiledLayer, TiledMap, TiledObject, TiledProperty, TiledTile,
    TiledTileset, TileLayerData, ObjectGroupData, COLLIDES_PROPERTY, property_bool,
};
