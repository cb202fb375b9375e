//! Tilewalk core - infinite chunk streaming, tile animation and level logic
//!
//! Rendering, physics and entity creation live outside this crate and are
//! reached through the collaborator traits in [`world::render`] and
//! [`levels::SpawnHooks`].

pub mod animation;
pub mod config;
pub mod error;
pub mod levels;
pub mod scene;
pub mod settings;
pub mod tilemap;
pub mod world;

#[cfg(test)]
mod test_support;

pub use config::{CatalogConfig, Neighborhood, TexturePolicy, WorldConfig};
pub use error::{ConfigError, LevelError, StructureError};
