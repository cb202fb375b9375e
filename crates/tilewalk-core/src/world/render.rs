//! Seams to the rendering and physics collaborators
//!
//! The core never draws or simulates anything itself. Chunks and levels ask a
//! [`TileRenderer`] for tile visuals and a [`CollisionWorld`] for static
//! bodies, and hold on to the opaque handles they get back.

use glam::Vec2;
use std::fmt;
use std::sync::Arc;

/// Texture identifier handed to the renderer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TextureKey {
    /// Named texture chosen by a tile catalog
    Named(Arc<str>),
    /// Global tile id from an authored tileset
    Gid(u32),
}

impl TextureKey {
    pub fn named(name: &str) -> Self {
        TextureKey::Named(Arc::from(name))
    }
}

impl fmt::Display for TextureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureKey::Named(name) => write!(f, "{}", name),
            TextureKey::Gid(gid) => write!(f, "gid:{}", gid),
        }
    }
}

/// Live tile visual owned by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileHandle(pub u64);

/// Static collision body owned by the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub u64);

/// Creates, retextures and disposes tile visuals
pub trait TileRenderer {
    /// Create a tile visual with its top-left corner at `position`
    fn create_tile(&mut self, position: Vec2, texture: &TextureKey) -> anyhow::Result<TileHandle>;

    /// Swap an existing tile visual to another tileset frame
    fn set_tile_frame(&mut self, handle: TileHandle, gid: u32);

    /// Dispose a tile visual
    fn destroy_tile(&mut self, handle: TileHandle);
}

/// Static collision geometry
pub trait CollisionWorld {
    /// Add an axis-aligned static rectangle
    fn add_static_rect(&mut self, min: Vec2, size: Vec2) -> BodyHandle;

    fn remove_body(&mut self, handle: BodyHandle);
}
