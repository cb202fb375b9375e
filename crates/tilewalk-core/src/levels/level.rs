//! Shared level interface

use glam::Vec2;

use super::spawn::SpawnHooks;
use crate::animation::AnimatedTileScheduler;
use crate::world::render::{CollisionWorld, TileRenderer};

/// External services a level drives during a tick
pub struct LevelServices<'a> {
    pub renderer: &'a mut dyn TileRenderer,
    pub physics: &'a mut dyn CollisionWorld,
    pub hooks: &'a mut dyn SpawnHooks,
}

impl<'a> LevelServices<'a> {
    pub fn new(
        renderer: &'a mut dyn TileRenderer,
        physics: &'a mut dyn CollisionWorld,
        hooks: &'a mut dyn SpawnHooks,
    ) -> Self {
        Self {
            renderer,
            physics,
            hooks,
        }
    }
}

/// A playable level, polled once per simulation tick
pub trait Level {
    /// Where the player starts; the origin until a spawn object is placed
    fn spawn_point(&self) -> Vec2;

    /// Advance the level by one tick
    fn update(&mut self, observer: Vec2, delta_ms: f32, services: &mut LevelServices<'_>);

    fn animated_tiles(&self) -> &AnimatedTileScheduler;

    /// Dispose every visual and body the level created
    fn shutdown(&mut self, services: &mut LevelServices<'_>);
}
