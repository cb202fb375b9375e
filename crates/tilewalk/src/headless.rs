//! Headless collaborators: counting renderer, physics and spawners
//!
//! These stand in for the game's GPU renderer and physics world so worlds
//! can be streamed from the command line and in tests.

use anyhow::bail;
use glam::Vec2;
use std::collections::HashMap;
use tilewalk_core::levels::{LevelServices, SpawnHooks};
use tilewalk_core::world::{BodyHandle, CollisionWorld, TextureKey, TileHandle, TileRenderer};

/// Tracks live tile visuals without drawing anything
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    next: u64,
    live: HashMap<TileHandle, TextureKey>,
    pub created: u64,
    pub destroyed: u64,
    pub frame_changes: u64,
}

impl HeadlessRenderer {
    pub fn live_tiles(&self) -> usize {
        self.live.len()
    }

    pub fn texture(&self, handle: TileHandle) -> Option<&TextureKey> {
        self.live.get(&handle)
    }
}

impl TileRenderer for HeadlessRenderer {
    fn create_tile(&mut self, _position: Vec2, texture: &TextureKey) -> anyhow::Result<TileHandle> {
        self.next += 1;
        let handle = TileHandle(self.next);
        self.live.insert(handle, texture.clone());
        self.created += 1;
        Ok(handle)
    }

    fn set_tile_frame(&mut self, handle: TileHandle, gid: u32) {
        match self.live.get_mut(&handle) {
            Some(texture) => {
                *texture = TextureKey::Gid(gid);
                self.frame_changes += 1;
            }
            None => log::warn!("Frame change for unknown tile {:?}", handle),
        }
    }

    fn destroy_tile(&mut self, handle: TileHandle) {
        if self.live.remove(&handle).is_none() {
            log::warn!("Destroying unknown tile {:?}", handle);
            return;
        }
        self.destroyed += 1;
    }
}

#[derive(Debug, Default)]
pub struct HeadlessPhysics {
    next: u64,
    bodies: HashMap<BodyHandle, (Vec2, Vec2)>,
}

impl HeadlessPhysics {
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Whether any static body covers `point`
    pub fn is_blocked(&self, point: Vec2) -> bool {
        self.bodies.values().any(|(min, size)| {
            let max = *min + *size;
            point.x >= min.x && point.y >= min.y && point.x < max.x && point.y < max.y
        })
    }
}

impl CollisionWorld for HeadlessPhysics {
    fn add_static_rect(&mut self, min: Vec2, size: Vec2) -> BodyHandle {
        self.next += 1;
        let handle = BodyHandle(self.next);
        self.bodies.insert(handle, (min, size));
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) {
        self.bodies.remove(&handle);
    }
}

/// Logs placements; enemy ids outside `known_enemies` are rejected
#[derive(Debug, Default)]
pub struct LoggingSpawnHooks {
    pub known_enemies: Option<Vec<String>>,
    pub spawn_point: Option<Vec2>,
    pub enemies: Vec<(String, Vec2)>,
    pub teleporters: Vec<(String, Vec2)>,
    pub lootables: Vec<(String, Vec2)>,
}

impl SpawnHooks for LoggingSpawnHooks {
    fn set_spawn_point(&mut self, position: Vec2) -> anyhow::Result<()> {
        log::info!("Spawn point at ({:.1}, {:.1})", position.x, position.y);
        self.spawn_point = Some(position);
        Ok(())
    }

    fn spawn_enemy(&mut self, id: &str, position: Vec2) -> anyhow::Result<()> {
        if let Some(known) = &self.known_enemies
            && !known.iter().any(|k| k == id)
        {
            bail!("no enemy archetype named '{}'", id);
        }
        log::info!("Enemy '{}' at ({:.1}, {:.1})", id, position.x, position.y);
        self.enemies.push((id.to_string(), position));
        Ok(())
    }

    fn spawn_teleporter(&mut self, id: &str, position: Vec2) -> anyhow::Result<()> {
        log::info!("Teleporter '{}' at ({:.1}, {:.1})", id, position.x, position.y);
        self.teleporters.push((id.to_string(), position));
        Ok(())
    }

    fn spawn_lootable(&mut self, id: &str, position: Vec2) -> anyhow::Result<()> {
        log::info!("Lootable '{}' at ({:.1}, {:.1})", id, position.x, position.y);
        self.lootables.push((id.to_string(), position));
        Ok(())
    }
}

/// The three headless collaborators bundled together
#[derive(Debug, Default)]
pub struct HeadlessWorld {
    pub renderer: HeadlessRenderer,
    pub physics: HeadlessPhysics,
    pub hooks: LoggingSpawnHooks,
}

impl HeadlessWorld {
    pub fn services(&mut self) -> LevelServices<'_> {
        LevelServices::new(&mut self.renderer, &mut self.physics, &mut self.hooks)
    }
}

/// Observer that walks at a fixed speed and turns clockwise on a schedule
#[derive(Debug, Clone)]
pub struct ObserverPath {
    position: Vec2,
    heading: Vec2,
    speed: f32,
    turn_every: u32,
    ticks: u32,
}

impl ObserverPath {
    pub fn new(start: Vec2, speed: f32, turn_every: u32) -> Self {
        Self {
            position: start,
            heading: Vec2::X,
            speed,
            turn_every,
            ticks: 0,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Advance one tick and return the new position
    pub fn step(&mut self, delta_ms: f32) -> Vec2 {
        self.position += self.heading * self.speed * delta_ms / 1000.0;
        self.ticks += 1;
        if self.turn_every > 0 && self.ticks % self.turn_every == 0 {
            // y grows downward, so (x, y) -> (-y, x) is clockwise on screen
            self.heading = Vec2::new(-self.heading.y, self.heading.x);
        }
        self.position
    }
}
