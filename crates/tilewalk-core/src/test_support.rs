//! Recording collaborators shared by the unit tests

use anyhow::bail;
use glam::Vec2;
use std::collections::HashMap;

use crate::levels::SpawnHooks;
use crate::tilemap::{Structure, TiledMap};
use crate::world::{BodyHandle, CollisionWorld, TextureKey, TileHandle, TileRenderer};

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    next: u64,
    pub live: HashMap<TileHandle, (Vec2, TextureKey)>,
    pub created: usize,
    pub destroyed: usize,
    pub frame_changes: Vec<(TileHandle, u32)>,
    /// Fail every create once this many tiles have been created
    pub fail_after: Option<usize>,
}

impl RecordingRenderer {
    pub fn textures_at(&self, positions: &[Vec2]) -> Vec<TextureKey> {
        positions
            .iter()
            .map(|pos| {
                self.live
                    .values()
                    .find(|(p, _)| p == pos)
                    .map(|(_, texture)| texture.clone())
                    .unwrap_or_else(|| panic!("no tile at {:?}", pos))
            })
            .collect()
    }
}

impl TileRenderer for RecordingRenderer {
    fn create_tile(&mut self, position: Vec2, texture: &TextureKey) -> anyhow::Result<TileHandle> {
        if self.fail_after.is_some_and(|limit| self.created >= limit) {
            bail!("texture atlas exhausted");
        }
        self.next += 1;
        self.created += 1;
        let handle = TileHandle(self.next);
        self.live.insert(handle, (position, texture.clone()));
        Ok(handle)
    }

    fn set_tile_frame(&mut self, handle: TileHandle, gid: u32) {
        self.frame_changes.push((handle, gid));
        if let Some(entry) = self.live.get_mut(&handle) {
            entry.1 = TextureKey::Gid(gid);
        }
    }

    fn destroy_tile(&mut self, handle: TileHandle) {
        assert!(self.live.remove(&handle).is_some(), "double destroy of {:?}", handle);
        self.destroyed += 1;
    }
}

#[derive(Debug, Default)]
pub struct RecordingPhysics {
    next: u64,
    pub live: HashMap<BodyHandle, (Vec2, Vec2)>,
}

impl CollisionWorld for RecordingPhysics {
    fn add_static_rect(&mut self, min: Vec2, size: Vec2) -> BodyHandle {
        self.next += 1;
        let handle = BodyHandle(self.next);
        self.live.insert(handle, (min, size));
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) {
        assert!(self.live.remove(&handle).is_some(), "double remove of {:?}", handle);
    }
}

#[derive(Debug, Default)]
pub struct RecordingHooks {
    pub spawn_points: Vec<Vec2>,
    pub enemies: Vec<(String, Vec2)>,
    pub teleporters: Vec<(String, Vec2)>,
    pub lootables: Vec<(String, Vec2)>,
    pub fail_enemies: bool,
}

impl SpawnHooks for RecordingHooks {
    fn set_spawn_point(&mut self, position: Vec2) -> anyhow::Result<()> {
        self.spawn_points.push(position);
        Ok(())
    }

    fn spawn_enemy(&mut self, id: &str, position: Vec2) -> anyhow::Result<()> {
        if self.fail_enemies {
            bail!("unknown enemy '{}'", id);
        }
        self.enemies.push((id.to_string(), position));
        Ok(())
    }

    fn spawn_teleporter(&mut self, id: &str, position: Vec2) -> anyhow::Result<()> {
        self.teleporters.push((id.to_string(), position));
        Ok(())
    }

    fn spawn_lootable(&mut self, id: &str, position: Vec2) -> anyhow::Result<()> {
        self.lootables.push((id.to_string(), position));
        Ok(())
    }
}

/// 2x2 camp at 16px tiles: an animated campfire, one wall tile, a spawn
/// point and an enemy
pub const CAMP_JSON: &str = r#"{
    "width": 2, "height": 2, "tilewidth": 16, "tileheight": 16,
    "layers": [
        { "type": "tilelayer", "name": "floor", "width": 2, "height": 2, "data": [11, 0, 0, 12] },
        {
            "type": "tilelayer", "name": "walls", "width": 2, "height": 2, "data": [0, 13, 0, 0],
            "properties": [{ "name": "collides", "type": "bool", "value": true }]
        },
        {
            "type": "objectgroup", "name": "objects",
            "objects": [
                { "id": 1, "name": "start", "type": "spawn", "x": 16, "y": 16 },
                { "id": 2, "name": "slime", "type": "enemy", "x": 8, "y": 0 }
            ]
        }
    ],
    "tilesets": [
        {
            "firstgid": 10, "name": "camp",
            "tiles": [
                { "id": 1, "animation": [
                    { "tileid": 1, "duration": 100 },
                    { "tileid": 4, "duration": 100 }
                ] }
            ]
        }
    ]
}"#;

pub fn camp_structure() -> Structure {
    let map = TiledMap::from_json_str(CAMP_JSON).unwrap();
    Structure::from_tiled("camp", &map).unwrap()
}
