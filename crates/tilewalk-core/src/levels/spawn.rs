//! Object layer dispatch to the gameplay spawners

use glam::Vec2;

use crate::tilemap::MapObject;
use crate::world::stats::StreamingStats;

/// Entity creation, implemented by the gameplay systems
pub trait SpawnHooks {
    fn set_spawn_point(&mut self, position: Vec2) -> anyhow::Result<()>;
    fn spawn_enemy(&mut self, id: &str, position: Vec2) -> anyhow::Result<()>;
    fn spawn_teleporter(&mut self, id: &str, position: Vec2) -> anyhow::Result<()>;
    fn spawn_lootable(&mut self, id: &str, position: Vec2) -> anyhow::Result<()>;
}

/// Object types the levels know how to place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Spawn,
    Enemy,
    Teleporter,
    Lootable,
}

impl ObjectKind {
    pub fn from_type(kind: &str) -> Option<Self> {
        match kind {
            "spawn" => Some(ObjectKind::Spawn),
            "enemy" => Some(ObjectKind::Enemy),
            "teleporter" => Some(ObjectKind::Teleporter),
            "lootable" => Some(ObjectKind::Lootable),
            _ => None,
        }
    }
}

/// Maps authored object coordinates into world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectPlacement {
    pub origin: Vec2,
    pub scale: Vec2,
}

impl ObjectPlacement {
    pub const IDENTITY: ObjectPlacement = ObjectPlacement {
        origin: Vec2::ZERO,
        scale: Vec2::ONE,
    };

    pub fn to_world(&self, position: Vec2) -> Vec2 {
        self.origin + position * self.scale
    }
}

/// An object whose spawner returned an error
#[derive(Debug, Clone)]
pub struct SpawnFailure {
    pub object_id: u32,
    pub kind: ObjectKind,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct PopulateReport {
    pub spawned: usize,
    pub ignored: usize,
    pub failures: Vec<SpawnFailure>,
    /// Last spawn point placed successfully
    pub spawn_point: Option<Vec2>,
}

/// Hand every object to its spawner
///
/// A failing object is logged and skipped so the rest still get placed.
pub fn populate_objects(
    objects: &[MapObject],
    placement: ObjectPlacement,
    hooks: &mut dyn SpawnHooks,
    stats: &mut dyn StreamingStats,
) -> PopulateReport {
    let mut report = PopulateReport::default();

    for object in objects {
        let Some(kind) = ObjectKind::from_type(&object.kind) else {
            log::debug!(
                "Ignoring object {} '{}' with type '{}'",
                object.id,
                object.name,
                object.kind
            );
            report.ignored += 1;
            continue;
        };

        let position = placement.to_world(object.position);
        let result = match kind {
            ObjectKind::Spawn => hooks.set_spawn_point(position),
            ObjectKind::Enemy => hooks.spawn_enemy(&object.name, position),
            ObjectKind::Teleporter => hooks.spawn_teleporter(&object.name, position),
            ObjectKind::Lootable => hooks.spawn_lootable(&object.name, position),
        };

        match result {
            Ok(()) => {
                report.spawned += 1;
                if kind == ObjectKind::Spawn {
                    report.spawn_point = Some(position);
                }
            }
            Err(e) => {
                log::warn!(
                    "Failed to place {:?} object {} '{}' at ({:.1}, {:.1}): {:#}",
                    kind,
                    object.id,
                    object.name,
                    position.x,
                    position.y,
                    e
                );
                stats.record_spawn_failure();
                report.failures.push(SpawnFailure {
                    object_id: object.id,
                    kind,
                    message: format!("{:#}", e),
                });
            }
        }
    }

    report
}
