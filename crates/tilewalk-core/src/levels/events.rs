//! Level notifications delivered over explicit channels
//!
//! Subscribers hold a `Receiver`; dropping it unsubscribes, and the sender
//! side is pruned on the next emit.

use glam::{IVec2, Vec2};
use std::sync::mpsc::{Receiver, Sender, channel};

use super::spawn::ObjectKind;

#[derive(Debug, Clone, PartialEq)]
pub enum LevelEvent {
    ChunkGenerated(IVec2),
    ChunkLoaded(IVec2),
    ChunkUnloaded(IVec2),
    SpawnPointChanged(Vec2),
    ObjectSpawnFailed {
        object_id: u32,
        kind: ObjectKind,
        message: String,
    },
}

#[derive(Debug, Default)]
pub struct LevelEvents {
    subscribers: Vec<Sender<LevelEvent>>,
}

impl LevelEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<LevelEvent> {
        let (sender, receiver) = channel();
        self.subscribers.push(sender);
        receiver
    }

    pub fn emit(&mut self, event: LevelEvent) {
        if self.subscribers.is_empty() {
            return;
        }
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
