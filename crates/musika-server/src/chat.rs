use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::ChatMessage;

const ROOM_CAPACITY: usize = 64;

/// In-process fan-out for chat rooms, one room per business. Messages are
/// persisted before being published, so the hub carries no durable state.
#[derive(Clone, Default)]
pub struct ChatHub {
    rooms: Arc<Mutex<HashMap<Uuid, broadcast::Sender<ChatMessage>>>>,
}

impl ChatHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, business_id: Uuid) -> broadcast::Receiver<ChatMessage> {
        let mut rooms = self.rooms.lock().expect("chat hub lock poisoned");
        rooms
            .entry(business_id)
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe()
    }

    pub fn publish(&self, message: &ChatMessage) {
        let mut rooms = self.rooms.lock().expect("chat hub lock poisoned");
        if let Some(sender) = rooms.get(&message.business_id) {
            if sender.send(message.clone()).is_err() {
                // Last subscriber left; drop the room.
                rooms.remove(&message.business_id);
            }
        }
    }
}
