use crate::game::broadcast::{BroadcastSink, RoomEvent};
use crate::game::types::RoomId;
use dashmap::DashMap;
use std::collections::HashMap;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

/// Per-room WebSocket subscribers. Implements the engine's broadcast sink.
#[derive(Debug, Default)]
pub struct SubscriberHub {
    rooms: DashMap<RoomId, HashMap<String, UnboundedSender<String>>>,
}

pub struct Subscription {
    pub session_id: String,
    pub receiver: UnboundedReceiver<String>,
}

impl SubscriberHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, room_id: &RoomId) -> Subscription {
        let session_id = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        self.rooms
            .entry(room_id.clone())
            .or_default()
            .insert(session_id.clone(), tx);
        Subscription {
            session_id,
            receiver: rx,
        }
    }

    pub fn unsubscribe(&self, room_id: &RoomId, session_id: &str) {
        if let Some(mut sessions) = self.rooms.get_mut(room_id) {
            sessions.remove(session_id);
        }
        self.rooms.remove_if(room_id, |_, sessions| sessions.is_empty());
    }

    pub fn subscriber_count(&self, room_id: &RoomId) -> usize {
        self.rooms.get(room_id).map(|sessions| sessions.len()).unwrap_or(0)
    }
}

impl BroadcastSink for SubscriberHub {
    fn publish(&self, room_id: &RoomId, event: RoomEvent) {
        let Some(mut sessions) = self.rooms.get_mut(room_id) else { return };
        let payload = match event.to_envelope() {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(?error, %room_id, event = event.name(), "failed to encode event");
                return;
            }
        };
        sessions.retain(|_, sender| sender.send(payload.clone()).is_ok());
    }

    fn close(&self, room_id: &RoomId) {
        if let Some((_, sessions)) = self.rooms.remove(room_id) {
            tracing::debug!(%room_id, subscribers = sessions.len(), "closing room subscribers");
        }
    }
}
