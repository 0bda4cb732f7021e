use super::constants::{EVENT_CHAT_MESSAGE, EVENT_ROOM_CLOSED, EVENT_UPDATE_SCENE};
use super::types::{ChatMessage, RoomId, SceneSnapshot};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    Scene(SceneSnapshot),
    Chat(ChatMessage),
    Closed,
}

impl RoomEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RoomEvent::Scene(_) => EVENT_UPDATE_SCENE,
            RoomEvent::Chat(_) => EVENT_CHAT_MESSAGE,
            RoomEvent::Closed => EVENT_ROOM_CLOSED,
        }
    }

    pub fn to_envelope(&self) -> Result<String, serde_json::Error> {
        #[derive(Serialize)]
        struct Envelope<'a, T: Serialize> {
            event: &'a str,
            data: T,
        }

        match self {
            RoomEvent::Scene(scene) => serde_json::to_string(&Envelope {
                event: self.name(),
                data: scene,
            }),
            RoomEvent::Chat(message) => serde_json::to_string(&Envelope {
                event: self.name(),
                data: message,
            }),
            RoomEvent::Closed => serde_json::to_string(&Envelope {
                event: self.name(),
                data: serde_json::Value::Null,
            }),
        }
    }
}

/// Fan-out target for room events.
///
/// Implementations must return without waiting on subscribers: the engine
/// publishes right after committing a state change and never retries.
pub trait BroadcastSink: Send + Sync {
    fn publish(&self, room_id: &RoomId, event: RoomEvent);

    /// Called once when a room is deleted.
    fn close(&self, _room_id: &RoomId) {}
}
