use super::bot;
use super::broadcast::{BroadcastSink, RoomEvent};
use super::constants::{COMPANION_ID, COMPANION_NAME, CREATOR_START, MAX_CHAT_MESSAGE_LENGTH};
use super::errors::RoomError;
use super::room::{Room, RoomState};
use super::types::{ChatMessage, Direction, Position, RoomId, User, UserId};
use super::user_index::UserIndex;
use crate::app::config::EngineConfig;
use crate::app::room_name::derive_room_id;
use crate::shared::names::sanitize_display_name;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;

/// Owns every live room. Shared by handle (`Arc<RoomRegistry>`).
pub struct RoomRegistry {
    rooms: DashMap<RoomId, Arc<Room>>,
    sink: Arc<dyn BroadcastSink>,
    config: EngineConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedRoom {
    pub room_id: RoomId,
    pub users: Vec<User>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveOutcome {
    pub remaining: usize,
    pub room_deleted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub rooms: usize,
    pub users: usize,
}

impl RoomRegistry {
    pub fn new(config: EngineConfig, sink: Arc<dyn BroadcastSink>) -> Arc<Self> {
        Arc::new(Self {
            rooms: DashMap::new(),
            sink,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn sink(&self) -> &dyn BroadcastSink {
        self.sink.as_ref()
    }

    pub fn get(&self, room_id: &RoomId) -> Result<Arc<Room>, RoomError> {
        self.rooms
            .get(room_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))
    }

    /// Applies `apply` to the room state under the room lock.
    pub async fn update<R>(
        &self,
        room_id: &RoomId,
        apply: impl FnOnce(&mut RoomState) -> Result<R, RoomError>,
    ) -> Result<R, RoomError> {
        let room = self.get(room_id)?;
        let mut state = room.lock_open().await?;
        apply(&mut state)
    }

    pub async fn is_full(&self, room_id: &RoomId) -> Result<bool, RoomError> {
        self.update(room_id, |state| Ok(state.users.is_full())).await
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub async fn stats(&self) -> RegistryStats {
        let rooms: Vec<Arc<Room>> = self
            .rooms
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        let mut users = 0;
        for room in &rooms {
            users += room.lock().await.users.len();
        }
        RegistryStats {
            rooms: rooms.len(),
            users,
        }
    }

    /// Registers a new room seeded with its creator and companion, then starts
    /// the companion task.
    pub fn create(
        self: &Arc<Self>,
        name: &str,
        creator_id: UserId,
        creator_name: &str,
    ) -> Result<Arc<Room>, RoomError> {
        self.create_with_nonces(name, creator_id, creator_name, || rand::thread_rng().gen())
    }

    pub(crate) fn create_with_nonces(
        self: &Arc<Self>,
        name: &str,
        creator_id: UserId,
        creator_name: &str,
        mut next_nonce: impl FnMut() -> u64,
    ) -> Result<Arc<Room>, RoomError> {
        if creator_id.as_str() == COMPANION_ID {
            return Err(RoomError::UserAlreadyInRoom(creator_id));
        }
        let attempts = self.config.max_room_id_attempts;
        for attempt in 1..=attempts {
            let room_id = derive_room_id(name, next_nonce());
            let room = match self.rooms.entry(room_id.clone()) {
                Entry::Occupied(_) => {
                    tracing::debug!(%room_id, attempt, "room id collision");
                    continue;
                }
                Entry::Vacant(entry) => {
                    let users = self.seed_users(&room_id, creator_id.clone(), creator_name)?;
                    let room = Arc::new(Room::new(room_id.clone(), users));
                    entry.insert(Arc::clone(&room));
                    room
                }
            };
            let handle = bot::spawn_companion(Arc::downgrade(self), Arc::clone(&room));
            room.attach_bot(handle);
            tracing::info!(%room_id, creator = %creator_id, "room created");
            return Ok(room);
        }
        tracing::warn!(room_name = name, attempts, "room id generation exhausted");
        Err(RoomError::RoomIdGenerationExhausted { attempts })
    }

    fn seed_users(
        &self,
        room_id: &RoomId,
        creator_id: UserId,
        creator_name: &str,
    ) -> Result<UserIndex, RoomError> {
        let mut users = UserIndex::new(room_id.clone(), self.config.room_limit);
        let (row, col) = CREATOR_START;
        users.join(User {
            user_id: creator_id,
            display_name: sanitize_display_name(creator_name, "Player"),
            room_id: room_id.clone(),
            position: Position::new(row, col),
            direction: Direction::default(),
        })?;
        let companion_cell = users
            .random_free_cell(self.config.grid_size, &mut rand::thread_rng())
            .ok_or(RoomError::NoFreeCell)?;
        users.join(User {
            user_id: UserId::new(COMPANION_ID),
            display_name: COMPANION_NAME.to_string(),
            room_id: room_id.clone(),
            position: companion_cell,
            direction: Direction::default(),
        })?;
        Ok(users)
    }

    /// Removes the room and raises its stop signal. Only the first call for a
    /// room has any effect.
    pub async fn delete(&self, room_id: &RoomId) -> Result<(), RoomError> {
        let room = self.get(room_id)?;
        let mut state = room.lock().await;
        self.retire(&room, &mut state);
        Ok(())
    }

    /// Must be called with the room lock held.
    pub(crate) fn retire(&self, room: &Arc<Room>, state: &mut RoomState) {
        if state.closed {
            return;
        }
        state.closed = true;
        state.moving.clear();
        self.rooms
            .remove_if(room.id(), |_, current| Arc::ptr_eq(current, room));
        room.raise_stop();
        self.sink.publish(room.id(), RoomEvent::Closed);
        self.sink.close(room.id());
        tracing::info!(room_id = %room.id(), "room deleted");
    }

    /// Deletes every room and waits for the companion tasks to finish.
    pub async fn shutdown(&self) {
        let rooms: Vec<Arc<Room>> = self
            .rooms
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for room in rooms {
            {
                let mut state = room.lock().await;
                self.retire(&room, &mut state);
            }
            if let Some(handle) = room.take_bot() {
                if let Err(error) = handle.await {
                    tracing::warn!(?error, room_id = %room.id(), "companion task failed");
                }
            }
        }
    }

    pub async fn create_room(
        self: &Arc<Self>,
        creator_id: UserId,
        creator_name: &str,
        room_name: &str,
    ) -> Result<CreatedRoom, RoomError> {
        let room = self.create(room_name, creator_id, creator_name)?;
        let state = room.lock_open().await?;
        let users = state.users.users().to_vec();
        self.sink
            .publish(room.id(), RoomEvent::Scene(state.scene(room.id())));
        Ok(CreatedRoom {
            room_id: room.id().clone(),
            users,
        })
    }

    pub async fn join_room(
        &self,
        user_id: UserId,
        room_id: &RoomId,
        display_name: &str,
    ) -> Result<Vec<User>, RoomError> {
        let room = self.get(room_id)?;
        let mut state = room.lock_open().await?;
        if state.users.is_full() {
            tracing::debug!(%room_id, %user_id, "join rejected, room full");
            return Err(RoomError::RoomFull(room_id.clone()));
        }
        if state.users.lookup(&user_id).is_some() {
            return Err(RoomError::UserAlreadyInRoom(user_id));
        }
        let position = state
            .users
            .random_free_cell(self.config.grid_size, &mut rand::thread_rng())
            .ok_or(RoomError::NoFreeCell)?;
        state.users.join(User {
            user_id: user_id.clone(),
            display_name: sanitize_display_name(display_name, "Player"),
            room_id: room_id.clone(),
            position,
            direction: Direction::default(),
        })?;
        tracing::info!(%room_id, %user_id, %position, users = state.users.len(), "user joined");

        self.sink
            .publish(room_id, RoomEvent::Scene(state.scene(room_id)));
        Ok(state.users.users().to_vec())
    }

    /// Removes a user. When no human is left the companion goes too and the
    /// room is deleted.
    pub async fn leave_room(
        &self,
        user_id: &UserId,
        room_id: &RoomId,
    ) -> Result<LeaveOutcome, RoomError> {
        let room = self.get(room_id)?;
        let mut state = room.lock_open().await?;
        if user_id.as_str() == COMPANION_ID {
            return Err(RoomError::UserNotFound {
                room_id: room_id.clone(),
                user_id: user_id.clone(),
            });
        }
        let removal = match state.users.remove(user_id) {
            Ok(removal) => removal,
            Err(error) => {
                tracing::debug!(%room_id, %user_id, "leave ignored, user not in room");
                return Err(error);
            }
        };
        state.moving.remove(user_id);
        tracing::info!(%room_id, %user_id, remaining = removal.remaining, "user left");

        let mut remaining = removal.remaining;
        if state.human_count() == 0 {
            let companion = UserId::new(COMPANION_ID);
            if let Ok(removal) = state.users.remove(&companion) {
                remaining = removal.remaining;
            }
        }

        if remaining == 0 {
            self.retire(&room, &mut state);
            return Ok(LeaveOutcome {
                remaining,
                room_deleted: true,
            });
        }

        self.sink
            .publish(room_id, RoomEvent::Scene(state.scene(room_id)));
        Ok(LeaveOutcome {
            remaining,
            room_deleted: false,
        })
    }

    pub async fn send_message(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        text: &str,
    ) -> Result<ChatMessage, RoomError> {
        let msg = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if msg.is_empty() {
            return Err(RoomError::InvalidMessage("message is empty"));
        }
        if msg.chars().count() > MAX_CHAT_MESSAGE_LENGTH {
            return Err(RoomError::InvalidMessage("message is too long"));
        }

        let room = self.get(room_id)?;
        let state = room.lock_open().await?;
        let Some(sender) = state.users.get(user_id) else {
            return Err(RoomError::UserNotFound {
                room_id: room_id.clone(),
                user_id: user_id.clone(),
            });
        };
        let message = ChatMessage {
            room_id: room_id.clone(),
            from: user_id.clone(),
            display_name: sender.display_name.clone(),
            msg,
        };
        self.sink
            .publish(room_id, RoomEvent::Chat(message.clone()));
        Ok(message)
    }
}
