use super::bot::BotState;
use super::constants::COMPANION_ID;
use super::errors::RoomError;
use super::stop::{StopListener, StopSignal};
use super::types::{RoomId, SceneSnapshot, User, UserId, UserSnapshot};
use super::user_index::UserIndex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex as StdMutex;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;

#[derive(Debug)]
pub struct Room {
  id: RoomId,
  state: Mutex<RoomState>,
  stop: StopSignal,
  bot_running: AtomicBool,
  bot_task: StdMutex<Option<JoinHandle<()>>>,
}

/// Everything guarded by the room lock.
#[derive(Debug)]
pub struct RoomState {
  pub(crate) users: UserIndex,
  /// Users with a walk in flight, keyed to the ticket of that walk.
  pub(crate) moving: HashMap<UserId, u64>,
  pub(crate) closed: bool,
  next_ticket: u64,
}

impl Room {
  pub(crate) fn new(id: RoomId, users: UserIndex) -> Self {
    Self {
      id,
      state: Mutex::new(RoomState {
        users,
        moving: HashMap::new(),
        closed: false,
        next_ticket: 0,
      }),
      stop: StopSignal::new(),
      bot_running: AtomicBool::new(true),
      bot_task: StdMutex::new(None),
    }
  }

  pub fn id(&self) -> &RoomId {
    &self.id
  }

  pub(crate) async fn lock(&self) -> MutexGuard<'_, RoomState> {
    self.state.lock().await
  }

  /// Locks the room, failing if it has already been deleted.
  pub(crate) async fn lock_open(&self) -> Result<MutexGuard<'_, RoomState>, RoomError> {
    let state = self.state.lock().await;
    if state.closed {
      return Err(RoomError::RoomNotFound(self.id.clone()));
    }
    Ok(state)
  }

  pub async fn users(&self) -> Vec<User> {
    self.state.lock().await.users.users().to_vec()
  }

  pub async fn scene(&self) -> SceneSnapshot {
    self.state.lock().await.scene(&self.id)
  }

  pub fn stop_listener(&self) -> StopListener {
    self.stop.listener()
  }

  pub fn is_stopped(&self) -> bool {
    self.stop.is_raised()
  }

  pub(crate) fn raise_stop(&self) -> bool {
    self.stop.raise()
  }

  pub fn bot_state(&self) -> BotState {
    if self.stop.is_raised() || !self.bot_running.load(Ordering::SeqCst) {
      BotState::Stopped
    } else {
      BotState::Running
    }
  }

  pub(crate) fn mark_bot_stopped(&self) {
    self.bot_running.store(false, Ordering::SeqCst);
  }

  pub(crate) fn attach_bot(&self, handle: JoinHandle<()>) {
    if let Ok(mut slot) = self.bot_task.lock() {
      *slot = Some(handle);
    }
  }

  pub(crate) fn take_bot(&self) -> Option<JoinHandle<()>> {
    self.bot_task.lock().ok().and_then(|mut slot| slot.take())
  }
}

impl RoomState {
  pub fn users(&self) -> &UserIndex {
    &self.users
  }

  pub fn is_moving(&self, user_id: &UserId) -> bool {
    self.moving.contains_key(user_id)
  }

  /// Marks `user_id` as moving and returns the ticket that owns the walk.
  pub(crate) fn begin_move(&mut self, user_id: &UserId) -> u64 {
    self.next_ticket += 1;
    self.moving.insert(user_id.clone(), self.next_ticket);
    self.next_ticket
  }

  pub(crate) fn owns_move(&self, user_id: &UserId, ticket: u64) -> bool {
    self.moving.get(user_id) == Some(&ticket)
  }

  /// Clears the moving mark only if it still belongs to `ticket`.
  pub(crate) fn finish_move(&mut self, user_id: &UserId, ticket: u64) {
    if self.owns_move(user_id, ticket) {
      self.moving.remove(user_id);
    }
  }

  pub fn scene(&self, room_id: &RoomId) -> SceneSnapshot {
    SceneSnapshot {
      room_id: room_id.clone(),
      users: self.users.users().iter().map(UserSnapshot::from).collect(),
    }
  }

  pub fn human_count(&self) -> usize {
    self.users
      .users()
      .iter()
      .filter(|user| user.user_id.as_str() != COMPANION_ID)
      .count()
  }
}
