use super::constants::COMPANION_ID;
use super::registry::RoomRegistry;
use super::room::Room;
use super::types::UserId;
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotState {
    Running,
    Stopped,
}

/// Starts the companion loop for `room`. Each iteration waits for whichever
/// comes first, the next tick or the room's stop signal; after a stop the loop
/// never ticks again.
pub(crate) fn spawn_companion(registry: Weak<RoomRegistry>, room: Arc<Room>) -> JoinHandle<()> {
    let Some(period) = registry.upgrade().map(|registry| registry.config().bot_interval) else {
        room.mark_bot_stopped();
        return tokio::spawn(async {});
    };
    let mut stop = room.stop_listener();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = stop.stopped() => break,
                _ = ticker.tick() => {
                    let Some(registry) = registry.upgrade() else { break };
                    registry.wander_companion(&room).await;
                }
            }
        }
        room.mark_bot_stopped();
        tracing::debug!(room_id = %room.id(), "companion stopped");
    })
}

impl RoomRegistry {
    /// Sends the companion to a random free cell and waits for the walk.
    pub(crate) async fn wander_companion(&self, room: &Arc<Room>) {
        let companion = UserId::new(COMPANION_ID);
        let planned = {
            let Ok(mut state) = room.lock_open().await else { return };
            let Some(target) = state
                .users
                .random_free_cell(self.config().grid_size, &mut rand::thread_rng())
            else {
                tracing::debug!(room_id = %room.id(), "companion has nowhere to go");
                return;
            };
            match self.plan_locked(room, &mut state, &companion, target) {
                Ok(planned) => planned,
                Err(error) => {
                    tracing::debug!(%error, room_id = %room.id(), "companion move skipped");
                    return;
                }
            }
        };
        tracing::debug!(room_id = %room.id(), steps = planned.path().len(), "companion wandering");
        self.walk(planned).await;
    }
}
