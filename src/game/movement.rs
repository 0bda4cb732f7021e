//! Paced, step-by-step movement along a planned route.
//!
//! A user can have one move in flight at a time; a second request is rejected
//! with `UserBusy` until the walk ends. Every applied step is committed under
//! the room lock and followed by a scene broadcast.

use super::broadcast::RoomEvent;
use super::errors::RoomError;
use super::path::find_path;
use super::registry::RoomRegistry;
use super::room::{Room, RoomState};
use super::types::{Direction, Position, RoomId, UserId};
use std::collections::VecDeque;
use std::sync::Arc;

/// A validated route. The user stays marked as moving until the plan is walked.
#[derive(Debug)]
pub struct PlannedMove {
    room: Arc<Room>,
    user_id: UserId,
    ticket: u64,
    start: Position,
    destination: Position,
    path: Vec<Position>,
}

impl PlannedMove {
    pub fn path(&self) -> &[Position] {
        &self.path
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveReport {
    pub steps: usize,
    pub reached: bool,
}

impl RoomRegistry {
    /// Plans and walks a move, returning once the walk has ended.
    pub async fn move_user(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        destination: Position,
    ) -> Result<MoveReport, RoomError> {
        let planned = self.plan_move(room_id, user_id, destination).await?;
        Ok(self.walk(planned).await)
    }

    /// Plans a move and walks it on a background task. The route is returned
    /// as soon as it is accepted.
    pub async fn start_move(
        self: &Arc<Self>,
        room_id: &RoomId,
        user_id: &UserId,
        destination: Position,
    ) -> Result<Vec<Position>, RoomError> {
        let planned = self.plan_move(room_id, user_id, destination).await?;
        let path = planned.path.clone();
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            registry.walk(planned).await;
        });
        Ok(path)
    }

    pub async fn plan_move(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        destination: Position,
    ) -> Result<PlannedMove, RoomError> {
        let room = self.get(room_id).inspect_err(|_| {
            tracing::debug!(%room_id, %user_id, "move ignored, room not found");
        })?;
        let mut state = room.lock_open().await?;
        self.plan_locked(&room, &mut state, user_id, destination)
    }

    pub(crate) fn plan_locked(
        &self,
        room: &Arc<Room>,
        state: &mut RoomState,
        user_id: &UserId,
        destination: Position,
    ) -> Result<PlannedMove, RoomError> {
        let Some(user) = state.users.get(user_id) else {
            tracing::debug!(room_id = %room.id(), %user_id, "move ignored, user not in room");
            return Err(RoomError::UserNotFound {
                room_id: room.id().clone(),
                user_id: user_id.clone(),
            });
        };
        if state.is_moving(user_id) {
            return Err(RoomError::UserBusy(user_id.clone()));
        }

        let from = user.position;
        let path = find_path(
            from,
            destination,
            self.config().grid_size,
            state.users.occupied(),
        );
        if path.is_empty() {
            tracing::debug!(room_id = %room.id(), %user_id, %from, to = %destination, "no route");
            return Err(RoomError::PathUnreachable {
                from,
                to: destination,
            });
        }

        let ticket = state.begin_move(user_id);
        Ok(PlannedMove {
            room: Arc::clone(room),
            user_id: user_id.clone(),
            ticket,
            start: from,
            destination,
            path,
        })
    }

    pub async fn walk(&self, planned: PlannedMove) -> MoveReport {
        let report = self.walk_path(&planned).await;
        let PlannedMove {
            room,
            user_id,
            ticket,
            ..
        } = planned;
        room.lock().await.finish_move(&user_id, ticket);
        tracing::debug!(
            room_id = %room.id(),
            %user_id,
            steps = report.steps,
            reached = report.reached,
            "move finished"
        );
        report
    }

    async fn walk_path(&self, planned: &PlannedMove) -> MoveReport {
        let PlannedMove {
            room,
            user_id,
            ticket,
            destination,
            ..
        } = planned;
        let destination = *destination;
        let grid_size = self.config().grid_size;
        let step_interval = self.config().step_interval;
        let mut remaining: VecDeque<Position> = planned.path.iter().copied().collect();
        let mut expected = planned.start;
        let mut replanned = false;
        let mut steps = 0;
        let stopped = |steps| MoveReport {
            steps,
            reached: false,
        };

        while let Some(planned_next) = remaining.pop_front() {
            if steps > 0 {
                tokio::time::sleep(step_interval).await;
            }

            let mut state = room.lock().await;
            if state.closed {
                return stopped(steps);
            }
            let Some(current) = state.users.get(user_id).map(|user| user.position) else {
                tracing::debug!(room_id = %room.id(), %user_id, "user left mid-move");
                return stopped(steps);
            };
            // A leave and rejoin hands the user a new walk and a new cell.
            if !state.owns_move(user_id, *ticket) || current != expected {
                tracing::debug!(room_id = %room.id(), %user_id, "move superseded");
                return stopped(steps);
            }

            let next = if state.users.occupied().contains(&planned_next) {
                // Someone stepped into the route after it was planned.
                if replanned {
                    return stopped(steps);
                }
                replanned = true;
                remaining = find_path(current, destination, grid_size, state.users.occupied()).into();
                match remaining.pop_front() {
                    Some(next) => next,
                    None => return stopped(steps),
                }
            } else {
                planned_next
            };

            let direction = Direction::between(current, next).unwrap_or_default();
            if let Err(error) = state.users.relocate(user_id, next, direction) {
                tracing::warn!(?error, room_id = %room.id(), %user_id, "step rejected");
                return stopped(steps);
            }
            steps += 1;
            expected = next;

            let scene = state.scene(room.id());
            self.sink().publish(room.id(), RoomEvent::Scene(scene));
        }

        MoveReport {
            steps,
            reached: true,
        }
    }
}
