use super::types::{Position, RoomId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    #[error("user {user_id} not found in room {room_id}")]
    UserNotFound { room_id: RoomId, user_id: UserId },

    #[error("room {0} is full")]
    RoomFull(RoomId),

    #[error("user {0} is already in the room")]
    UserAlreadyInRoom(UserId),

    #[error("no route from ({from}) to ({to})")]
    PathUnreachable { from: Position, to: Position },

    #[error("user {0} already has a move in progress")]
    UserBusy(UserId),

    #[error("no free cell left on the grid")]
    NoFreeCell,

    #[error("could not generate a unique room id after {attempts} attempts")]
    RoomIdGenerationExhausted { attempts: usize },

    #[error("invalid chat message: {0}")]
    InvalidMessage(&'static str),
}
