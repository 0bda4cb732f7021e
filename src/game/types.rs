use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cell on the square room grid, zero-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn in_bounds(self, grid_size: i32) -> bool {
        (0..grid_size).contains(&self.row) && (0..grid_size).contains(&self.col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Direction {
    /// Facing for a single step, from the sign of the row delta first and the
    /// column delta otherwise. `None` when both cells are the same.
    pub fn between(from: Position, to: Position) -> Option<Self> {
        let d_row = to.row - from.row;
        let d_col = to.col - from.col;
        if d_row < 0 {
            Some(Direction::Up)
        } else if d_row > 0 {
            Some(Direction::Down)
        } else if d_col < 0 {
            Some(Direction::Left)
        } else if d_col > 0 {
            Some(Direction::Right)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: UserId,
    pub display_name: String,
    pub room_id: RoomId,
    pub position: Position,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSnapshot {
    pub user_id: UserId,
    pub display_name: String,
    pub position: Position,
    pub direction: Direction,
}

impl From<&User> for UserSnapshot {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id.clone(),
            display_name: user.display_name.clone(),
            position: user.position,
            direction: user.direction,
        }
    }
}

/// Full ordered user list of a room, sent on every visible change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneSnapshot {
    pub room_id: RoomId,
    pub users: Vec<UserSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub room_id: RoomId,
    pub from: UserId,
    pub display_name: String,
    pub msg: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_follows_step_delta() {
        let origin = Position::new(3, 3);
        assert_eq!(Direction::between(origin, Position::new(2, 3)), Some(Direction::Up));
        assert_eq!(Direction::between(origin, Position::new(4, 3)), Some(Direction::Down));
        assert_eq!(Direction::between(origin, Position::new(3, 2)), Some(Direction::Left));
        assert_eq!(Direction::between(origin, Position::new(3, 4)), Some(Direction::Right));
        assert_eq!(Direction::between(origin, origin), None);
    }

    #[test]
    fn scene_snapshot_serializes_with_camel_case_fields() {
        let snapshot = SceneSnapshot {
            room_id: RoomId::new("lobby-abc"),
            users: vec![UserSnapshot {
                user_id: UserId::new("u1"),
                display_name: "Ada".to_string(),
                position: Position::new(1, 2),
                direction: Direction::Left,
            }],
        };
        let value = serde_json::to_value(&snapshot).expect("snapshot should serialize");
        assert_eq!(value["roomId"], "lobby-abc");
        assert_eq!(value["users"][0]["userId"], "u1");
        assert_eq!(value["users"][0]["displayName"], "Ada");
        assert_eq!(value["users"][0]["position"]["row"], 1);
        assert_eq!(value["users"][0]["position"]["col"], 2);
        assert_eq!(value["users"][0]["direction"], "left");
    }
}
