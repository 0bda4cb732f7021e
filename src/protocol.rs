//! JSON bodies exchanged with clients. Room events pushed to subscribers are
//! encoded by `game::broadcast::RoomEvent::to_envelope`.

use crate::game::registry::RegistryStats;
use crate::game::types::{Position, User, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user_id: UserId,
    pub display_name: String,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub room_name: String,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub row: i32,
    pub col: i32,
}

impl MoveRequest {
    pub fn destination(&self) -> Position {
        Position::new(self.row, self.col)
    }
}

#[derive(Debug, Serialize)]
pub struct MoveResponse {
    pub path: Vec<Position>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub msg: String,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

#[derive(Debug, Deserialize)]
pub struct SubscribeQuery {
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub stats: RegistryStats,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_accept_camel_case() {
        let create: CreateRoomRequest =
            serde_json::from_str(r#"{"roomName":"Lobby"}"#).expect("valid body");
        assert_eq!(create.room_name, "Lobby");
        let movement: MoveRequest = serde_json::from_str(r#"{"row":3,"col":4}"#).expect("valid body");
        assert_eq!(movement.destination(), Position::new(3, 4));
    }

    #[test]
    fn health_flattens_stats() {
        let body = HealthResponse {
            ok: true,
            stats: RegistryStats { rooms: 2, users: 5 },
        };
        let value = serde_json::to_value(&body).expect("serializable");
        assert_eq!(value["rooms"], 2);
        assert_eq!(value["users"], 5);
    }
}
