pub const GRID_SIZE: i32 = 10;
pub const ROOM_LIMIT: usize = 10;
pub const STEP_INTERVAL_MS: u64 = 180;
pub const BOT_INTERVAL_MS: u64 = 15_000;
pub const MAX_ROOM_ID_ATTEMPTS: usize = 16;
pub const MAX_CHAT_MESSAGE_LENGTH: usize = 60;

pub const COMPANION_ID: &str = "ghosty";
pub const COMPANION_NAME: &str = "ghosty";

pub const CREATOR_START: (i32, i32) = (0, 0);

pub const EVENT_UPDATE_SCENE: &str = "updateScene";
pub const EVENT_CHAT_MESSAGE: &str = "chatMessage";
pub const EVENT_ROOM_CLOSED: &str = "roomClosed";
