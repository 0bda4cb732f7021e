pub mod bot;
pub mod broadcast;
pub mod constants;
pub mod errors;
pub mod movement;
pub mod path;
pub mod registry;
pub mod room;
pub mod stop;
pub mod types;
pub mod user_index;
