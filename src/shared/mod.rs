pub mod names;
pub mod session_token;
