pub mod auth;
pub mod error;
pub mod hub;
pub mod routes;
pub mod ws_session;
