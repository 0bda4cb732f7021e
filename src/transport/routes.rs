use super::auth::{Authenticator, Profile};
use super::error::ApiError;
use super::hub::SubscriberHub;
use super::ws_session::handle_socket;
use crate::game::registry::{CreatedRoom, LeaveOutcome, RoomRegistry};
use crate::game::types::{ChatMessage, RoomId, SceneSnapshot};
use crate::protocol::{
    ChatRequest, CreateRoomRequest, HealthResponse, MoveRequest, MoveResponse, SessionRequest,
    SessionResponse, SubscribeQuery, UsersResponse,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::http::{HeaderMap, Method};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

pub struct AppState {
    pub registry: Arc<RoomRegistry>,
    pub hub: Arc<SubscriberHub>,
    pub auth: Authenticator,
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/session", post(create_session))
        .route("/api/rooms", post(create_room))
        .route("/api/rooms/:room", get(room_scene))
        .route("/api/rooms/:room/join", post(join_room))
        .route("/api/rooms/:room/leave", post(leave_room))
        .route("/api/rooms/:room/move", post(move_user))
        .route("/api/rooms/:room/chat", post(send_chat))
        .route("/api/rooms/:room/ws", get(subscribe))
        .layer(cors)
        .with_state(state)
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

fn caller(state: &AppState, headers: &HeaderMap) -> Result<Profile, ApiError> {
    state.auth.authenticate_headers(headers)
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        ok: true,
        stats: state.registry.stats().await,
    })
}

async fn create_session(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SessionRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let request = body(payload)?;
    let (profile, token) = state.auth.register(request.name.as_deref())?;
    Ok(Json(SessionResponse {
        user_id: profile.user_id,
        display_name: profile.display_name,
        token,
    }))
}

async fn create_room(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<CreateRoomRequest>, JsonRejection>,
) -> Result<Json<CreatedRoom>, ApiError> {
    let profile = caller(&state, &headers)?;
    let request = body(payload)?;
    let created = state
        .registry
        .create_room(profile.user_id, &profile.display_name, &request.room_name)
        .await?;
    Ok(Json(created))
}

async fn room_scene(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
    headers: HeaderMap,
) -> Result<Json<SceneSnapshot>, ApiError> {
    caller(&state, &headers)?;
    let room = state.registry.get(&RoomId::new(room))?;
    Ok(Json(room.scene().await))
}

async fn join_room(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
    headers: HeaderMap,
) -> Result<Json<UsersResponse>, ApiError> {
    let profile = caller(&state, &headers)?;
    let users = state
        .registry
        .join_room(profile.user_id, &RoomId::new(room), &profile.display_name)
        .await?;
    Ok(Json(UsersResponse { users }))
}

async fn leave_room(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
    headers: HeaderMap,
) -> Result<Json<LeaveOutcome>, ApiError> {
    let profile = caller(&state, &headers)?;
    let outcome = state
        .registry
        .leave_room(&profile.user_id, &RoomId::new(room))
        .await?;
    Ok(Json(outcome))
}

async fn move_user(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<MoveRequest>, JsonRejection>,
) -> Result<Json<MoveResponse>, ApiError> {
    let profile = caller(&state, &headers)?;
    let request = body(payload)?;
    let path = state
        .registry
        .start_move(&RoomId::new(room), &profile.user_id, request.destination())
        .await?;
    Ok(Json(MoveResponse { path }))
}

async fn send_chat(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatMessage>, ApiError> {
    let profile = caller(&state, &headers)?;
    let request = body(payload)?;
    let message = state
        .registry
        .send_message(&RoomId::new(room), &profile.user_id, &request.msg)
        .await?;
    Ok(Json(message))
}

async fn subscribe(
    ws: WebSocketUpgrade,
    Path(room): Path<String>,
    Query(query): Query<SubscribeQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let token = query.token.ok_or(ApiError::Unauthorized)?;
    state.auth.authenticate(&token)?;
    let room_id = RoomId::new(room);
    state.registry.get(&room_id)?;

    let hub = Arc::clone(&state.hub);
    let registry = Arc::clone(&state.registry);
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, hub, registry, room_id)))
}
