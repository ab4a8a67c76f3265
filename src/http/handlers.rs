//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the engine or
//! the user store for the actual work.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use ulid::Ulid;

use super::dto::{
    HealthResponse, LoginRequest, LoginResponse, MessageResponse, ReservationCreatedResponse,
    RoomRequest, RoomResponse, UserCreatedResponse,
};
use super::error::AppError;
use super::extract::{request_token, AuthUser};
use super::state::AppState;
use crate::auth::AuthError;
use crate::engine::EngineError;
use crate::model::{ReservationInfo, ReservationRequest, RoomInfo};
use crate::observability;
use crate::users::{RegisterRequest, UserInfo};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

type Created<T> = Result<(StatusCode, Json<T>), AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        rooms: state.engine.room_count(),
        reservations: state.engine.reservation_count(),
    })
}

/// Fallback for routes that do not exist.
pub async fn unknown_endpoint() -> AppError {
    AppError::NotFound("unknown endpoint".into())
}

// =============================================================================
// Reservations
// =============================================================================

/// POST /api/reservations
pub async fn create_reservation(
    State(state): State<AppState>,
    payload: Result<Json<ReservationRequest>, JsonRejection>,
) -> Created<ReservationCreatedResponse> {
    let Json(request) = payload?;
    let reservation = state.engine.create_reservation(&request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ReservationCreatedResponse {
            message: "Reservation created successfully.".into(),
            reservation: ReservationInfo::from(&reservation),
        }),
    ))
}

/// DELETE /api/reservations/{id}
pub async fn cancel_reservation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<MessageResponse> {
    let id = Ulid::from_string(&id).map_err(|_| AppError::NotFound("Reservation not found.".into()))?;
    state.engine.cancel_reservation(id).await?;
    Ok(Json(MessageResponse::new("Reservation cancelled successfully.")))
}

/// GET /api/reservations/{roomId}
///
/// Unknown rooms yield an empty list.
pub async fn list_reservations(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> HandlerResult<Vec<ReservationInfo>> {
    let reservations = state.engine.list_reservations(&room_id).await;
    Ok(Json(reservations.iter().map(ReservationInfo::from).collect()))
}

// =============================================================================
// Rooms
// =============================================================================

/// GET /api/rooms
pub async fn list_rooms(State(state): State<AppState>) -> HandlerResult<Vec<RoomInfo>> {
    Ok(Json(state.engine.list_rooms().await))
}

/// POST /api/rooms
pub async fn create_room(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<RoomRequest>, JsonRejection>,
) -> Created<RoomResponse> {
    let Json(request) = payload?;
    let name = request.name.unwrap_or_default();
    let room = state.engine.create_room(&name).await?;
    tracing::debug!(user = %user.user_name, room_id = %room.id, "room created via api");
    Ok((
        StatusCode::CREATED,
        Json(RoomResponse {
            message: "Room created successfully.".into(),
            room,
        }),
    ))
}

/// PUT /api/rooms/{id}
pub async fn update_room(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<RoomRequest>, JsonRejection>,
) -> HandlerResult<RoomResponse> {
    let Json(request) = payload?;
    let id = parse_room_id(&id)?;
    let name = request.name.unwrap_or_default();
    let room = state.engine.rename_room(id, &name).await?;
    Ok(Json(RoomResponse {
        message: "Room updated successfully.".into(),
        room,
    }))
}

/// DELETE /api/rooms/{id}
pub async fn delete_room(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
) -> HandlerResult<MessageResponse> {
    let id = parse_room_id(&id)?;
    state.engine.delete_room(id).await?;
    Ok(Json(MessageResponse::new("Room deleted successfully.")))
}

fn parse_room_id(raw: &str) -> Result<Ulid, AppError> {
    Ulid::from_string(raw).map_err(|_| EngineError::RoomNotFound(raw.to_string()).into())
}

// =============================================================================
// Users and login
// =============================================================================

/// GET /api/users
pub async fn list_users(State(state): State<AppState>) -> HandlerResult<Vec<UserInfo>> {
    Ok(Json(state.users.list()))
}

/// POST /api/users
///
/// The first user may register anonymously; after that a token is required.
pub async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Created<UserCreatedResponse> {
    let Json(request) = payload?;
    let user = match request_token(&headers) {
        Some(token) => {
            state.authenticate(token)?;
            state.users.register(&request)?
        }
        None => state.users.register_first(&request)?,
    };
    Ok((
        StatusCode::CREATED,
        Json(UserCreatedResponse {
            message: "User created successfully.".into(),
            user,
        }),
    ))
}

/// DELETE /api/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
) -> HandlerResult<MessageResponse> {
    let id = Ulid::from_string(&id).map_err(|_| AppError::NotFound("User not found.".into()))?;
    state.users.delete(id)?;
    Ok(Json(MessageResponse::new("User deleted successfully.")))
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> HandlerResult<LoginResponse> {
    let Json(request) = payload?;
    let user = match (request.username.as_deref(), request.password.as_deref()) {
        (Some(username), Some(password)) => state.users.verify_credentials(username, password),
        _ => None,
    };
    let Some(user) = user else {
        metrics::counter!(observability::LOGINS_TOTAL, "outcome" => "rejected").increment(1);
        return Err(AuthError::InvalidCredentials.into());
    };

    let token = state.auth.issue(&user)?;
    metrics::counter!(observability::LOGINS_TOTAL, "outcome" => "accepted").increment(1);
    tracing::info!(user_id = %user.id, "login");
    Ok(Json(LoginResponse {
        token,
        username: user.user_name,
        name: user.name,
    }))
}

// =============================================================================
// Testing resets (mounted only in testing mode)
// =============================================================================

/// POST /api/testing/resetAll
pub async fn reset_all(State(state): State<AppState>) -> StatusCode {
    state.engine.reset_rooms().await;
    state.users.reset();
    StatusCode::NO_CONTENT
}

/// POST /api/testing/resetReservations
pub async fn reset_reservations(State(state): State<AppState>) -> StatusCode {
    state.engine.reset_reservations().await;
    StatusCode::NO_CONTENT
}

/// POST /api/testing/resetRooms
pub async fn reset_rooms(State(state): State<AppState>) -> StatusCode {
    state.engine.reset_rooms().await;
    StatusCode::NO_CONTENT
}

/// POST /api/testing/resetUsers
pub async fn reset_users(State(state): State<AppState>) -> StatusCode {
    state.users.reset();
    StatusCode::NO_CONTENT
}
