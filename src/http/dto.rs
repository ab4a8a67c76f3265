//! Request and response bodies that are specific to the HTTP API.
//!
//! Reservation input and output shapes live in [`crate::model`]; user shapes
//! in [`crate::users`].

use serde::{Deserialize, Serialize};

use crate::model::{ReservationInfo, RoomInfo};
use crate::users::UserInfo;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReservationCreatedResponse {
    pub message: String,
    pub reservation: ReservationInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomResponse {
    pub message: String,
    pub room: RoomInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserCreatedResponse {
    pub message: String,
    pub user: UserInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub rooms: usize,
    pub reservations: usize,
}
