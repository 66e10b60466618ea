//! Room model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Room entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Room {
    pub id: i64,
    pub room_name: String,
    pub created_at: DateTime<Utc>,
}

/// Response for room listing
#[derive(Debug, Serialize, Deserialize)]
pub struct RoomListResponse {
    pub rooms: Vec<Room>,
    pub count: usize,
}

impl From<Vec<Room>> for RoomListResponse {
    fn from(rooms: Vec<Room>) -> Self {
        Self {
            count: rooms.len(),
            rooms,
        }
    }
}
