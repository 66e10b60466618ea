//! Booking (user to room association) model and payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Room;

/// Booking entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub room_id: i64,
    /// Identifier the lock device accepts for this booking
    pub ble_uuid: String,
    pub created_at: DateTime<Utc>,
    /// Attached when the booking is listed for its owner
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub room: Option<Room>,
}

/// New booking creation payload
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: i64,
    pub room_id: i64,
    pub ble_uuid: String,
}

/// Response for booking listing
#[derive(Debug, Serialize, Deserialize)]
pub struct BookingListResponse {
    pub bookings: Vec<Booking>,
    pub count: usize,
}

impl From<Vec<Booking>> for BookingListResponse {
    fn from(bookings: Vec<Booking>) -> Self {
        Self {
            count: bookings.len(),
            bookings,
        }
    }
}

/// Request for booking a room
#[derive(Debug, Deserialize)]
pub struct BookRoomRequest {
    #[serde(default)]
    pub room_id: Option<i64>,
}

/// Query parameters for booking cancellation
#[derive(Debug, Deserialize)]
pub struct CancelBookingQuery {
    pub id: Option<String>,
}

/// Query parameters for the lock device lookup
#[derive(Debug, Deserialize)]
pub struct BleUuidQuery {
    pub room_id: Option<String>,
}

/// Response for the lock device lookup
#[derive(Debug, Serialize, Deserialize)]
pub struct BleUuidResponse {
    pub ble_uuids: Vec<String>,
}

/// Query parameters for the room key lookup
#[derive(Debug, Deserialize)]
pub struct RoomKeyQuery {
    pub room_id: Option<String>,
}

/// Response for the room key lookup
#[derive(Debug, Serialize, Deserialize)]
pub struct RoomKeyResponse {
    pub room_id: i64,
    pub public_key: String,
}
