//! API models for stored entities and request/response payloads

use serde::{Deserialize, Serialize};

pub mod booking;
pub mod room;
pub mod user;

pub use booking::{
    BleUuidQuery, BleUuidResponse, BookRoomRequest, Booking, BookingListResponse,
    CancelBookingQuery, NewBooking, RoomKeyQuery, RoomKeyResponse,
};
pub use room::{Room, RoomListResponse};
pub use user::{AuthResponse, LoginRequest, NewUser, RegisterRequest, User, UserResponse};

/// Plain acknowledgement body
#[derive(Debug, Serialize, Deserialize)]
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
