//! Booking engine
//!
//! Enforces the booking rules on top of the room and booking stores:
//! a user holds at most one booking per room, every booking gets a fresh
//! BLE identifier, only the owner may cancel a booking, and a room's public
//! key is only handed out to users holding a booking for that room.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    key_server::{KeyService, KeyServiceError},
    models::{Booking, NewBooking, Room},
    repositories::{BookingStore, RoomStore, StoreError},
};

/// Booking failures
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Room not found")]
    RoomNotFound,

    #[error("Room already booked by this user")]
    AlreadyBooked,

    #[error("Booking not found")]
    BookingNotFound,

    #[error("You have not booked this room")]
    Forbidden,

    #[error("Key server unavailable: {0}")]
    KeyServiceUnavailable(String),

    #[error("Key server returned an invalid response: {0}")]
    KeyServiceProtocol(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<KeyServiceError> for BookingError {
    fn from(e: KeyServiceError) -> Self {
        match e {
            KeyServiceError::Unavailable(msg) => BookingError::KeyServiceUnavailable(msg),
            KeyServiceError::Protocol(msg) => BookingError::KeyServiceProtocol(msg),
        }
    }
}

/// Booking engine
#[derive(Clone)]
pub struct BookingEngine {
    rooms: Arc<dyn RoomStore>,
    bookings: Arc<dyn BookingStore>,
    keys: Arc<dyn KeyService>,
}

impl BookingEngine {
    /// Create a new booking engine
    pub fn new(
        rooms: Arc<dyn RoomStore>,
        bookings: Arc<dyn BookingStore>,
        keys: Arc<dyn KeyService>,
    ) -> Self {
        Self {
            rooms,
            bookings,
            keys,
        }
    }

    /// Book a room for a user
    pub async fn book_room(&self, user_id: i64, room_id: i64) -> Result<Booking, BookingError> {
        if self.rooms.find_by_id(room_id).await?.is_none() {
            warn!("User {} tried to book unknown room {}", user_id, room_id);
            return Err(BookingError::RoomNotFound);
        }

        if self
            .bookings
            .exists_by_user_and_room(user_id, room_id)
            .await?
        {
            return Err(BookingError::AlreadyBooked);
        }

        let new_booking = NewBooking {
            user_id,
            room_id,
            ble_uuid: generate_ble_uuid(),
        };

        // The store's unique constraint catches a concurrent duplicate that
        // slipped past the check above.
        let booking = self
            .bookings
            .create(new_booking)
            .await
            .map_err(|e| match e {
                StoreError::Conflict => BookingError::AlreadyBooked,
                e => BookingError::Store(e),
            })?;

        info!(
            "User {} booked room {} (booking {})",
            user_id, room_id, booking.id
        );
        Ok(booking)
    }

    /// All bookings of a user, rooms attached
    pub async fn get_user_rooms(&self, user_id: i64) -> Result<Vec<Booking>, BookingError> {
        Ok(self.bookings.find_by_user_id(user_id).await?)
    }

    pub async fn get_all_rooms(&self) -> Result<Vec<Room>, BookingError> {
        Ok(self.rooms.find_all().await?)
    }

    /// Cancel one of the user's bookings.
    ///
    /// A booking owned by someone else is reported exactly like a missing one.
    pub async fn cancel_booking(&self, user_id: i64, booking_id: i64) -> Result<(), BookingError> {
        if !self.bookings.delete(booking_id, user_id).await? {
            warn!(
                "User {} tried to cancel booking {} which they do not hold",
                user_id, booking_id
            );
            return Err(BookingError::BookingNotFound);
        }

        info!("User {} cancelled booking {}", user_id, booking_id);
        Ok(())
    }

    /// Non-empty BLE identifiers of every booking for the room
    pub async fn get_ble_uuids_by_room_id(&self, room_id: i64) -> Result<Vec<String>, BookingError> {
        let bookings = self.bookings.find_by_room_id(room_id).await?;

        Ok(bookings
            .into_iter()
            .map(|booking| booking.ble_uuid)
            .filter(|ble_uuid| !ble_uuid.is_empty())
            .collect())
    }

    /// Public key of a room the user has booked.
    ///
    /// The booking is checked before the room so that a user without a
    /// booking always gets [`BookingError::Forbidden`], whether or not the
    /// room exists.
    pub async fn get_room_key_for_user(
        &self,
        user_id: i64,
        room_id: i64,
    ) -> Result<String, BookingError> {
        if !self
            .bookings
            .exists_by_user_and_room(user_id, room_id)
            .await?
        {
            warn!(
                "User {} requested the key of room {} without a booking",
                user_id, room_id
            );
            return Err(BookingError::Forbidden);
        }

        let room = self
            .rooms
            .find_by_id(room_id)
            .await?
            .ok_or(BookingError::RoomNotFound)?;

        let public_key = self
            .keys
            .fetch_public_key(&room.room_name)
            .await
            .inspect_err(|e| error!("Key lookup for room {} failed: {}", room.room_name, e))?;

        info!("Issued public key of room {} to user {}", room_id, user_id);
        Ok(public_key)
    }
}

/// Fresh random (version 4) identifier in canonical UUID form
fn generate_ble_uuid() -> String {
    Uuid::new_v4().to_string()
}
