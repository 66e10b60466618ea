//! Store abstractions and their PostgreSQL implementations
//!
//! The booking engine and the authentication gateway only see the traits
//! declared here. `Pg*Repository` types back them in production; the
//! in-memory store backs them in tests.

use async_trait::async_trait;
use common::error::DatabaseError;
use thiserror::Error;

use crate::models::{Booking, NewBooking, NewUser, Room, User};

pub mod booking;
#[cfg(test)]
pub mod memory;
pub mod room;
pub mod user;

pub use booking::PgBookingRepository;
pub use room::PgRoomRepository;
pub use user::PgUserRepository;

/// Error returned by every store
#[derive(Error, Debug)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("Record already exists")]
    Conflict,

    #[error(transparent)]
    Database(DatabaseError),
}

impl From<DatabaseError> for StoreError {
    fn from(e: DatabaseError) -> Self {
        if e.is_unique_violation() {
            StoreError::Conflict
        } else {
            StoreError::Database(e)
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        DatabaseError::from(e).into()
    }
}

/// Type alias for store results
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence of user records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user; a duplicate email yields [`StoreError::Conflict`]
    async fn create(&self, new_user: NewUser) -> StoreResult<User>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>>;
}

/// Read access to rooms
#[async_trait]
pub trait RoomStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Room>>;

    async fn find_all(&self) -> StoreResult<Vec<Room>>;
}

/// Persistence of bookings
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Insert a booking; a second booking for the same user and room yields
    /// [`StoreError::Conflict`]
    async fn create(&self, new_booking: NewBooking) -> StoreResult<Booking>;

    /// Bookings owned by the user, each with its room attached
    async fn find_by_user_id(&self, user_id: i64) -> StoreResult<Vec<Booking>>;

    async fn find_by_room_id(&self, room_id: i64) -> StoreResult<Vec<Booking>>;

    /// Delete the booking if it belongs to the user. Returns whether a row
    /// was removed.
    async fn delete(&self, booking_id: i64, user_id: i64) -> StoreResult<bool>;

    async fn exists_by_user_and_room(&self, user_id: i64, room_id: i64) -> StoreResult<bool>;
}
