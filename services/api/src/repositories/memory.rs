//! In-memory implementation of every store, used by the tests

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{BookingStore, RoomStore, StoreError, StoreResult, UserStore};
use crate::models::{Booking, NewBooking, NewUser, Room, User};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    rooms: Vec<Room>,
    bookings: Vec<Booking>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Shared in-memory tables; clones see the same data
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Store with rooms whose ids match their numeric names
    pub fn with_rooms(room_names: &[&str]) -> Self {
        let mut tables = Tables::default();
        for name in room_names {
            let id = name.parse().unwrap_or_else(|_| tables.next_id());
            tables.rooms.push(Room {
                id,
                room_name: name.to_string(),
                created_at: Utc::now(),
            });
        }
        Self {
            tables: Arc::new(Mutex::new(tables)),
        }
    }

    pub async fn remove_room(&self, room_id: i64) {
        self.tables.lock().await.rooms.retain(|r| r.id != room_id);
    }

    pub async fn soft_delete_user(&self, user_id: i64) {
        let mut tables = self.tables.lock().await;
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == user_id) {
            user.deleted_at = Some(Utc::now());
        }
    }

    pub async fn booking_count(&self) -> usize {
        self.tables.lock().await.bookings.len()
    }

    /// Insert a booking row as-is, bypassing every check
    pub async fn insert_raw_booking(&self, user_id: i64, room_id: i64, ble_uuid: &str) -> i64 {
        let mut tables = self.tables.lock().await;
        let id = tables.next_id();
        tables.bookings.push(Booking {
            id,
            user_id,
            room_id,
            ble_uuid: ble_uuid.to_string(),
            created_at: Utc::now(),
            room: None,
        });
        id
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, new_user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.lock().await;
        if tables.users.iter().any(|u| u.email == new_user.email) {
            return Err(StoreError::Conflict);
        }

        let user = User {
            id: tables.next_id(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            name: new_user.name,
            created_at: Utc::now(),
            deleted_at: None,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.email == email && u.deleted_at.is_none())
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.id == id && u.deleted_at.is_none())
            .cloned())
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Room>> {
        let tables = self.tables.lock().await;
        Ok(tables.rooms.iter().find(|r| r.id == id).cloned())
    }

    async fn find_all(&self) -> StoreResult<Vec<Room>> {
        Ok(self.tables.lock().await.rooms.clone())
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn create(&self, new_booking: NewBooking) -> StoreResult<Booking> {
        let mut tables = self.tables.lock().await;
        if tables
            .bookings
            .iter()
            .any(|b| b.user_id == new_booking.user_id && b.room_id == new_booking.room_id)
        {
            return Err(StoreError::Conflict);
        }

        let booking = Booking {
            id: tables.next_id(),
            user_id: new_booking.user_id,
            room_id: new_booking.room_id,
            ble_uuid: new_booking.ble_uuid,
            created_at: Utc::now(),
            room: None,
        };
        tables.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn find_by_user_id(&self, user_id: i64) -> StoreResult<Vec<Booking>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id)
            .map(|b| Booking {
                room: tables.rooms.iter().find(|r| r.id == b.room_id).cloned(),
                ..b.clone()
            })
            .collect())
    }

    async fn find_by_room_id(&self, room_id: i64) -> StoreResult<Vec<Booking>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .bookings
            .iter()
            .filter(|b| b.room_id == room_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, booking_id: i64, user_id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.bookings.len();
        tables
            .bookings
            .retain(|b| !(b.id == booking_id && b.user_id == user_id));
        Ok(tables.bookings.len() < before)
    }

    async fn exists_by_user_and_room(&self, user_id: i64, room_id: i64) -> StoreResult<bool> {
        let tables = self.tables.lock().await;
        Ok(tables
            .bookings
            .iter()
            .any(|b| b.user_id == user_id && b.room_id == room_id))
    }
}
