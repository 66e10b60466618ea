//! PostgreSQL booking store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

use super::{BookingStore, StoreResult};
use crate::models::{Booking, NewBooking, Room};

/// Booking repository
#[derive(Clone)]
pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    /// Create a new booking repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn booking_from_row(row: &PgRow) -> Booking {
    Booking {
        id: row.get("id"),
        user_id: row.get("user_id"),
        room_id: row.get("room_id"),
        ble_uuid: row.get("ble_uuid"),
        created_at: row.get("created_at"),
        room: None,
    }
}

#[async_trait]
impl BookingStore for PgBookingRepository {
    async fn create(&self, new_booking: NewBooking) -> StoreResult<Booking> {
        let row = sqlx::query(
            r#"
            INSERT INTO user_rooms (user_id, room_id, ble_uuid)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, room_id, ble_uuid, created_at
            "#,
        )
        .bind(new_booking.user_id)
        .bind(new_booking.room_id)
        .bind(&new_booking.ble_uuid)
        .fetch_one(&self.pool)
        .await?;

        Ok(booking_from_row(&row))
    }

    async fn find_by_user_id(&self, user_id: i64) -> StoreResult<Vec<Booking>> {
        let rows = sqlx::query(
            r#"
            SELECT ur.id, ur.user_id, ur.room_id, ur.ble_uuid, ur.created_at,
                   r.room_name, r.created_at AS room_created_at
            FROM user_rooms ur
            LEFT JOIN rooms r ON r.id = ur.room_id
            WHERE ur.user_id = $1
            ORDER BY ur.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let bookings = rows
            .iter()
            .map(|row| {
                let mut booking = booking_from_row(row);
                let room_name: Option<String> = row.get("room_name");
                let room_created_at: Option<DateTime<Utc>> = row.get("room_created_at");
                if let (Some(room_name), Some(created_at)) = (room_name, room_created_at) {
                    booking.room = Some(Room {
                        id: booking.room_id,
                        room_name,
                        created_at,
                    });
                }
                booking
            })
            .collect();

        Ok(bookings)
    }

    async fn find_by_room_id(&self, room_id: i64) -> StoreResult<Vec<Booking>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, room_id, ble_uuid, created_at
            FROM user_rooms
            WHERE room_id = $1
            ORDER BY id
            "#,
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(booking_from_row).collect())
    }

    async fn delete(&self, booking_id: i64, user_id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM user_rooms WHERE id = $1 AND user_id = $2")
            .bind(booking_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists_by_user_and_room(&self, user_id: i64, room_id: i64) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM user_rooms WHERE user_id = $1 AND room_id = $2)",
        )
        .bind(user_id)
        .bind(room_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serial_test::serial;

    use super::*;
    use crate::{
        booking::{BookingEngine, BookingError},
        models::NewUser,
        repositories::{
            PgRoomRepository, PgUserRepository, RoomStore, StoreError, UserStore,
            room::DEFAULT_ROOMS,
        },
        test_support::{StaticKeyService, migrated_pool},
    };

    /// Booking store that never reports an existing booking, leaving
    /// uniqueness to the database.
    struct UncheckedBookings(PgBookingRepository);

    #[async_trait]
    impl BookingStore for UncheckedBookings {
        async fn create(&self, new_booking: NewBooking) -> StoreResult<Booking> {
            self.0.create(new_booking).await
        }

        async fn find_by_user_id(&self, user_id: i64) -> StoreResult<Vec<Booking>> {
            self.0.find_by_user_id(user_id).await
        }

        async fn find_by_room_id(&self, room_id: i64) -> StoreResult<Vec<Booking>> {
            self.0.find_by_room_id(room_id).await
        }

        async fn delete(&self, booking_id: i64, user_id: i64) -> StoreResult<bool> {
            self.0.delete(booking_id, user_id).await
        }

        async fn exists_by_user_and_room(&self, _: i64, _: i64) -> StoreResult<bool> {
            Ok(false)
        }
    }

    async fn create_user(pool: &PgPool) -> i64 {
        PgUserRepository::new(pool.clone())
            .create(NewUser {
                email: format!("{}@example.com", uuid::Uuid::new_v4()),
                password_hash: "hash".to_string(),
                name: "Store Test".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    async fn create_room(pool: &PgPool, room_name: &str) -> i64 {
        sqlx::query_scalar("INSERT INTO rooms (room_name) VALUES ($1) RETURNING id")
            .bind(room_name)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn cleanup(pool: &PgPool, user_ids: &[i64], room_id: i64) {
        for user_id in user_ids {
            sqlx::query("DELETE FROM user_rooms WHERE user_id = $1")
                .bind(user_id)
                .execute(pool)
                .await
                .unwrap();
            sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(user_id)
                .execute(pool)
                .await
                .unwrap();
        }
        sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(room_id)
            .execute(pool)
            .await
            .unwrap();
    }

    fn new_booking(user_id: i64, room_id: i64) -> NewBooking {
        NewBooking {
            user_id,
            room_id,
            ble_uuid: uuid::Uuid::new_v4().to_string(),
        }
    }

    #[tokio::test]
    #[serial]
    #[ignore = "requires PostgreSQL"]
    async fn test_seed_only_fills_an_empty_table() {
        let pool = migrated_pool().await;
        let rooms = PgRoomRepository::new(pool.clone());

        rooms.seed(&DEFAULT_ROOMS).await.unwrap();
        let seeded = rooms.find_all().await.unwrap();
        assert!(!seeded.is_empty());

        assert_eq!(rooms.seed(&DEFAULT_ROOMS).await.unwrap(), 0);
        assert_eq!(rooms.find_all().await.unwrap(), seeded);
    }

    #[tokio::test]
    #[serial]
    #[ignore = "requires PostgreSQL"]
    async fn test_duplicate_booking_is_a_conflict() {
        let pool = migrated_pool().await;
        let bookings = PgBookingRepository::new(pool.clone());
        let user_id = create_user(&pool).await;
        let room_id = create_room(&pool, "store-conflict").await;

        bookings.create(new_booking(user_id, room_id)).await.unwrap();
        assert!(bookings.exists_by_user_and_room(user_id, room_id).await.unwrap());

        let result = bookings.create(new_booking(user_id, room_id)).await;
        assert!(matches!(result, Err(StoreError::Conflict)));
        assert_eq!(bookings.find_by_room_id(room_id).await.unwrap().len(), 1);

        cleanup(&pool, &[user_id], room_id).await;
    }

    #[tokio::test]
    #[serial]
    #[ignore = "requires PostgreSQL"]
    async fn test_engine_reports_database_conflict_as_already_booked() {
        let pool = migrated_pool().await;
        let user_id = create_user(&pool).await;
        let room_id = create_room(&pool, "engine-conflict").await;

        let engine = BookingEngine::new(
            Arc::new(PgRoomRepository::new(pool.clone())),
            Arc::new(UncheckedBookings(PgBookingRepository::new(pool.clone()))),
            Arc::new(StaticKeyService::default()),
        );

        engine.book_room(user_id, room_id).await.unwrap();
        let result = engine.book_room(user_id, room_id).await;
        assert!(matches!(result, Err(BookingError::AlreadyBooked)));

        cleanup(&pool, &[user_id], room_id).await;
    }

    #[tokio::test]
    #[serial]
    #[ignore = "requires PostgreSQL"]
    async fn test_user_bookings_carry_their_room() {
        let pool = migrated_pool().await;
        let bookings = PgBookingRepository::new(pool.clone());
        let user_id = create_user(&pool).await;
        let room_id = create_room(&pool, "store-join").await;

        let created = bookings.create(new_booking(user_id, room_id)).await.unwrap();

        let listed = bookings.find_by_user_id(user_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
        assert_eq!(listed[0].ble_uuid, created.ble_uuid);
        let room = listed[0].room.as_ref().unwrap();
        assert_eq!(room.id, room_id);
        assert_eq!(room.room_name, "store-join");

        cleanup(&pool, &[user_id], room_id).await;
    }

    #[tokio::test]
    #[serial]
    #[ignore = "requires PostgreSQL"]
    async fn test_delete_is_scoped_to_the_owner() {
        let pool = migrated_pool().await;
        let bookings = PgBookingRepository::new(pool.clone());
        let owner = create_user(&pool).await;
        let other = create_user(&pool).await;
        let room_id = create_room(&pool, "store-delete").await;

        let booking = bookings.create(new_booking(owner, room_id)).await.unwrap();

        assert!(!bookings.delete(booking.id, other).await.unwrap());
        assert!(bookings.exists_by_user_and_room(owner, room_id).await.unwrap());

        assert!(bookings.delete(booking.id, owner).await.unwrap());
        assert!(!bookings.exists_by_user_and_room(owner, room_id).await.unwrap());
        assert!(!bookings.delete(booking.id, owner).await.unwrap());

        cleanup(&pool, &[owner, other], room_id).await;
    }
}
