//! PostgreSQL room store

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use super::{RoomStore, StoreResult};
use crate::models::Room;

/// Rooms created on first start
pub const DEFAULT_ROOMS: [&str; 3] = ["101", "102", "103"];

/// Room repository
#[derive(Clone)]
pub struct PgRoomRepository {
    pool: PgPool,
}

impl PgRoomRepository {
    /// Create a new room repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the given rooms when the table is still empty.
    ///
    /// Returns the number of rooms inserted.
    pub async fn seed(&self, room_names: &[&str]) -> StoreResult<usize> {
        let mut tx = self.pool.begin().await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rooms")
            .fetch_one(&mut *tx)
            .await?;
        if count > 0 {
            return Ok(0);
        }

        for name in room_names {
            sqlx::query("INSERT INTO rooms (room_name) VALUES ($1)")
                .bind(name)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        info!("Seeded {} rooms", room_names.len());
        Ok(room_names.len())
    }
}

#[async_trait]
impl RoomStore for PgRoomRepository {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Room>> {
        let room = sqlx::query_as::<_, Room>(
            r#"
            SELECT id, room_name, created_at
            FROM rooms
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(room)
    }

    async fn find_all(&self) -> StoreResult<Vec<Room>> {
        let rooms = sqlx::query_as::<_, Room>(
            r#"
            SELECT id, room_name, created_at
            FROM rooms
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rooms)
    }
}
