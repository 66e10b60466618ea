//! Helpers shared by the unit tests

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use axum::Router;
use common::database::{DatabaseConfig, init_pool, run_migrations};
use sqlx::PgPool;
use tokio::{net::TcpListener, sync::Mutex};

use crate::key_server::{KeyService, KeyServiceError};

/// Serve the router on an ephemeral loopback port and return its base URL
pub async fn spawn_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("test listener address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{}", addr)
}

/// Connect to the PostgreSQL server named by the environment and migrate it
pub async fn migrated_pool() -> PgPool {
    let config = DatabaseConfig::from_env().expect("database config");
    let pool = init_pool(&config).await.expect("database pool");
    run_migrations(&pool).await.expect("migrations");
    pool
}

/// Key service answering from a fixed table and recording every lookup
#[derive(Clone, Default)]
pub struct StaticKeyService {
    keys: HashMap<String, String>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StaticKeyService {
    pub fn with_key(mut self, room_name: &str, public_key: &str) -> Self {
        self.keys
            .insert(room_name.to_string(), public_key.to_string());
        self
    }

    pub async fn requests(&self) -> Vec<String> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl KeyService for StaticKeyService {
    async fn fetch_public_key(&self, room_name: &str) -> Result<String, KeyServiceError> {
        self.requests.lock().await.push(room_name.to_string());
        self.keys
            .get(room_name)
            .cloned()
            .ok_or_else(|| KeyServiceError::Unavailable("unexpected status 404 Not Found".into()))
    }
}
