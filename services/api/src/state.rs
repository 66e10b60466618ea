//! Application state shared across handlers

use std::sync::Arc;

use crate::{
    auth::AuthService,
    booking::BookingEngine,
    jwt::JwtService,
    key_server::KeyService,
    repositories::{BookingStore, RoomStore, UserStore},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub booking_engine: BookingEngine,
}

impl AppState {
    /// Wire the services on top of the given stores
    pub fn new(
        users: Arc<dyn UserStore>,
        rooms: Arc<dyn RoomStore>,
        bookings: Arc<dyn BookingStore>,
        keys: Arc<dyn KeyService>,
        jwt_service: JwtService,
    ) -> Self {
        Self {
            auth_service: AuthService::new(users, jwt_service),
            booking_engine: BookingEngine::new(rooms, bookings, keys),
        }
    }
}
