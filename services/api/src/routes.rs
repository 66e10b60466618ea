//! API service routes

use axum::{
    Extension, Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde_json::json;
use tracing::{info, warn};

use crate::{
    booking::BookingError,
    error::{ApiError, ApiResult},
    middleware::{AuthUser, auth_middleware},
    models::{
        AuthResponse, BleUuidQuery, BleUuidResponse, BookRoomRequest, BookingListResponse,
        CancelBookingQuery, LoginRequest, MessageResponse, RegisterRequest, RoomKeyQuery,
        RoomKeyResponse, RoomListResponse, UserResponse,
    },
    state::AppState,
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/me", get(me))
        .route("/api/my-bookings", get(my_bookings))
        .route("/api/book-room", post(book_room))
        .route("/api/cancel-booking", delete(cancel_booking))
        .route("/api/rooms/keys", get(room_key))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/rooms", get(get_rooms))
        .route("/api/ble-uuid", get(ble_uuid))
        .merge(protected_routes)
        .with_state(state)
}

/// Parse a numeric id from a query parameter
fn parse_id(raw: Option<&str>, missing: &str, invalid: &str) -> ApiResult<i64> {
    let raw = raw
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest(missing.to_string()))?;

    raw.parse::<u32>()
        .map(i64::from)
        .map_err(|_| ApiError::BadRequest(invalid.to_string()))
}

fn invalid_body(rejection: JsonRejection) -> ApiError {
    warn!("Rejected request body: {}", rejection.body_text());
    ApiError::BadRequest("Invalid request body".to_string())
}

fn invalid_query(rejection: QueryRejection) -> ApiError {
    warn!("Rejected query string: {}", rejection.body_text());
    ApiError::BadRequest("Invalid query parameters".to_string())
}

/// Service banner
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "message": "Welcome to Smart Lock API"
    }))
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload.map_err(invalid_body)?;

    let (token, user) = state
        .auth_service
        .register(&payload.email, &payload.password, &payload.name)
        .await?;

    let response = AuthResponse {
        token,
        user: UserResponse::from(&user),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Log in with email and password
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload.map_err(invalid_body)?;

    let (token, user) = state
        .auth_service
        .login(&payload.email, &payload.password)
        .await
        .map_err(|e| {
            warn!("Login failed: {}", e);
            ApiError::Unauthorized
        })?;

    let response = AuthResponse {
        token,
        user: UserResponse::from(&user),
    };
    Ok(Json(response))
}

/// Details of the authenticated user
pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    info!("Profile requested by {}", auth_user.email);
    let user = state.auth_service.get_user_by_id(auth_user.id).await?;

    Ok(Json(UserResponse::from(&user)))
}

/// List every room
pub async fn get_rooms(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let rooms = state.booking_engine.get_all_rooms().await?;

    Ok(Json(RoomListResponse::from(rooms)))
}

/// List the authenticated user's bookings
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let bookings = state.booking_engine.get_user_rooms(auth_user.id).await?;

    Ok(Json(BookingListResponse::from(bookings)))
}

/// Book a room for the authenticated user
pub async fn book_room(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<BookRoomRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload.map_err(invalid_body)?;

    let room_id = payload
        .room_id
        .filter(|id| *id != 0)
        .ok_or_else(|| ApiError::BadRequest("Room ID is required".to_string()))?;

    state
        .booking_engine
        .book_room(auth_user.id, room_id)
        .await
        .map_err(|e| match e {
            BookingError::RoomNotFound => ApiError::BadRequest(e.to_string()),
            e => e.into(),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Room booked successfully")),
    ))
}

/// Cancel one of the authenticated user's bookings
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    query: Result<Query<CancelBookingQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query.map_err(invalid_query)?;
    let booking_id = parse_id(
        query.id.as_deref(),
        "Booking ID is required",
        "Invalid booking ID",
    )?;

    state
        .booking_engine
        .cancel_booking(auth_user.id, booking_id)
        .await?;

    Ok(Json(MessageResponse::new("Booking cancelled successfully")))
}

/// BLE identifiers the lock of a room should accept
pub async fn ble_uuid(
    State(state): State<AppState>,
    query: Result<Query<BleUuidQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query.map_err(invalid_query)?;
    let room_id = parse_id(
        query.room_id.as_deref(),
        "room_id is required",
        "invalid room_id",
    )?;

    let ble_uuids = state
        .booking_engine
        .get_ble_uuids_by_room_id(room_id)
        .await?;

    Ok(Json(BleUuidResponse { ble_uuids }))
}

/// Public key of a room booked by the authenticated user
pub async fn room_key(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    query: Result<Query<RoomKeyQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query.map_err(invalid_query)?;
    let room_id = parse_id(
        query.room_id.as_deref(),
        "Room ID is required",
        "Invalid room ID",
    )?;

    let public_key = state
        .booking_engine
        .get_room_key_for_user(auth_user.id, room_id)
        .await
        .map_err(|e| match e {
            BookingError::Forbidden | BookingError::RoomNotFound => {
                ApiError::Forbidden(e.to_string())
            }
            e => {
                warn!("Key retrieval for room {} failed: {}", room_id, e);
                ApiError::Forbidden("Failed to retrieve room key".to_string())
            }
        })?;

    info!("Served key of room {} to user {}", room_id, auth_user.id);
    Ok(Json(RoomKeyResponse {
        room_id,
        public_key,
    }))
}
