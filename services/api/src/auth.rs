//! Authentication gateway: registration, login and token verification

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    jwt::{Claims, JwtService},
    models::{NewUser, User},
    repositories::{StoreError, UserStore},
    validation::{validate_email, validate_password},
};

/// Authentication failures
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Email is already registered")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        AuthError::Internal(e.to_string())
    }
}

/// Authentication service backed by a user store
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt_service: JwtService,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(users: Arc<dyn UserStore>, jwt_service: JwtService) -> Self {
        Self { users, jwt_service }
    }

    /// Register a new user and issue a session token
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<(String, User), AuthError> {
        validate_email(email).map_err(AuthError::Validation)?;
        validate_password(password).map_err(AuthError::Validation)?;

        let password_hash = hash_password(password)?;
        let new_user = NewUser {
            email: email.to_string(),
            password_hash,
            name: name.to_string(),
        };

        let user = match self.users.create(new_user).await {
            Ok(user) => user,
            Err(StoreError::Conflict) => {
                warn!("Registration rejected, email already in use: {}", email);
                return Err(AuthError::EmailTaken);
            }
            Err(e) => return Err(e.into()),
        };

        let token = self.issue_token(&user)?;
        info!("Registered user {}", user.id);
        Ok((token, user))
    }

    /// Verify credentials and issue a session token
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, User), AuthError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&user.password_hash, password)? {
            warn!("Failed login attempt for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_token(&user)?;
        info!("User {} logged in", user.id);
        Ok((token, user))
    }

    /// Look up a user by id
    pub async fn get_user_by_id(&self, id: i64) -> Result<User, AuthError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Validate a session token
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.jwt_service.validate_token(token).map_err(|e| {
            warn!("Rejected session token: {}", e);
            AuthError::InvalidToken
        })
    }

    fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        self.jwt_service.generate_token(user).map_err(|e| {
            error!("Failed to generate token: {}", e);
            AuthError::Internal(e.to_string())
        })
    }
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Internal(format!("Failed to hash password: {}", e)))?
        .to_string();

    Ok(password_hash)
}

fn verify_password(password_hash: &str, password: &str) -> Result<bool, AuthError> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| AuthError::Internal(format!("Failed to parse password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
