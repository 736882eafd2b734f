use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::user;
use crate::error::AppError;
use crate::utils::email::clean_email;

/// Request body for account signup.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SignupRequest {
    /// Display name (1-64 characters).
    #[schema(example = "Alice")]
    pub username: String,
    #[schema(example = "+77001234567")]
    pub phone: Option<String>,
    #[schema(example = "alice@example.com")]
    pub email: String,
    /// Password (8-128 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

/// Validate a signup request and return the normalized email.
pub fn validate_signup_request(payload: &SignupRequest) -> Result<String, AppError> {
    let username = payload.username.trim();
    if username.is_empty() || username.chars().count() > 64 {
        return Err(AppError::Validation(
            "Username must be 1-64 characters".into(),
        ));
    }
    if payload.password.len() < 8 || payload.password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be 8-128 characters".into(),
        ));
    }
    if let Some(phone) = payload.phone.as_deref()
        && phone.chars().count() > 20
    {
        return Err(AppError::Validation(
            "Phone must be at most 20 characters".into(),
        ));
    }
    normalized_email(&payload.email)
}

pub fn normalized_email(raw: &str) -> Result<String, AppError> {
    clean_email(raw).ok_or_else(|| AppError::Validation("Invalid email address".into()))
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct VerifyEmailRequest {
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "123456")]
    pub verification_code: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ResendVerificationRequest {
    #[schema(example = "alice@example.com")]
    pub email: String,
}

/// Request body for login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
    /// Issue a 30-day token instead of a 1-day one.
    #[serde(default)]
    pub remember: bool,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.email.trim().is_empty() {
        return Err(AppError::Validation("Email must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Successful login response.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct TokenResponse {
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    #[schema(example = "bearer")]
    pub token_type: String,
}

/// Current authenticated user's profile.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserProfile {
    #[schema(example = 7)]
    pub id: i32,
    #[schema(example = "Alice")]
    pub username: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    pub phone: Option<String>,
    #[schema(example = "user")]
    pub role: String,
    pub active: bool,
    pub is_verified: bool,
    pub date_joined: DateTime<Utc>,
    /// Subscribed tariff, if any.
    #[schema(example = 2)]
    pub subscription_id: Option<i32>,
    pub end_date: Option<DateTime<Utc>>,
    pub free_trial: bool,
}

impl From<user::Model> for UserProfile {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            active: user.active,
            is_verified: user.is_verified,
            date_joined: user.date_joined,
            subscription_id: user.subscription_id,
            end_date: user.end_date,
            free_trial: user.free_trial,
        }
    }
}
