use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{Duration, Utc};
use rand::Rng;
use sea_orm::*;
use tracing::{debug, info, instrument};

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::mail::spawn_verification_mail;
use crate::models::auth::{
    LoginRequest, ResendVerificationRequest, SignupRequest, TokenResponse, UserProfile,
    VerifyEmailRequest, normalized_email, validate_login_request, validate_signup_request,
};
use crate::models::shared::MessageResponse;
use crate::state::AppState;
use crate::utils::{hash, jwt};

fn new_verification_code() -> String {
    rand::rng().random_range(100_000..1_000_000).to_string()
}

async fn find_user_by_email<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> Result<Option<user::Model>, AppError> {
    Ok(user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?)
}

/// Store a fresh code on an unverified account and mail it.
async fn reissue_code(state: &AppState, existing: user::Model) -> Result<(), AppError> {
    let code = new_verification_code();
    let email = existing.email.clone();
    let mut active: user::ActiveModel = existing.into();
    active.verification_code = Set(Some(code.clone()));
    active.verification_code_created = Set(Some(Utc::now()));
    active.update(&state.db).await?;

    spawn_verification_mail(state.mailer.clone(), email, code);
    Ok(())
}

#[utoipa::path(
    post,
    path = "/auth/signup/",
    tag = "Auth",
    operation_id = "signup",
    summary = "Create an account",
    description = "Creates an unverified account and mails a 6-digit verification code. \
        Signing up again with an unverified email issues a new code.",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created, code sent", body = MessageResponse),
        (status = 200, description = "Account exists unverified, code resent", body = MessageResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Email already registered (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = validate_signup_request(&payload)?;

    if let Some(existing) = find_user_by_email(&state.db, &email).await? {
        if existing.is_verified {
            return Err(AppError::Conflict("User with this email already exists".into()));
        }
        reissue_code(&state, existing).await?;
        return Ok((
            StatusCode::OK,
            Json(MessageResponse::new("Verification code resent to email")),
        ));
    }

    let password = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;
    let code = new_verification_code();
    let now = Utc::now();

    let new_user = user::ActiveModel {
        name: Set(payload.username.trim().to_string()),
        email: Set(email.clone()),
        password: Set(password),
        phone: Set(payload.phone.filter(|p| !p.trim().is_empty())),
        is_verified: Set(false),
        verification_code: Set(Some(code.clone())),
        verification_code_created: Set(Some(now)),
        role: Set(user::DEFAULT_ROLE.to_string()),
        active: Set(true),
        date_joined: Set(now),
        subscription_id: Set(None),
        end_date: Set(None),
        free_trial: Set(false),
        ..Default::default()
    };

    let user = new_user.insert(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            debug!("Signup race condition: unique constraint caught on insert");
            AppError::Conflict("User with this email already exists".into())
        }
        _ => AppError::from(e),
    })?;

    info!(user_id = user.id, "Account created");
    spawn_verification_mail(state.mailer.clone(), email, code);

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Verification code sent to email")),
    ))
}

#[utoipa::path(
    post,
    path = "/auth/verify-email/",
    tag = "Auth",
    operation_id = "verifyEmail",
    summary = "Confirm an email with its verification code",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Wrong or expired code (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn verify_email(
    State(state): State<AppState>,
    AppJson(payload): AppJson<VerifyEmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = normalized_email(&payload.email)?;
    let code = payload.verification_code.trim();

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .filter(user::Column::VerificationCode.eq(code))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Validation("Invalid verification code or email".into()))?;

    let ttl = Duration::minutes(state.config.auth.verification_code_ttl_mins);
    let expired = match user.verification_code_created {
        Some(created) => Utc::now() > created + ttl,
        None => true,
    };
    if expired {
        return Err(AppError::Validation(
            "Verification code expired. Please request a new one".into(),
        ));
    }

    let user_id = user.id;
    let mut active: user::ActiveModel = user.into();
    active.is_verified = Set(true);
    active.verification_code = Set(None);
    active.verification_code_created = Set(None);
    active.update(&state.db).await?;

    info!(user_id, "Email verified");
    Ok(Json(MessageResponse::new("Email verified successfully")))
}

#[utoipa::path(
    post,
    path = "/auth/resend-verification/",
    tag = "Auth",
    operation_id = "resendVerification",
    summary = "Send a new verification code",
    request_body = ResendVerificationRequest,
    responses(
        (status = 200, description = "Code resent", body = MessageResponse),
        (status = 400, description = "Already verified (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Unknown email (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn resend_verification(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ResendVerificationRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = normalized_email(&payload.email)?;
    let user = find_user_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if user.is_verified {
        return Err(AppError::Validation("Email is already verified".into()));
    }
    reissue_code(&state, user).await?;

    Ok(Json(MessageResponse::new("Verification code resent to email")))
}

#[utoipa::path(
    post,
    path = "/auth/login/",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in and receive a bearer token",
    description = "Tokens last 1 day, or 30 days with `remember`. Repeated failures for one \
        email are throttled.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Invalid credentials (INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 403, description = "Email not verified (EMAIL_NOT_VERIFIED)", body = ErrorBody),
        (status = 429, description = "Too many failed attempts (RATE_LIMITED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    validate_login_request(&payload)?;
    let email = normalized_email(&payload.email)?;

    if let Some(retry_after) = state.login_throttle.retry_after(&email) {
        return Err(AppError::RateLimited { retry_after });
    }

    let user = match find_user_by_email(&state.db, &email).await? {
        Some(user) => user,
        None => {
            state.login_throttle.record_failure(&email);
            return Err(AppError::InvalidCredentials);
        }
    };

    let is_valid = hash::verify_password(&payload.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
    if !is_valid || !user.active {
        state.login_throttle.record_failure(&email);
        return Err(AppError::InvalidCredentials);
    }
    if !user.is_verified {
        return Err(AppError::EmailNotVerified);
    }
    state.login_throttle.reset(&email);

    let ttl_days = if payload.remember {
        state.config.auth.remember_ttl_days
    } else {
        state.config.auth.token_ttl_days
    };
    let access_token = jwt::sign(user.id, &user.email, ttl_days, &state.config.auth.jwt_secret)
        .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".into(),
    }))
}

#[utoipa::path(
    get,
    path = "/auth/user/",
    tag = "Auth",
    operation_id = "currentUser",
    summary = "Get the current user's profile",
    responses(
        (status = 200, description = "Current user", body = UserProfile),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn current_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, AppError> {
    let user = user::Entity::find_by_id(auth_user.user_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;
    Ok(Json(user.into()))
}
