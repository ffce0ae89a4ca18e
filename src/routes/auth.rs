//! Authentication routes
//!
//! Registration, login, token refresh, logout-all-devices, and current
//! user information. Handlers stay thin: credential checks and the token
//! lifecycle live in the `auth` module.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{
    hash_password, invalidate_user_tokens, issue_token_pair, refresh_token_pair, verify_password,
    Claims, TokenPair,
};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};
use crate::validators::is_valid_email;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token refresh request: the expired access token and its refresh token.
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub token: String,
    pub refresh_token: String,
}

/// Authentication response with access and refresh tokens
#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl AuthResponse {
    fn from_pair(pair: TokenPair, jwt_config: &JwtSettings) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: jwt_config.access_token_expiry,
        }
    }
}

/// User information response
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub created_at: String,
}

/// POST /auth/register
///
/// Register a new user with email and password; returns a token pair.
///
/// # Errors
/// - 400: invalid email format or weak password
/// - 409: email already registered
pub async fn register(
    form: web::Json<RegisterRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;
    let password_hash = hash_password(&form.password)?;

    let user_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO users (id, email, password_hash, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(user_id)
    .bind(&email)
    .bind(&password_hash)
    .bind(Utc::now())
    .bind(Utc::now())
    .execute(pool.get_ref())
    .await?;

    let pair = issue_token_pair(pool.get_ref(), user_id, &email, jwt_config.get_ref()).await?;

    tracing::info!(user_id = %user_id, "User registered successfully");

    Ok(HttpResponse::Created().json(AuthResponse::from_pair(pair, jwt_config.get_ref())))
}

/// POST /auth/login
///
/// Authenticate with email and password; returns a token pair.
///
/// Unknown email and wrong password produce the same error, so the
/// endpoint cannot be used to enumerate accounts.
///
/// # Errors
/// - 400: malformed email
/// - 401: invalid credentials or inactive account
pub async fn login(
    form: web::Json<LoginRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;

    let user = sqlx::query_as::<_, (Uuid, String, String, bool)>(
        "SELECT id, email, password_hash, is_active FROM users WHERE email = $1",
    )
    .bind(&email)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or(AuthError::InvalidCredentials)?;

    let (user_id, user_email, password_hash, is_active) = user;

    if !is_active {
        return Err(AuthError::InvalidCredentials.into());
    }

    if !verify_password(&form.password, &password_hash)? {
        return Err(AuthError::InvalidCredentials.into());
    }

    let pair = issue_token_pair(pool.get_ref(), user_id, &user_email, jwt_config.get_ref()).await?;

    tracing::info!(user_id = %user_id, "User logged in successfully");

    Ok(HttpResponse::Ok().json(AuthResponse::from_pair(pair, jwt_config.get_ref())))
}

/// POST /auth/refresh
///
/// Exchange an expired access token and its single-use refresh token for
/// a new pair. The old refresh token is never usable again, whatever the
/// outcome of the new issuance.
///
/// # Errors
/// - 401 with a distinct code per refresh-protocol violation
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let pair = refresh_token_pair(
        pool.get_ref(),
        &form.token,
        &form.refresh_token,
        jwt_config.get_ref(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(AuthResponse::from_pair(pair, jwt_config.get_ref())))
}

/// POST /auth/logout
///
/// Invalidate every refresh token of the authenticated user (logout on
/// all devices). Outstanding access tokens stay valid until they expire,
/// but can no longer be refreshed.
pub async fn logout(
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;
    invalidate_user_tokens(pool.get_ref(), user_id).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// GET /auth/me
///
/// Current authenticated user's information. Claims are injected by the
/// JWT middleware.
pub async fn get_current_user(
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;

    let user = sqlx::query_as::<_, (Uuid, String, chrono::DateTime<Utc>)>(
        "SELECT id, email, created_at FROM users WHERE id = $1 AND is_active = true",
    )
    .bind(user_id)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(UserResponse {
        id: user.0.to_string(),
        email: user.1,
        created_at: user.2.to_rfc3339(),
    }))
}
