use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;
use uuid::Uuid;

use coffeehaus_db::WriteOutcome;
use coffeehaus_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;
const TOKEN_TTL_DAYS: i64 = 30;

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;
    let email = normalize_email(&req.email);

    if !email.contains('@') {
        return Err(ApiError::BadRequest("A valid email address is required".into()));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();

    let user_id = Uuid::new_v4();
    let outcome = {
        let email = email.clone();
        state
            .db(move |db| db.create_user(&user_id.to_string(), &email, &password_hash))
            .await?
    };
    if outcome == WriteOutcome::Conflict {
        return Err(ApiError::Conflict("Email is already registered".into()));
    }

    let token = create_token(&state.jwt_secret, user_id, &email)?;
    info!("Registered user {}", user_id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user_id,
            email,
            token,
            is_new_user: true,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(req) = payload?;
    let email = normalize_email(&req.email);

    let user = {
        let email = email.clone();
        state
            .db(move |db| db.get_user_by_email(&email))
            .await?
            .ok_or(ApiError::Unauthorized)?
    };

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| anyhow::anyhow!("stored password hash is invalid: {}", e))?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    let user_id: Uuid = user.id.parse().map_err(anyhow::Error::new)?;
    let has_profile = {
        let id = user.id.clone();
        state
            .db(move |db| db.get_profile_by_user_id(&id))
            .await?
            .is_some()
    };

    let token = create_token(&state.jwt_secret, user_id, &user.email)?;

    Ok(Json(AuthResponse {
        user_id,
        email: user.email,
        token,
        is_new_user: !has_profile,
    }))
}

pub fn create_token(secret: &str, user_id: Uuid, email: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}
