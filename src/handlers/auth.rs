//! Authentication HTTP handlers.
//!
//! - POST /auth/login - verify credentials, issue a bearer token
//! - POST /auth/register - create a user and their zero-balance account

use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;

use crate::{
    AppState,
    error::AppError,
    models::MessageResponse,
    models::user::{LoginRequest, LoginResponse, RegisterRequest, ROLE_USER, User},
    services::auth_service,
};

/// Log a user in.
///
/// # Response (200)
///
/// ```json
/// {
///   "userId": "550e8400-...",
///   "role": "user",
///   "token": "eyJhbGciOi..."
/// }
/// ```
///
/// Unknown usernames and wrong PINs are indistinguishable to the caller.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if request.username.trim().is_empty() || request.pin.trim().is_empty() {
        return Err(AppError::InvalidRequest("Missing credentials".to_string()));
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, full_name, email, pin_hash, role, created_at
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(request.username.trim())
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::InvalidCredentials)?;

    if !auth_service::verify_pin(request.pin.trim(), &user.pin_hash) {
        return Err(AppError::InvalidCredentials);
    }

    let token = state.tokens.issue(user.id, &user.role)?;

    Ok(Json(LoginResponse {
        user_id: user.id,
        role: user.role,
        token,
    }))
}

/// Register a new user.
///
/// The user row and their zero-balance account are created in one database
/// transaction, so a half-registered user (no account) can never be
/// observed.
///
/// # Response
///
/// - **201**: `{"message": "User created"}`
/// - **400**: missing fields or password mismatch
/// - **409**: username or email already taken
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let name = request.name.trim();
    let last_name = request.last_name.trim();
    let username = request.username.trim();
    let email = request.email.trim();
    let password = request.password.trim();
    let confirm_password = request.confirm_password.trim();

    if name.is_empty()
        || last_name.is_empty()
        || username.is_empty()
        || email.is_empty()
        || password.is_empty()
        || confirm_password.is_empty()
    {
        return Err(AppError::InvalidRequest("All fields required".to_string()));
    }

    if password != confirm_password {
        return Err(AppError::InvalidRequest(
            "Passwords do not match".to_string(),
        ));
    }

    let taken: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 OR email = $2)")
            .bind(username)
            .bind(email)
            .fetch_one(&state.pool)
            .await?;

    if taken {
        return Err(AppError::UserExists);
    }

    let pin_hash = auth_service::hash_pin(password)?;
    let full_name = format!("{name} {last_name}");

    // The unique constraints still backstop a registration race here; a
    // concurrent duplicate surfaces as UserExists via the error mapping.
    let mut tx = state.pool.begin().await?;

    let user_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO users (username, full_name, email, pin_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(username)
    .bind(&full_name)
    .bind(email)
    .bind(&pin_hash)
    .bind(ROLE_USER)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO accounts (user_id, balance) VALUES ($1, 0)")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(%username, "user registered");

    Ok((StatusCode::CREATED, Json(MessageResponse::new("User created"))))
}
