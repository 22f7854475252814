//! Bearer-token authentication middleware.
//!
//! Intercepts every protected request, validates the signed token from the
//! Authorization header, and injects the caller's identity into the request
//! extensions. The token's claims are trusted as-is; credentials are only
//! checked at login.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{AppState, error::AppError, models::user::ROLE_ADMIN};

/// Request-scoped identity of the authenticated caller.
///
/// Inserted into the request extensions by [`auth_middleware`]; handlers
/// extract it with `Extension<AuthContext>`. There is no process-wide
/// session state, so any worker can service any request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,

    /// `user` or `admin`
    pub role: String,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// Authentication middleware function.
///
/// # Flow
///
/// 1. Extract `Authorization: Bearer <token>` from the request
/// 2. Validate the signature and expiry
/// 3. Inject [`AuthContext`] and call the next handler
/// 4. Reject with 401 on any failure
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::InvalidToken)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::InvalidToken)?;

    let claims = state.tokens.verify(token)?;

    let auth_context = AuthContext {
        user_id: claims.sub,
        role: claims.role,
    };

    request.extensions_mut().insert(auth_context);

    Ok(next.run(request).await)
}
