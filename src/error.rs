//! Error types and HTTP error response handling.
//!
//! Every domain failure aborts the enclosing database transaction (full
//! rollback) before it reaches this layer; no operation commits a partial
//! effect and then reports an error.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// Terminal domain errors (`AccountNotFound`, `InsufficientFunds`,
/// `SelfTransfer`, `LoanDenied`, ...) are reported to the caller as-is.
/// `ConnectionLost` is transient: the engines retry the whole atomic unit
/// once before letting it propagate. `ConstraintViolation` and `Database`
/// are reported as a generic failure to avoid leaking internals.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed. Converted through [`From<sqlx::Error>`],
    /// which routes lock timeouts and connection failures to
    /// [`AppError::ConnectionLost`] and constraint breakage to the dedicated
    /// variants instead.
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// The store connection dropped or a bounded lock wait timed out.
    /// Retryable by the caller.
    #[error("Connection to the ledger store was lost")]
    ConnectionLost,

    /// The store rejected an invariant-breaking write (e.g. a negative
    /// balance slipping past the engine checks).
    #[error("Storage constraint violated")]
    ConstraintViolation,

    /// Unexpected internal failure outside the database.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Bearer token is missing, malformed, or expired.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Unknown username or wrong PIN at login.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Authenticated, but not allowed to act on this resource.
    #[error("Forbidden")]
    Forbidden,

    /// Username or email already taken at registration.
    #[error("User already exists")]
    UserExists,

    /// No user with the requested username.
    #[error("User not found")]
    UserNotFound,

    /// No account for the requested id or owner.
    #[error("Account not found")]
    AccountNotFound,

    /// Sender balance cannot cover the requested transfer.
    #[error("Insufficient funds")]
    InsufficientFunds,

    /// Transfer where sender and receiver are the same account.
    #[error("Cannot transfer to same account")]
    SelfTransfer,

    /// Loan request exceeds the non-admin cap.
    #[error("Loan denied")]
    LoanDenied,

    /// Request body or parameters are invalid.
    #[error("{0}")]
    InvalidRequest(String),
}

/// Route sqlx failures into the domain taxonomy.
///
/// PostgreSQL reports a lock-wait timeout as SQLSTATE 55P03; together with
/// pool/IO failures it maps to the retryable `ConnectionLost`. CHECK
/// violations (the `balance >= 0` backstop) become `ConstraintViolation`,
/// and unique violations surface as `UserExists` since the only unique
/// columns are registration identity fields.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some("55P03") {
                return AppError::ConnectionLost;
            }
            match db.kind() {
                sqlx::error::ErrorKind::CheckViolation => return AppError::ConstraintViolation,
                sqlx::error::ErrorKind::UniqueViolation => return AppError::UserExists,
                _ => {}
            }
        }

        match err {
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                AppError::ConnectionLost
            }
            other => AppError::Database(other),
        }
    }
}

/// Convert an `AppError` into an HTTP response.
///
/// All errors return JSON of the form
/// `{"error": {"code": "...", "message": "..."}}`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", self.to_string()),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                self.to_string(),
            ),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.to_string()),
            AppError::LoanDenied => (StatusCode::FORBIDDEN, "loan_denied", self.to_string()),
            AppError::UserExists => (StatusCode::CONFLICT, "user_exists", self.to_string()),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "user_not_found", self.to_string()),
            AppError::AccountNotFound => {
                (StatusCode::NOT_FOUND, "account_not_found", self.to_string())
            }
            AppError::InsufficientFunds => (
                StatusCode::BAD_REQUEST,
                "insufficient_funds",
                self.to_string(),
            ),
            AppError::SelfTransfer => (StatusCode::BAD_REQUEST, "self_transfer", self.to_string()),
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::ConnectionLost => (
                StatusCode::SERVICE_UNAVAILABLE,
                "connection_lost",
                "Temporary storage failure, please retry".to_string(),
            ),
            AppError::ConstraintViolation | AppError::Database(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
