//! Account HTTP handlers.
//!
//! - GET /accounts/user/{userId} - statement with movements and summary
//! - POST /accounts/{accountId}/transfer - move money to another user
//! - POST /accounts/{accountId}/loan - request a credit increase
//! - DELETE /accounts/by-username - close an account (admin only)

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{
    AppState,
    error::AppError,
    middleware::auth::AuthContext,
    models::MessageResponse,
    models::account::AccountStatement,
    models::transaction::{LoanRequest, TransferRequest},
    models::user::CloseAccountRequest,
    services::{account_service, auth_service, transaction_service},
};

/// Get a user's account statement.
///
/// # Authorization
///
/// Only the owner and admins may read a statement; everyone else gets 403.
/// 404 if the user has no account.
pub async fn get_statement(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<AccountStatement>, AppError> {
    if auth.user_id != user_id && !auth.is_admin() {
        return Err(AppError::Forbidden);
    }

    let statement = account_service::statement(&state.pool, user_id).await?;

    Ok(Json(statement))
}

/// Transfer money to another user.
///
/// # Response
///
/// - **200**: `{"message": "Transfer completed"}`
/// - **400**: insufficient funds, self transfer, bad amount, or a missing
///   sender/receiver account
/// - **403**: caller neither owns the sender account nor is an admin
pub async fn transfer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(account_id): Path<Uuid>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if let Err(err) = ensure_account_owner(&state, &auth, account_id).await {
        return Err(reject_missing_account(err));
    }

    let result = transaction_service::execute_transfer(
        &state.pool,
        account_id,
        request.to_username.trim(),
        request.amount,
    )
    .await;

    match result {
        Ok(_) => Ok(Json(MessageResponse::new("Transfer completed"))),
        Err(err) => Err(reject_missing_account(err)),
    }
}

/// Request a loan.
///
/// # Response
///
/// - **200**: `{"message": "Loan approved"}`
/// - **403**: non-admin request above the 10%-of-balance cap
/// - **400**: non-positive amount
/// - **404**: no such account
pub async fn request_loan(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(account_id): Path<Uuid>,
    Json(request): Json<LoanRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    ensure_account_owner(&state, &auth, account_id).await?;

    transaction_service::execute_loan(&state.pool, account_id, request.amount, auth.is_admin())
        .await?;

    Ok(Json(MessageResponse::new("Loan approved")))
}

/// Close an account by username (admin only).
///
/// The admin re-enters their PIN to confirm; it is checked against their
/// stored credential hash. Deleting the user cascades to the account and
/// its transaction rows through the foreign keys, so the whole close is a
/// single atomic statement.
pub async fn close_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CloseAccountRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if !auth.is_admin() {
        return Err(AppError::Forbidden);
    }

    let pin_hash: String = sqlx::query_scalar("SELECT pin_hash FROM users WHERE id = $1")
        .bind(auth.user_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::Forbidden)?;

    if !auth_service::verify_pin(request.admin_pin.trim(), &pin_hash) {
        return Err(AppError::Forbidden);
    }

    let deleted = sqlx::query("DELETE FROM users WHERE username = $1")
        .bind(request.target_username.trim())
        .execute(&state.pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::UserNotFound);
    }

    tracing::info!(target = %request.target_username.trim(), "account closed");

    Ok(Json(MessageResponse::new("Account closed")))
}

/// Verify the caller owns `account_id` (admins bypass the check).
async fn ensure_account_owner(
    state: &AppState,
    auth: &AuthContext,
    account_id: Uuid,
) -> Result<(), AppError> {
    if auth.is_admin() {
        return Ok(());
    }

    let owner: Option<Uuid> = sqlx::query_scalar("SELECT user_id FROM accounts WHERE id = $1")
        .bind(account_id)
        .fetch_optional(&state.pool)
        .await?;

    match owner {
        Some(user_id) if user_id == auth.user_id => Ok(()),
        Some(_) => Err(AppError::Forbidden),
        None => Err(AppError::AccountNotFound),
    }
}

/// The transfer endpoint reports a missing sender or receiver account as a
/// 400 rejection rather than a 404.
fn reject_missing_account(err: AppError) -> AppError {
    match err {
        AppError::AccountNotFound => AppError::InvalidRequest("Account not found".to_string()),
        other => other,
    }
}
