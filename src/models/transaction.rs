//! Ledger transaction model and money-movement request types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a transaction record from the database.
///
/// Immutable once created; the ledger is append-only. A completed transfer
/// is exactly two rows, `-X` on the sender and `+X` on the receiver,
/// inserted in the same database transaction and therefore stamped with the
/// same `created_at`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Transaction {
    pub id: Uuid,

    /// Account this movement belongs to. Cascade-deleted with the account.
    pub account_id: Uuid,

    /// Signed amount: positive for money in, negative for money out.
    pub amount: Decimal,

    /// `deposit`, `withdrawal`, `transfer`, or `loan`
    #[sqlx(rename = "type")]
    pub kind: String,

    pub created_at: DateTime<Utc>,
}

/// One row of an account statement as returned to clients.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub amount: Decimal,

    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,

    pub created_at: DateTime<Utc>,
}

/// Request body for `POST /accounts/{accountId}/transfer`.
///
/// # JSON Example
///
/// ```json
/// {
///   "toUsername": "ada",
///   "amount": 250
/// }
/// ```
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Receiver, resolved to their account by username.
    pub to_username: String,

    /// Amount to move. Must be positive.
    pub amount: Decimal,
}

/// Request body for `POST /accounts/{accountId}/loan`.
#[derive(Debug, Deserialize)]
pub struct LoanRequest {
    /// Requested credit. Must be positive; non-admins are capped at 10% of
    /// the current balance.
    pub amount: Decimal,
}
