//! Account model and the derived statement returned to clients.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::transaction::Movement;

/// Represents an account record from the database.
///
/// # Balance Authority
///
/// `balance` is the authoritative figure. It is mutated only inside ledger
/// store transactions that also append the matching transaction rows, so it
/// can never diverge from the movement log. Balances are `NUMERIC(14,2)`
/// in PostgreSQL and `Decimal` here; floats are never involved.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,

    /// Owning user. Cascade-deleted with the user.
    pub user_id: Uuid,

    /// Current balance. `>= 0` at every committed state.
    pub balance: Decimal,

    /// Percentage rate used for the interest summary figure.
    pub interest_rate: Decimal,

    pub created_at: DateTime<Utc>,
}

/// Derived summary figures for an account's movement history.
///
/// Pure function of the transaction list; all zeros for an empty ledger.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    /// Sum of all positive movements.
    pub total_in: Decimal,

    /// Absolute sum of all negative movements.
    pub total_out: Decimal,

    /// Interest-eligible inflow: each deposit times the account's rate.
    pub interest: Decimal,
}

/// Response body for `GET /accounts/user/{userId}`.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": "550e8400-e29b-41d4-a716-446655440000",
///   "balance": "1250.00",
///   "interestRate": "1.2",
///   "movements": [
///     { "amount": "1500.00", "type": "loan", "createdAt": "2025-06-01T10:00:00Z" },
///     { "amount": "-250.00", "type": "transfer", "createdAt": "2025-06-02T09:30:00Z" }
///   ],
///   "summary": { "totalIn": "1500.00", "totalOut": "250.00", "interest": "18.00" }
/// }
/// ```
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatement {
    pub id: Uuid,
    pub balance: Decimal,
    pub interest_rate: Decimal,
    pub movements: Vec<Movement>,
    pub summary: AccountSummary,
}
