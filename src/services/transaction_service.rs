//! Transfer and loan engines - the operations that mutate account balances.
//!
//! Both engines run their read-check-update sequence inside a single ledger
//! store transaction with the relevant account rows locked, so concurrent
//! requests against the same account serialize at the row lock instead of
//! racing each other's balance checks.
//!
//! # Atomicity Guarantees
//!
//! A balance change and its transaction rows commit together or not at all.
//! On `ConnectionLost` (dropped connection, bounded lock wait expiring) the
//! whole atomic unit is retried once before the error propagates.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{db::DbPool, error::AppError, models::transaction::Transaction, services::ledger_service};

/// Execute a transfer between two accounts.
///
/// # Process
///
/// 1. Fail fast on the sender's request-time balance
/// 2. Resolve the receiver account by username
/// 3. Reject self transfers
/// 4. Lock both rows in ascending-id order and re-validate the balance
/// 5. Move the money and append the `-amount`/`+amount` rows
/// 6. Commit (or roll back on any failure)
///
/// # Errors
///
/// - `AccountNotFound`: sender or receiver missing
/// - `InsufficientFunds`: sender balance below `amount`
/// - `SelfTransfer`: receiver resolves to the sender account
/// - `InvalidRequest`: non-positive amount
/// - `ConnectionLost`: store unreachable after the retry
///
/// # Returns
///
/// The created `(debit, credit)` transaction rows.
pub async fn execute_transfer(
    pool: &DbPool,
    sender_account_id: Uuid,
    to_username: &str,
    amount: Decimal,
) -> Result<(Transaction, Transaction), AppError> {
    if amount <= Decimal::ZERO {
        return Err(AppError::InvalidRequest(
            "Amount must be positive".to_string(),
        ));
    }

    // Retry the whole atomic unit once on transient store failures
    match try_transfer(pool, sender_account_id, to_username, amount).await {
        Err(AppError::ConnectionLost) => {
            tracing::warn!(sender = %sender_account_id, "retrying transfer after lost connection");
            try_transfer(pool, sender_account_id, to_username, amount).await
        }
        other => other,
    }
}

async fn try_transfer(
    pool: &DbPool,
    sender_account_id: Uuid,
    to_username: &str,
    amount: Decimal,
) -> Result<(Transaction, Transaction), AppError> {
    let mut tx = ledger_service::begin(pool).await?;

    // Unlocked fail-fast check; the authoritative check happens under the
    // row lock below.
    let balance = ledger_service::read_balance(&mut tx, sender_account_id).await?;
    if balance < amount {
        tx.rollback().await?;
        return Err(AppError::InsufficientFunds);
    }

    let receiver_account_id = ledger_service::account_id_by_username(&mut tx, to_username).await?;

    if receiver_account_id == sender_account_id {
        tx.rollback().await?;
        return Err(AppError::SelfTransfer);
    }

    let sender_balance =
        ledger_service::lock_transfer_pair(&mut tx, sender_account_id, receiver_account_id).await?;

    if sender_balance < amount {
        tx.rollback().await?;
        return Err(AppError::InsufficientFunds);
    }

    ledger_service::apply_balance_delta(&mut tx, sender_account_id, -amount).await?;
    ledger_service::apply_balance_delta(&mut tx, receiver_account_id, amount).await?;

    // Both rows carry the same transaction timestamp: one logical event.
    let debit =
        ledger_service::record_transaction(&mut tx, sender_account_id, -amount, "transfer").await?;
    let credit =
        ledger_service::record_transaction(&mut tx, receiver_account_id, amount, "transfer")
            .await?;

    tx.commit().await?;

    tracing::info!(
        sender = %sender_account_id,
        receiver = %receiver_account_id,
        %amount,
        "transfer completed"
    );

    Ok((debit, credit))
}

/// Execute a loan request against an account.
///
/// Non-admin requests are capped at 10% of the current balance; the cap is
/// evaluated against the balance read under the row lock, so two concurrent
/// requests cannot both pass it against a stale value. Admins bypass the
/// cap.
///
/// # Errors
///
/// - `AccountNotFound`: no such account
/// - `LoanDenied`: non-admin request above the cap
/// - `InvalidRequest`: non-positive amount
/// - `ConnectionLost`: store unreachable after the retry
pub async fn execute_loan(
    pool: &DbPool,
    account_id: Uuid,
    amount: Decimal,
    is_admin: bool,
) -> Result<Transaction, AppError> {
    if amount <= Decimal::ZERO {
        return Err(AppError::InvalidRequest("Invalid amount".to_string()));
    }

    match try_loan(pool, account_id, amount, is_admin).await {
        Err(AppError::ConnectionLost) => {
            tracing::warn!(account = %account_id, "retrying loan after lost connection");
            try_loan(pool, account_id, amount, is_admin).await
        }
        other => other,
    }
}

async fn try_loan(
    pool: &DbPool,
    account_id: Uuid,
    amount: Decimal,
    is_admin: bool,
) -> Result<Transaction, AppError> {
    let mut tx = ledger_service::begin(pool).await?;

    let balance = ledger_service::lock_balance(&mut tx, account_id).await?;

    if !is_admin && amount > loan_cap(balance) {
        tx.rollback().await?;
        return Err(AppError::LoanDenied);
    }

    ledger_service::apply_balance_delta(&mut tx, account_id, amount).await?;
    let transaction = ledger_service::record_transaction(&mut tx, account_id, amount, "loan").await?;

    tx.commit().await?;

    tracing::info!(account = %account_id, %amount, "loan approved");

    Ok(transaction)
}

/// Maximum loan a non-admin may request: 10% of the current balance.
fn loan_cap(balance: Decimal) -> Decimal {
    balance * Decimal::new(1, 1)
}
