//! Ledger store - transactional persistence primitives for accounts and
//! transactions.
//!
//! Every mutating primitive here takes the open database transaction, so
//! balance reads are consistent with the unit's own writes and either all
//! writes commit or none do. Dropping the transaction uncommitted (for
//! example when a request is aborted) rolls everything back.
//!
//! # Locking Discipline
//!
//! Balance rows are read with `SELECT ... FOR UPDATE`, and when two rows are
//! involved the locks are always acquired in ascending account-id order so
//! concurrent transfers over overlapping accounts cannot deadlock. Lock
//! waits are bounded: [`begin`] sets a `lock_timeout` on the unit, and a
//! timeout surfaces as the retryable [`AppError::ConnectionLost`].

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{db::DbPool, error::AppError, models::transaction::Transaction};

/// An open atomic unit against the ledger store.
pub type StoreTx = sqlx::Transaction<'static, sqlx::Postgres>;

/// Upper bound on any row-lock wait inside an atomic unit.
const LOCK_TIMEOUT: &str = "5s";

/// Begin an atomic unit with a bounded lock wait.
pub async fn begin(pool: &DbPool) -> Result<StoreTx, AppError> {
    let mut tx = pool.begin().await?;

    // SET LOCAL scopes the timeout to this transaction only
    sqlx::query(&format!("SET LOCAL lock_timeout = '{LOCK_TIMEOUT}'"))
        .execute(&mut *tx)
        .await?;

    Ok(tx)
}

/// Read an account balance without locking the row.
///
/// Used for request-time fail-fast checks; authoritative decisions re-read
/// under [`lock_balance`].
pub async fn read_balance(tx: &mut StoreTx, account_id: Uuid) -> Result<Decimal, AppError> {
    sqlx::query_scalar("SELECT balance FROM accounts WHERE id = $1")
        .bind(account_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(AppError::AccountNotFound)
}

/// Lock an account row and return its balance.
///
/// The row stays locked until the unit commits or rolls back, which is what
/// prevents two concurrent writers from both passing a balance check against
/// a stale value.
pub async fn lock_balance(tx: &mut StoreTx, account_id: Uuid) -> Result<Decimal, AppError> {
    sqlx::query_scalar("SELECT balance FROM accounts WHERE id = $1 FOR UPDATE")
        .bind(account_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(AppError::AccountNotFound)
}

/// Lock the two accounts of a transfer and return the sender's balance.
///
/// Locks are taken in ascending account-id order regardless of transfer
/// direction.
pub async fn lock_transfer_pair(
    tx: &mut StoreTx,
    sender_id: Uuid,
    receiver_id: Uuid,
) -> Result<Decimal, AppError> {
    let (first, second) = lock_order(sender_id, receiver_id);

    let first_balance = lock_balance(tx, first).await?;
    let second_balance = lock_balance(tx, second).await?;

    if first == sender_id {
        Ok(first_balance)
    } else {
        Ok(second_balance)
    }
}

/// Canonical global lock order for a pair of accounts: ascending id.
fn lock_order(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Resolve a username to its account id.
pub async fn account_id_by_username(tx: &mut StoreTx, username: &str) -> Result<Uuid, AppError> {
    sqlx::query_scalar(
        r#"
        SELECT a.id FROM accounts a
        JOIN users u ON u.id = a.user_id
        WHERE u.username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(AppError::AccountNotFound)
}

/// Apply a signed delta to an account balance.
///
/// The `balance >= 0` CHECK constraint is the storage backstop should a
/// negative delta slip past the engine's own checks; it surfaces as
/// [`AppError::ConstraintViolation`].
pub async fn apply_balance_delta(
    tx: &mut StoreTx,
    account_id: Uuid,
    delta: Decimal,
) -> Result<(), AppError> {
    sqlx::query("UPDATE accounts SET balance = balance + $1 WHERE id = $2")
        .bind(delta)
        .bind(account_id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

/// Append one transaction row to an account's log and return it.
///
/// `created_at` defaults to the transaction timestamp, so every row written
/// by the same atomic unit carries the same logical event time; the two
/// rows of a transfer are stamped identically.
pub async fn record_transaction(
    tx: &mut StoreTx,
    account_id: Uuid,
    amount: Decimal,
    kind: &str,
) -> Result<Transaction, AppError> {
    let transaction = sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions (account_id, amount, type)
        VALUES ($1, $2, $3)
        RETURNING id, account_id, amount, type, created_at
        "#,
    )
    .bind(account_id)
    .bind(amount)
    .bind(kind)
    .fetch_one(&mut **tx)
    .await?;

    Ok(transaction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_order_is_ascending_regardless_of_direction() {
        let low = Uuid::from_u128(1);
        let high = Uuid::from_u128(u128::MAX);

        assert_eq!(lock_order(low, high), (low, high));
        assert_eq!(lock_order(high, low), (low, high));
    }

    #[test]
    fn lock_order_of_equal_ids_is_stable() {
        let id = Uuid::from_u128(42);
        assert_eq!(lock_order(id, id), (id, id));
    }
}
