//! Integration tests for the ledger engines against PostgreSQL.
//!
//! Each test runs in its own database created by `#[sqlx::test]` with the
//! crate migrations applied. The suite is ignored by default so `cargo test`
//! passes on machines without a PostgreSQL server; run it with
//! `DATABASE_URL=... cargo test -- --ignored`.

use bank_ledger_service::error::AppError;
use bank_ledger_service::services::transaction_service;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// Insert a user and their account, returning (user_id, account_id).
async fn seed_user(pool: &PgPool, username: &str, balance: Decimal) -> (Uuid, Uuid) {
    let user_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO users (username, full_name, email, pin_hash, role)
        VALUES ($1, $2, $3, 'unused-hash', 'user')
        RETURNING id
        "#,
    )
    .bind(username)
    .bind(format!("{username} Test"))
    .bind(format!("{username}@example.com"))
    .fetch_one(pool)
    .await
    .expect("failed to seed user");

    let account_id: Uuid =
        sqlx::query_scalar("INSERT INTO accounts (user_id, balance) VALUES ($1, $2) RETURNING id")
            .bind(user_id)
            .bind(balance)
            .fetch_one(pool)
            .await
            .expect("failed to seed account");

    (user_id, account_id)
}

async fn balance_of(pool: &PgPool, account_id: Uuid) -> Decimal {
    sqlx::query_scalar("SELECT balance FROM accounts WHERE id = $1")
        .bind(account_id)
        .fetch_one(pool)
        .await
        .expect("failed to read balance")
}

async fn movement_count(pool: &PgPool, account_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE account_id = $1")
        .bind(account_id)
        .fetch_one(pool)
        .await
        .expect("failed to count movements")
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL server (DATABASE_URL)"]
async fn transfer_moves_funds_and_records_both_rows(pool: PgPool) {
    let (_, sender) = seed_user(&pool, "sender", Decimal::from(1000)).await;
    let (_, receiver) = seed_user(&pool, "receiver", Decimal::from(50)).await;

    let (debit, credit) =
        transaction_service::execute_transfer(&pool, sender, "receiver", Decimal::from(300))
            .await
            .expect("transfer failed");

    assert_eq!(balance_of(&pool, sender).await, Decimal::from(700));
    assert_eq!(balance_of(&pool, receiver).await, Decimal::from(350));

    // Exactly two rows, -300 on the sender and +300 on the receiver,
    // stamped with the same logical event time.
    assert_eq!(debit.account_id, sender);
    assert_eq!(debit.amount, Decimal::from(-300));
    assert_eq!(credit.account_id, receiver);
    assert_eq!(credit.amount, Decimal::from(300));
    assert_eq!(debit.kind, "transfer");
    assert_eq!(credit.kind, "transfer");
    assert_eq!(debit.created_at, credit.created_at);

    let total_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
        .fetch_one(&pool)
        .await
        .expect("failed to count transactions");
    assert_eq!(total_rows, 2);
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL server (DATABASE_URL)"]
async fn transfer_with_insufficient_funds_changes_nothing(pool: PgPool) {
    let (_, sender) = seed_user(&pool, "sender", Decimal::from(100)).await;
    let (_, receiver) = seed_user(&pool, "receiver", Decimal::ZERO).await;

    let result =
        transaction_service::execute_transfer(&pool, sender, "receiver", Decimal::from(101)).await;

    assert!(matches!(result, Err(AppError::InsufficientFunds)));
    assert_eq!(balance_of(&pool, sender).await, Decimal::from(100));
    assert_eq!(balance_of(&pool, receiver).await, Decimal::ZERO);
    assert_eq!(movement_count(&pool, sender).await, 0);
    assert_eq!(movement_count(&pool, receiver).await, 0);
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL server (DATABASE_URL)"]
async fn self_transfer_is_rejected_regardless_of_balance(pool: PgPool) {
    let (_, account) = seed_user(&pool, "loner", Decimal::from(5000)).await;

    let result =
        transaction_service::execute_transfer(&pool, account, "loner", Decimal::from(10)).await;

    assert!(matches!(result, Err(AppError::SelfTransfer)));
    assert_eq!(balance_of(&pool, account).await, Decimal::from(5000));
    assert_eq!(movement_count(&pool, account).await, 0);
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL server (DATABASE_URL)"]
async fn transfer_to_unknown_username_changes_nothing(pool: PgPool) {
    let (_, sender) = seed_user(&pool, "sender", Decimal::from(100)).await;

    let result =
        transaction_service::execute_transfer(&pool, sender, "nobody", Decimal::from(10)).await;

    assert!(matches!(result, Err(AppError::AccountNotFound)));
    assert_eq!(balance_of(&pool, sender).await, Decimal::from(100));
    assert_eq!(movement_count(&pool, sender).await, 0);
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL server (DATABASE_URL)"]
async fn non_positive_transfer_amounts_are_rejected(pool: PgPool) {
    let (_, sender) = seed_user(&pool, "sender", Decimal::from(100)).await;
    seed_user(&pool, "receiver", Decimal::ZERO).await;

    for amount in [Decimal::ZERO, Decimal::from(-5)] {
        let result =
            transaction_service::execute_transfer(&pool, sender, "receiver", amount).await;
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    assert_eq!(balance_of(&pool, sender).await, Decimal::from(100));
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL server (DATABASE_URL)"]
async fn concurrent_transfers_never_overdraw(pool: PgPool) {
    let (_, sender) = seed_user(&pool, "sender", Decimal::from(500)).await;
    let (_, receiver) = seed_user(&pool, "receiver", Decimal::ZERO).await;

    // 8 concurrent transfers of 100 against a balance of 500: exactly 5 may
    // succeed, however they interleave.
    let mut handles = Vec::new();
    for _ in 0..8 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            transaction_service::execute_transfer(&pool, sender, "receiver", Decimal::from(100))
                .await
        }));
    }

    let mut succeeded = 0;
    let mut insufficient = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            Ok(_) => succeeded += 1,
            Err(AppError::InsufficientFunds) => insufficient += 1,
            Err(err) => panic!("unexpected transfer error: {err}"),
        }
    }

    assert_eq!(succeeded, 5);
    assert_eq!(insufficient, 3);
    assert_eq!(balance_of(&pool, sender).await, Decimal::ZERO);
    assert_eq!(balance_of(&pool, receiver).await, Decimal::from(500));
    assert_eq!(movement_count(&pool, sender).await, 5);
    assert_eq!(movement_count(&pool, receiver).await, 5);
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL server (DATABASE_URL)"]
async fn loan_within_cap_is_approved(pool: PgPool) {
    let (_, account) = seed_user(&pool, "borrower", Decimal::from(1000)).await;

    transaction_service::execute_loan(&pool, account, Decimal::from(100), false)
        .await
        .expect("loan failed");

    assert_eq!(balance_of(&pool, account).await, Decimal::from(1100));
    assert_eq!(movement_count(&pool, account).await, 1);

    let (amount, kind): (Decimal, String) =
        sqlx::query_as("SELECT amount, type FROM transactions WHERE account_id = $1")
            .bind(account)
            .fetch_one(&pool)
            .await
            .expect("failed to read loan row");
    assert_eq!(amount, Decimal::from(100));
    assert_eq!(kind, "loan");
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL server (DATABASE_URL)"]
async fn loan_above_cap_is_denied_for_non_admins(pool: PgPool) {
    let (_, account) = seed_user(&pool, "borrower", Decimal::from(1000)).await;

    let result = transaction_service::execute_loan(&pool, account, Decimal::from(101), false).await;

    assert!(matches!(result, Err(AppError::LoanDenied)));
    assert_eq!(balance_of(&pool, account).await, Decimal::from(1000));
    assert_eq!(movement_count(&pool, account).await, 0);
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL server (DATABASE_URL)"]
async fn admins_bypass_the_loan_cap(pool: PgPool) {
    let (_, account) = seed_user(&pool, "borrower", Decimal::from(10)).await;

    transaction_service::execute_loan(&pool, account, Decimal::from(9000), true)
        .await
        .expect("admin loan failed");

    assert_eq!(balance_of(&pool, account).await, Decimal::from(9010));
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL server (DATABASE_URL)"]
async fn closing_a_user_cascades_to_account_and_transactions(pool: PgPool) {
    let (user_id, account) = seed_user(&pool, "doomed", Decimal::from(1000)).await;
    seed_user(&pool, "receiver", Decimal::ZERO).await;

    transaction_service::execute_transfer(&pool, account, "receiver", Decimal::from(100))
        .await
        .expect("transfer failed");
    assert_eq!(movement_count(&pool, account).await, 1);

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&pool)
        .await
        .expect("delete failed");

    let accounts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&pool)
        .await
        .expect("failed to count accounts");
    assert_eq!(accounts, 0);
    assert_eq!(movement_count(&pool, account).await, 0);
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL server (DATABASE_URL)"]
async fn statement_summary_matches_movements(pool: PgPool) {
    use bank_ledger_service::services::account_service;

    let (user_id, account) = seed_user(&pool, "saver", Decimal::from(2000)).await;
    let (receiver_user, _) = seed_user(&pool, "receiver", Decimal::ZERO).await;

    transaction_service::execute_loan(&pool, account, Decimal::from(200), false)
        .await
        .expect("loan failed");
    transaction_service::execute_transfer(&pool, account, "receiver", Decimal::from(300))
        .await
        .expect("transfer failed");

    let statement = account_service::statement(&pool, user_id)
        .await
        .expect("statement failed");

    assert_eq!(statement.id, account);
    assert_eq!(statement.balance, Decimal::from(1900));
    assert_eq!(statement.movements.len(), 2);
    assert_eq!(statement.summary.total_in, Decimal::from(200));
    assert_eq!(statement.summary.total_out, Decimal::from(300));
    // default rate 1.2% on the 200 inflow
    assert_eq!(statement.summary.interest, Decimal::new(24, 1));

    let receiver_statement = account_service::statement(&pool, receiver_user)
        .await
        .expect("receiver statement failed");
    assert_eq!(receiver_statement.balance, Decimal::from(300));
    assert_eq!(receiver_statement.summary.total_in, Decimal::from(300));

    let empty = account_service::statement(&pool, Uuid::new_v4()).await;
    assert!(matches!(empty, Err(AppError::AccountNotFound)));
}
