//! Account query service - read-only reconstruction of an account's
//! movement history and summary figures.
//!
//! Not involved in balance authority: the authoritative balance comes from
//! the account row, and because every mutation writes the balance and its
//! transaction rows in one atomic unit, the stored balance and the movement
//! log served here come from the same source and cannot diverge.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::account::{Account, AccountStatement, AccountSummary},
    models::transaction::Movement,
};

/// Load the statement for a user's account: balance, movement history in
/// chronological order, and the derived summary.
///
/// # Errors
///
/// - `AccountNotFound`: the user has no account
pub async fn statement(pool: &DbPool, user_id: Uuid) -> Result<AccountStatement, AppError> {
    let account = sqlx::query_as::<_, Account>(
        r#"
        SELECT id, user_id, balance, interest_rate, created_at
        FROM accounts
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::AccountNotFound)?;

    let movements = sqlx::query_as::<_, Movement>(
        r#"
        SELECT amount, type, created_at
        FROM transactions
        WHERE account_id = $1
        ORDER BY created_at
        "#,
    )
    .bind(account.id)
    .fetch_all(pool)
    .await?;

    let summary = summarize(&movements, account.interest_rate);

    Ok(AccountStatement {
        id: account.id,
        balance: account.balance,
        interest_rate: account.interest_rate,
        movements,
        summary,
    })
}

/// Compute the summary figures for a movement list.
///
/// Inflow is the sum of positive amounts, outflow the absolute sum of
/// negative amounts, and interest accrues on each inflow at the account's
/// percentage rate. An empty list yields all zeros.
pub fn summarize(movements: &[Movement], interest_rate: Decimal) -> AccountSummary {
    let mut total_in = Decimal::ZERO;
    let mut total_out = Decimal::ZERO;

    for movement in movements {
        if movement.amount > Decimal::ZERO {
            total_in += movement.amount;
        } else {
            total_out -= movement.amount;
        }
    }

    let interest = total_in * interest_rate / Decimal::from(100);

    AccountSummary {
        total_in,
        total_out,
        interest,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn movement(amount: Decimal) -> Movement {
        Movement {
            amount,
            kind: if amount >= Decimal::ZERO {
                "deposit".to_string()
            } else {
                "withdrawal".to_string()
            },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_ledger_summarizes_to_zero() {
        let summary = summarize(&[], Decimal::new(12, 1));

        assert_eq!(
            summary,
            AccountSummary {
                total_in: Decimal::ZERO,
                total_out: Decimal::ZERO,
                interest: Decimal::ZERO,
            }
        );
    }

    #[test]
    fn inflow_and_outflow_are_split_by_sign() {
        let movements = vec![
            movement(Decimal::from(200)),
            movement(Decimal::from(-450)),
            movement(Decimal::from(3000)),
            movement(Decimal::from(-650)),
        ];

        let summary = summarize(&movements, Decimal::ZERO);

        assert_eq!(summary.total_in, Decimal::from(3200));
        assert_eq!(summary.total_out, Decimal::from(1100));
    }

    #[test]
    fn interest_accrues_on_inflow_only() {
        let movements = vec![movement(Decimal::from(1000)), movement(Decimal::from(-500))];

        // 1.2% of 1000
        let summary = summarize(&movements, Decimal::new(12, 1));

        assert_eq!(summary.interest, Decimal::from(12));
    }
}
