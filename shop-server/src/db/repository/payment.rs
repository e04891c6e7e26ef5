//! Payment Repository

use super::{RepoError, RepoResult};
use shared::models::{Payment, PaymentStatus};
use sqlx::{SqliteConnection, SqlitePool};

const PAYMENT_SELECT: &str = "SELECT id, order_id, method, currency, amount_cents, provider_session_id, provider_transaction_id, status, created_at, updated_at FROM payment";

pub async fn insert(
    conn: &mut SqliteConnection,
    order_id: i64,
    method: &str,
    currency: &str,
    amount_cents: i64,
) -> RepoResult<i64> {
    let now = shared::util::now_millis();
    let id = shared::util::next_id();
    sqlx::query(
        "INSERT INTO payment (id, order_id, method, currency, amount_cents, status, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6, ?6)",
    )
    .bind(id)
    .bind(order_id)
    .bind(method)
    .bind(currency)
    .bind(amount_cents)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(id)
}

pub async fn find_by_order(pool: &SqlitePool, order_id: i64) -> RepoResult<Option<Payment>> {
    let sql = format!("{PAYMENT_SELECT} WHERE order_id = ?");
    let row = sqlx::query_as::<_, Payment>(&sql)
        .bind(order_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Load an order's payment inside a transaction
pub async fn find_by_order_tx(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> RepoResult<Option<Payment>> {
    let sql = format!("{PAYMENT_SELECT} WHERE order_id = ?");
    let row = sqlx::query_as::<_, Payment>(&sql)
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn find_by_session(pool: &SqlitePool, session_id: &str) -> RepoResult<Option<Payment>> {
    let sql = format!("{PAYMENT_SELECT} WHERE provider_session_id = ?");
    let row = sqlx::query_as::<_, Payment>(&sql)
        .bind(session_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn set_session(pool: &SqlitePool, payment_id: i64, session_id: &str) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE payment SET provider_session_id = ?1, updated_at = ?2 WHERE id = ?3",
    )
    .bind(session_id)
    .bind(now)
    .bind(payment_id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Payment {payment_id} not found")));
    }
    Ok(())
}

/// Mark a payment completed with the provider's capture transaction id.
///
/// The `status != 'completed'` guard plus the unique index on
/// `provider_transaction_id` make completion first-writer-wins; returns
/// false when another capture already completed the payment.
pub async fn mark_completed(
    conn: &mut SqliteConnection,
    payment_id: i64,
    transaction_id: &str,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE payment SET status = 'completed', provider_transaction_id = ?1, updated_at = ?2 WHERE id = ?3 AND status != 'completed'",
    )
    .bind(transaction_id)
    .bind(now)
    .bind(payment_id)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn set_status(
    conn: &mut SqliteConnection,
    payment_id: i64,
    status: PaymentStatus,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE payment SET status = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(status)
        .bind(now)
        .bind(payment_id)
        .execute(conn)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Payment {payment_id} not found")));
    }
    Ok(())
}
