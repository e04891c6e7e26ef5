//! Refund Repository

use super::{RepoError, RepoResult};
use shared::models::{Refund, RefundStatus};
use sqlx::{SqliteConnection, SqlitePool};

const REFUND_SELECT: &str = "SELECT id, order_id, amount_cents, reason, status, requested_by, processed_by, provider_refund_id, created_at, updated_at FROM refund";

pub async fn insert(
    pool: &SqlitePool,
    order_id: i64,
    amount_cents: i64,
    reason: &str,
    requested_by: i64,
) -> RepoResult<Refund> {
    let now = shared::util::now_millis();
    let id = shared::util::next_id();
    sqlx::query(
        "INSERT INTO refund (id, order_id, amount_cents, reason, status, requested_by, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, 'pending', ?5, ?6, ?6)",
    )
    .bind(id)
    .bind(order_id)
    .bind(amount_cents)
    .bind(reason)
    .bind(requested_by)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create refund".into()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Refund>> {
    let sql = format!("{REFUND_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Refund>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn list(pool: &SqlitePool, status: Option<RefundStatus>) -> RepoResult<Vec<Refund>> {
    let rows = match status {
        Some(s) => {
            let sql = format!("{REFUND_SELECT} WHERE status = ? ORDER BY created_at");
            sqlx::query_as::<_, Refund>(&sql).bind(s).fetch_all(pool).await?
        }
        None => {
            let sql = format!("{REFUND_SELECT} ORDER BY created_at");
            sqlx::query_as::<_, Refund>(&sql).fetch_all(pool).await?
        }
    };
    Ok(rows)
}

pub async fn list_for_order(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<Refund>> {
    let sql = format!("{REFUND_SELECT} WHERE order_id = ? ORDER BY created_at");
    let rows = sqlx::query_as::<_, Refund>(&sql)
        .bind(order_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Guarded status move; returns false when the refund was not in
/// `expected_from`, so approval/processing races resolve to no-ops
pub async fn move_status(
    conn: &mut SqliteConnection,
    refund_id: i64,
    expected_from: &[RefundStatus],
    to: RefundStatus,
    processed_by: Option<i64>,
    provider_refund_id: Option<&str>,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let placeholders = expected_from
        .iter()
        .map(|s| format!("'{}'", s.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE refund SET status = ?1, processed_by = COALESCE(?2, processed_by), provider_refund_id = COALESCE(?3, provider_refund_id), updated_at = ?4 WHERE id = ?5 AND status IN ({placeholders})"
    );
    let rows = sqlx::query(&sql)
        .bind(to)
        .bind(processed_by)
        .bind(provider_refund_id)
        .bind(now)
        .bind(refund_id)
        .execute(conn)
        .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn get(conn: &mut SqliteConnection, id: i64) -> RepoResult<Refund> {
    let sql = format!("{REFUND_SELECT} WHERE id = ?");
    sqlx::query_as::<_, Refund>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Refund {id} not found")))
}
