//! Promo Code Repository

use super::{RepoError, RepoResult};
use shared::models::{PromoCode, PromoCodeCreate, PromoCodeUse};
use sqlx::{SqliteConnection, SqlitePool};

const PROMO_SELECT: &str = "SELECT id, code, discount_type, value, min_cart_amount_cents, max_discount_amount_cents, max_uses, max_uses_per_user, valid_from, valid_until, is_active, use_count, created_at, updated_at FROM promo_code";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<PromoCode>> {
    let sql = format!("{PROMO_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, PromoCode>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Codes are matched case-insensitively
pub async fn find_by_code(pool: &SqlitePool, code: &str) -> RepoResult<Option<PromoCode>> {
    let sql = format!("{PROMO_SELECT} WHERE code = ? COLLATE NOCASE");
    let row = sqlx::query_as::<_, PromoCode>(&sql)
        .bind(code)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: PromoCodeCreate) -> RepoResult<PromoCode> {
    let now = shared::util::now_millis();
    let id = shared::util::next_id();
    sqlx::query(
        "INSERT INTO promo_code (id, code, discount_type, value, min_cart_amount_cents, max_discount_amount_cents, max_uses, max_uses_per_user, valid_from, valid_until, is_active, use_count, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0, ?12, ?12)",
    )
    .bind(id)
    .bind(&data.code)
    .bind(data.discount_type)
    .bind(data.value)
    .bind(data.min_cart_amount_cents)
    .bind(data.max_discount_amount_cents)
    .bind(data.max_uses)
    .bind(data.max_uses_per_user)
    .bind(data.valid_from)
    .bind(data.valid_until)
    .bind(data.is_active)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create promo code".into()))
}

/// Times a user has already redeemed this code
pub async fn uses_for_user(pool: &SqlitePool, promo_code_id: i64, user_id: i64) -> RepoResult<i64> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM promo_code_use WHERE promo_code_id = ? AND user_id = ?",
    )
    .bind(promo_code_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Record a redemption inside the checkout transaction.
///
/// The uniqueness of (promo_code_id, order_id) enforces one promo per
/// order; the guarded use_count increment enforces the global cap even
/// under concurrent checkouts.
pub async fn record_use(
    conn: &mut SqliteConnection,
    promo_code_id: i64,
    order_id: i64,
    user_id: i64,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE promo_code SET use_count = use_count + 1, updated_at = ?1 WHERE id = ?2 AND (max_uses IS NULL OR use_count < max_uses)",
    )
    .bind(now)
    .bind(promo_code_id)
    .execute(&mut *conn)
    .await?;
    if rows.rows_affected() == 0 {
        return Ok(false);
    }
    let id = shared::util::next_id();
    sqlx::query(
        "INSERT INTO promo_code_use (id, promo_code_id, order_id, user_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(id)
    .bind(promo_code_id)
    .bind(order_id)
    .bind(user_id)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(true)
}

pub async fn uses_for_order(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<PromoCodeUse>> {
    let rows = sqlx::query_as::<_, PromoCodeUse>(
        "SELECT id, promo_code_id, order_id, user_id, created_at FROM promo_code_use WHERE order_id = ?",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
