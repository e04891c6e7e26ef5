//! Loyalty Repository

use super::{RepoError, RepoResult};
use shared::models::{LoyaltyProgram, LoyaltyProgramCreate, UserLoyaltyStatus};
use sqlx::{SqliteConnection, SqlitePool};

const PROGRAM_SELECT: &str = "SELECT id, name, min_purchases, min_amount_cents, discount_type, value, max_discount_amount_cents, is_active, created_at, updated_at FROM loyalty_program";

pub async fn active_programs(pool: &SqlitePool) -> RepoResult<Vec<LoyaltyProgram>> {
    let sql = format!("{PROGRAM_SELECT} WHERE is_active = 1 ORDER BY min_purchases DESC, min_amount_cents DESC");
    let rows = sqlx::query_as::<_, LoyaltyProgram>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn create(pool: &SqlitePool, data: LoyaltyProgramCreate) -> RepoResult<LoyaltyProgram> {
    let now = shared::util::now_millis();
    let id = shared::util::next_id();
    sqlx::query(
        "INSERT INTO loyalty_program (id, name, min_purchases, min_amount_cents, discount_type, value, max_discount_amount_cents, is_active, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(data.min_purchases)
    .bind(data.min_amount_cents)
    .bind(data.discount_type)
    .bind(data.value)
    .bind(data.max_discount_amount_cents)
    .bind(data.is_active)
    .bind(now)
    .execute(pool)
    .await?;
    let sql = format!("{PROGRAM_SELECT} WHERE id = ?");
    sqlx::query_as::<_, LoyaltyProgram>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create loyalty program".into()))
}

pub async fn find_user_status(
    pool: &SqlitePool,
    user_id: i64,
) -> RepoResult<Option<UserLoyaltyStatus>> {
    let row = sqlx::query_as::<_, UserLoyaltyStatus>(
        "SELECT user_id, purchases_count, total_spent_cents, updated_at FROM user_loyalty_status WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Bump the denormalized counters when a payment is captured
pub async fn credit_purchase(
    conn: &mut SqliteConnection,
    user_id: i64,
    spent_cents: i64,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO user_loyalty_status (user_id, purchases_count, total_spent_cents, updated_at) VALUES (?1, 1, ?2, ?3) ON CONFLICT (user_id) DO UPDATE SET purchases_count = purchases_count + 1, total_spent_cents = total_spent_cents + excluded.total_spent_cents, updated_at = excluded.updated_at",
    )
    .bind(user_id)
    .bind(spent_cents)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}
