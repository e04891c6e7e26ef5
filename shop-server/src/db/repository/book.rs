//! Book Repository
//!
//! Stock and preorder counters are only mutated inside the checkout
//! transaction and the cancellation/fulfillment paths.

use super::{RepoError, RepoResult};
use shared::models::{Book, BookCreate};
use sqlx::{SqliteConnection, SqlitePool};

const BOOK_SELECT: &str = "SELECT id, title, price_cents, discount_price_cents, stock_quantity, is_available, is_preorder, preorder_available_date, preorder_capacity, preorder_count, created_at, updated_at FROM book";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Book>> {
    let sql = format!("{BOOK_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Book>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn get(conn: &mut SqliteConnection, id: i64) -> RepoResult<Book> {
    let sql = format!("{BOOK_SELECT} WHERE id = ?");
    sqlx::query_as::<_, Book>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Book {id} not found")))
}

pub async fn create(pool: &SqlitePool, data: BookCreate) -> RepoResult<Book> {
    let now = shared::util::now_millis();
    let id = shared::util::next_id();
    sqlx::query(
        "INSERT INTO book (id, title, price_cents, discount_price_cents, stock_quantity, is_available, is_preorder, preorder_available_date, preorder_capacity, preorder_count, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, ?10, ?10)",
    )
    .bind(id)
    .bind(&data.title)
    .bind(data.price_cents)
    .bind(data.discount_price_cents)
    .bind(data.stock_quantity)
    .bind(data.is_available)
    .bind(data.is_preorder)
    .bind(&data.preorder_available_date)
    .bind(data.preorder_capacity)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create book".into()))
}

/// Atomically reserve stock for an in-stock line.
///
/// Returns false when the book is unavailable or has too little stock;
/// the caller decides whether that fails the whole transaction.
pub async fn reserve_stock(
    conn: &mut SqliteConnection,
    book_id: i64,
    quantity: i64,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE book SET stock_quantity = stock_quantity - ?1, updated_at = ?2 WHERE id = ?3 AND is_available = 1 AND stock_quantity >= ?1",
    )
    .bind(quantity)
    .bind(now)
    .bind(book_id)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Atomically reserve preorder capacity for a preorder line
pub async fn reserve_preorder(
    conn: &mut SqliteConnection,
    book_id: i64,
    quantity: i64,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE book SET preorder_count = preorder_count + ?1, updated_at = ?2 WHERE id = ?3 AND is_available = 1 AND is_preorder = 1 AND preorder_count + ?1 <= preorder_capacity",
    )
    .bind(quantity)
    .bind(now)
    .bind(book_id)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Release a hold made at order creation (cancellation path)
pub async fn release_hold(
    conn: &mut SqliteConnection,
    book_id: i64,
    quantity: i64,
    was_preorder: bool,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let sql = if was_preorder {
        // The book may have been converted to regular stock since the
        // order was placed; only the matching counter is released.
        "UPDATE book SET preorder_count = MAX(preorder_count - ?1, 0), updated_at = ?2 WHERE id = ?3 AND is_preorder = 1"
    } else {
        "UPDATE book SET stock_quantity = stock_quantity + ?1, updated_at = ?2 WHERE id = ?3"
    };
    sqlx::query(sql)
        .bind(quantity)
        .bind(now)
        .bind(book_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Preorder books whose availability date has arrived
pub async fn arrived_preorders(pool: &SqlitePool, today: &str) -> RepoResult<Vec<Book>> {
    let sql = format!(
        "{BOOK_SELECT} WHERE is_preorder = 1 AND preorder_available_date IS NOT NULL AND preorder_available_date <= ? ORDER BY preorder_available_date"
    );
    let rows = sqlx::query_as::<_, Book>(&sql)
        .bind(today)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Convert an arrived preorder book back to a regular one, backfilling
/// stock from the reserved preorder counter
pub async fn convert_to_regular(conn: &mut SqliteConnection, book_id: i64) -> RepoResult<()> {
    let now = shared::util::now_millis();
    sqlx::query(
        "UPDATE book SET is_preorder = 0, stock_quantity = stock_quantity + preorder_count, preorder_count = 0, updated_at = ?1 WHERE id = ?2",
    )
    .bind(now)
    .bind(book_id)
    .execute(conn)
    .await?;
    Ok(())
}
