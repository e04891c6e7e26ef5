//! Cart Repository

use super::{RepoError, RepoResult};
use shared::models::{Cart, CartLine};
use sqlx::{SqliteConnection, SqlitePool};

const CART_SELECT: &str =
    "SELECT id, user_id, session_key, promo_code_id, created_at, updated_at FROM cart";

const LINE_SELECT: &str =
    "SELECT id, cart_id, book_id, quantity, created_at, updated_at FROM cart_line";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Cart>> {
    let sql = format!("{CART_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Cart>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Option<Cart>> {
    let sql = format!("{CART_SELECT} WHERE user_id = ?");
    let row = sqlx::query_as::<_, Cart>(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_user_tx(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> RepoResult<Option<Cart>> {
    let sql = format!("{CART_SELECT} WHERE user_id = ?");
    let row = sqlx::query_as::<_, Cart>(&sql)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn find_by_session(pool: &SqlitePool, session_key: &str) -> RepoResult<Option<Cart>> {
    let sql = format!("{CART_SELECT} WHERE session_key = ?");
    let row = sqlx::query_as::<_, Cart>(&sql)
        .bind(session_key)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(
    pool: &SqlitePool,
    user_id: Option<i64>,
    session_key: Option<&str>,
) -> RepoResult<Cart> {
    if user_id.is_some() == session_key.is_some() {
        return Err(RepoError::Validation(
            "Cart owner must be exactly one of user or session".into(),
        ));
    }
    let now = shared::util::now_millis();
    let id = shared::util::next_id();
    sqlx::query(
        "INSERT INTO cart (id, user_id, session_key, promo_code_id, created_at, updated_at) VALUES (?1, ?2, ?3, NULL, ?4, ?4)",
    )
    .bind(id)
    .bind(user_id)
    .bind(session_key)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create cart".into()))
}

pub async fn lines(pool: &SqlitePool, cart_id: i64) -> RepoResult<Vec<CartLine>> {
    let mut conn = pool.acquire().await?;
    lines_tx(&mut conn, cart_id).await
}

pub async fn lines_tx(conn: &mut SqliteConnection, cart_id: i64) -> RepoResult<Vec<CartLine>> {
    let sql = format!("{LINE_SELECT} WHERE cart_id = ? ORDER BY created_at, id");
    let rows = sqlx::query_as::<_, CartLine>(&sql)
        .bind(cart_id)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

/// Add quantity to a line, creating it when absent (one line per book)
pub async fn add_line(
    pool: &SqlitePool,
    cart_id: i64,
    book_id: i64,
    quantity: i64,
) -> RepoResult<()> {
    let mut conn = pool.acquire().await?;
    add_line_tx(&mut conn, cart_id, book_id, quantity).await
}

pub async fn add_line_tx(
    conn: &mut SqliteConnection,
    cart_id: i64,
    book_id: i64,
    quantity: i64,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let id = shared::util::next_id();
    sqlx::query(
        "INSERT INTO cart_line (id, cart_id, book_id, quantity, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?5) ON CONFLICT (cart_id, book_id) DO UPDATE SET quantity = quantity + excluded.quantity, updated_at = excluded.updated_at",
    )
    .bind(id)
    .bind(cart_id)
    .bind(book_id)
    .bind(quantity)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    touch_tx(conn, cart_id).await
}

/// Replace a line's quantity
pub async fn set_line_quantity(
    pool: &SqlitePool,
    cart_id: i64,
    book_id: i64,
    quantity: i64,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE cart_line SET quantity = ?1, updated_at = ?2 WHERE cart_id = ?3 AND book_id = ?4",
    )
    .bind(quantity)
    .bind(now)
    .bind(cart_id)
    .bind(book_id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Cart line for book {book_id} not found"
        )));
    }
    touch(pool, cart_id).await
}

pub async fn remove_line(pool: &SqlitePool, cart_id: i64, book_id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM cart_line WHERE cart_id = ? AND book_id = ?")
        .bind(cart_id)
        .bind(book_id)
        .execute(pool)
        .await?;
    touch(pool, cart_id).await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn set_promo(pool: &SqlitePool, cart_id: i64, promo_code_id: Option<i64>) -> RepoResult<()> {
    let mut conn = pool.acquire().await?;
    set_promo_tx(&mut conn, cart_id, promo_code_id).await
}

pub async fn set_promo_tx(
    conn: &mut SqliteConnection,
    cart_id: i64,
    promo_code_id: Option<i64>,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    sqlx::query("UPDATE cart SET promo_code_id = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(promo_code_id)
        .bind(now)
        .bind(cart_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Remove all lines and any applied promo (checkout and explicit clear)
pub async fn clear(conn: &mut SqliteConnection, cart_id: i64) -> RepoResult<()> {
    let now = shared::util::now_millis();
    sqlx::query("DELETE FROM cart_line WHERE cart_id = ?")
        .bind(cart_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("UPDATE cart SET promo_code_id = NULL, updated_at = ?1 WHERE id = ?2")
        .bind(now)
        .bind(cart_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, cart_id: i64) -> RepoResult<()> {
    sqlx::query("DELETE FROM cart WHERE id = ?")
        .bind(cart_id)
        .execute(conn)
        .await?;
    Ok(())
}

async fn touch(pool: &SqlitePool, cart_id: i64) -> RepoResult<()> {
    let mut conn = pool.acquire().await?;
    touch_tx(&mut conn, cart_id).await
}

async fn touch_tx(conn: &mut SqliteConnection, cart_id: i64) -> RepoResult<()> {
    let now = shared::util::now_millis();
    sqlx::query("UPDATE cart SET updated_at = ?1 WHERE id = ?2")
        .bind(now)
        .bind(cart_id)
        .execute(conn)
        .await?;
    Ok(())
}
