//! Order Repository
//!
//! Orders are inserted once at checkout; afterwards only the status
//! machine mutates status/timestamp columns. History is append-only.

use super::{RepoError, RepoResult};
use shared::models::{Order, OrderItem, OrderPaymentStatus, OrderStatus, OrderStatusHistory};
use sqlx::{SqliteConnection, SqlitePool};

const ORDER_SELECT: &str = "SELECT id, order_number, user_id, status, payment_status, shipping_name, shipping_address, shipping_city, shipping_postal_code, shipping_country, subtotal_cents, discount_cents, shipping_cost_cents, tax_cents, total_cents, is_preorder, preorder_ready_date, processing_at, shipped_at, delivered_at, cancelled_at, created_at, updated_at FROM orders";

const ITEM_SELECT: &str = "SELECT id, order_id, book_id, title, quantity, unit_price_cents, line_total_cents, is_preorder FROM order_item";

const HISTORY_SELECT: &str = "SELECT id, order_id, old_status, new_status, actor_id, note, created_at FROM order_status_history";

/// New order row, written inside the checkout transaction
pub struct NewOrder<'a> {
    pub order_number: &'a str,
    pub user_id: i64,
    pub shipping_name: &'a str,
    pub shipping_address: &'a str,
    pub shipping_city: &'a str,
    pub shipping_postal_code: &'a str,
    pub shipping_country: &'a str,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub shipping_cost_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub is_preorder: bool,
    pub preorder_ready_date: Option<&'a str>,
}

pub async fn insert(conn: &mut SqliteConnection, data: NewOrder<'_>) -> RepoResult<i64> {
    let now = shared::util::now_millis();
    let id = shared::util::next_id();
    sqlx::query(
        "INSERT INTO orders (id, order_number, user_id, status, payment_status, shipping_name, shipping_address, shipping_city, shipping_postal_code, shipping_country, subtotal_cents, discount_cents, shipping_cost_cents, tax_cents, total_cents, is_preorder, preorder_ready_date, created_at, updated_at) VALUES (?1, ?2, ?3, 'pending', 'pending', ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?16)",
    )
    .bind(id)
    .bind(data.order_number)
    .bind(data.user_id)
    .bind(data.shipping_name)
    .bind(data.shipping_address)
    .bind(data.shipping_city)
    .bind(data.shipping_postal_code)
    .bind(data.shipping_country)
    .bind(data.subtotal_cents)
    .bind(data.discount_cents)
    .bind(data.shipping_cost_cents)
    .bind(data.tax_cents)
    .bind(data.total_cents)
    .bind(data.is_preorder)
    .bind(data.preorder_ready_date)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(id)
}

pub async fn insert_item(
    conn: &mut SqliteConnection,
    order_id: i64,
    book_id: i64,
    title: &str,
    quantity: i64,
    unit_price_cents: i64,
    line_total_cents: i64,
    is_preorder: bool,
) -> RepoResult<()> {
    let id = shared::util::next_id();
    sqlx::query(
        "INSERT INTO order_item (id, order_id, book_id, title, quantity, unit_price_cents, line_total_cents, is_preorder) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(id)
    .bind(order_id)
    .bind(book_id)
    .bind(title)
    .bind(quantity)
    .bind(unit_price_cents)
    .bind(line_total_cents)
    .bind(is_preorder)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Load an order inside a transaction (re-checks under the order lock)
pub async fn get(conn: &mut SqliteConnection, id: i64) -> RepoResult<Order> {
    let sql = format!("{ORDER_SELECT} WHERE id = ?");
    sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {id} not found")))
}

pub async fn find_by_number(pool: &SqlitePool, order_number: &str) -> RepoResult<Option<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE order_number = ?");
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(order_number)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE user_id = ? ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, Order>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn items(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let sql = format!("{ITEM_SELECT} WHERE order_id = ? ORDER BY id");
    let rows = sqlx::query_as::<_, OrderItem>(&sql)
        .bind(order_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn items_tx(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let sql = format!("{ITEM_SELECT} WHERE order_id = ? ORDER BY id");
    let rows = sqlx::query_as::<_, OrderItem>(&sql)
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

/// Set the order status, stamping the matching timestamp column only on
/// first entry. The column is chosen from a fixed allow-list, never from
/// caller input.
pub async fn set_status(
    conn: &mut SqliteConnection,
    order_id: i64,
    status: OrderStatus,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let ts_column = match status {
        OrderStatus::Processing => Some("processing_at"),
        OrderStatus::Shipped => Some("shipped_at"),
        OrderStatus::Delivered => Some("delivered_at"),
        OrderStatus::Cancelled => Some("cancelled_at"),
        OrderStatus::Pending | OrderStatus::Refunded => None,
    };
    let sql = match ts_column {
        Some(col) => format!(
            "UPDATE orders SET status = ?1, {col} = COALESCE({col}, ?2), updated_at = ?2 WHERE id = ?3"
        ),
        None => "UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3".to_string(),
    };
    let rows = sqlx::query(&sql)
        .bind(status)
        .bind(now)
        .bind(order_id)
        .execute(conn)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Order {order_id} not found")));
    }
    Ok(())
}

pub async fn set_payment_status(
    conn: &mut SqliteConnection,
    order_id: i64,
    payment_status: OrderPaymentStatus,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE orders SET payment_status = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(payment_status)
        .bind(now)
        .bind(order_id)
        .execute(conn)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Order {order_id} not found")));
    }
    Ok(())
}

pub async fn insert_history(
    conn: &mut SqliteConnection,
    order_id: i64,
    old_status: &str,
    new_status: &str,
    actor_id: Option<i64>,
    note: Option<&str>,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO order_status_history (order_id, old_status, new_status, actor_id, note, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(order_id)
    .bind(old_status)
    .bind(new_status)
    .bind(actor_id)
    .bind(note)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn history(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderStatusHistory>> {
    let sql = format!("{HISTORY_SELECT} WHERE order_id = ? ORDER BY id");
    let rows = sqlx::query_as::<_, OrderStatusHistory>(&sql)
        .bind(order_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Stale unpaid orders eligible for expiration
pub async fn expired_candidates(pool: &SqlitePool, cutoff_millis: i64) -> RepoResult<Vec<Order>> {
    let sql = format!(
        "{ORDER_SELECT} WHERE status = 'pending' AND payment_status = 'pending' AND created_at < ? ORDER BY created_at"
    );
    let rows = sqlx::query_as::<_, Order>(&sql)
        .bind(cutoff_millis)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Preorder orders referencing a book, oldest first
pub async fn preorder_orders_for_book(pool: &SqlitePool, book_id: i64) -> RepoResult<Vec<Order>> {
    let sql = format!(
        "{ORDER_SELECT} WHERE is_preorder = 1 AND id IN (SELECT order_id FROM order_item WHERE book_id = ?) ORDER BY created_at"
    );
    let rows = sqlx::query_as::<_, Order>(&sql)
        .bind(book_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Clear the preorder flag once every preorder line has arrived
pub async fn clear_preorder_flag(
    conn: &mut SqliteConnection,
    order_id: i64,
    ready_date: &str,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    sqlx::query(
        "UPDATE orders SET is_preorder = 0, preorder_ready_date = ?1, updated_at = ?2 WHERE id = ?3",
    )
    .bind(ready_date)
    .bind(now)
    .bind(order_id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Confirmed-order aggregates for loyalty tier eligibility
pub async fn confirmed_stats(pool: &SqlitePool, user_id: i64) -> RepoResult<(i64, i64)> {
    let row: (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(total_cents), 0) FROM orders WHERE user_id = ? AND payment_status = 'paid' AND status NOT IN ('cancelled', 'refunded')",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(row)
}
