//! Catalog Port
//!
//! Read-only book price/stock/preorder lookup. The production impl
//! reads the local catalog projection; stock reservation itself happens
//! inside the checkout transaction, not through this port.

use crate::db::repository;
use crate::utils::AppResult;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::SqlitePool;

/// Pricing and availability snapshot for one book
#[derive(Debug, Clone, Serialize)]
pub struct BookAvailability {
    pub book_id: i64,
    pub title: String,
    /// Sale-aware unit price in cents
    pub unit_price_cents: i64,
    pub stock_quantity: i64,
    pub is_available: bool,
    pub is_preorder: bool,
    pub preorder_available_date: Option<String>,
    pub preorder_remaining: i64,
}

#[async_trait]
pub trait CatalogPort: Send + Sync {
    async fn pricing_and_stock(&self, book_id: i64) -> AppResult<Option<BookAvailability>>;
}

/// Catalog port backed by the local `book` table
pub struct LocalCatalog {
    pool: SqlitePool,
}

impl LocalCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogPort for LocalCatalog {
    async fn pricing_and_stock(&self, book_id: i64) -> AppResult<Option<BookAvailability>> {
        let book = repository::book::find_by_id(&self.pool, book_id).await?;
        Ok(book.map(|b| BookAvailability {
            book_id: b.id,
            title: b.title.clone(),
            unit_price_cents: b.display_price_cents(),
            stock_quantity: b.stock_quantity,
            is_available: b.is_available,
            is_preorder: b.is_preorder,
            preorder_available_date: b.preorder_available_date.clone(),
            preorder_remaining: (b.preorder_capacity - b.preorder_count).max(0),
        }))
    }
}
