//! Book catalog model
//!
//! The engine keeps a local copy of the catalog's pricing/stock columns
//! so stock reservation can participate in the checkout transaction.

use serde::{Deserialize, Serialize};

/// Book entity (local catalog projection)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Book {
    pub id: i64,
    pub title: String,
    /// Regular unit price in cents
    pub price_cents: i64,
    /// Sale price in cents, when the book is on sale
    pub discount_price_cents: Option<i64>,
    pub stock_quantity: i64,
    pub is_available: bool,
    /// Preorder flag; preorder books reserve against capacity, not stock
    pub is_preorder: bool,
    /// Availability date for preorder books, `YYYY-MM-DD`
    pub preorder_available_date: Option<String>,
    pub preorder_capacity: i64,
    pub preorder_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Book {
    /// Effective unit price: the sale price when one is set
    pub fn display_price_cents(&self) -> i64 {
        self.discount_price_cents.unwrap_or(self.price_cents)
    }
}

/// Create book payload (admin/catalog sync)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookCreate {
    pub title: String,
    pub price_cents: i64,
    pub discount_price_cents: Option<i64>,
    pub stock_quantity: i64,
    pub is_available: bool,
    pub is_preorder: bool,
    pub preorder_available_date: Option<String>,
    pub preorder_capacity: i64,
}
