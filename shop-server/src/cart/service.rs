//! Cart service

use crate::db::repository;
use crate::ports::CatalogPort;
use crate::utils::AppResult;
use serde::Serialize;
use shared::models::{Cart, CartLine};
use shared::util::now_millis;
use shared::{AppError, ErrorCode};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Cart owner: an authenticated user or an anonymous session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartOwner {
    User(i64),
    Session(String),
}

impl CartOwner {
    pub fn user_id(&self) -> Option<i64> {
        match self {
            CartOwner::User(id) => Some(*id),
            CartOwner::Session(_) => None,
        }
    }
}

/// Cart plus its lines, the shape handlers return
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub cart: Cart,
    pub lines: Vec<CartLine>,
}

/// Upper bound on a single line's quantity; keeps line totals far away
/// from i64 overflow and rejects fat-fingered input early
const MAX_LINE_QUANTITY: i64 = 999;

pub struct CartService {
    pool: SqlitePool,
    catalog: Arc<dyn CatalogPort>,
}

impl std::fmt::Debug for CartService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartService").finish_non_exhaustive()
    }
}

impl CartService {
    pub fn new(pool: SqlitePool, catalog: Arc<dyn CatalogPort>) -> Self {
        Self { pool, catalog }
    }

    /// Look up the owner's cart, creating an empty one lazily
    pub async fn get_or_create(&self, owner: &CartOwner) -> AppResult<Cart> {
        let existing = match owner {
            CartOwner::User(user_id) => {
                repository::cart::find_by_user(&self.pool, *user_id).await?
            }
            CartOwner::Session(key) => repository::cart::find_by_session(&self.pool, key).await?,
        };
        if let Some(cart) = existing {
            return Ok(cart);
        }
        let cart = match owner {
            CartOwner::User(user_id) => {
                repository::cart::create(&self.pool, Some(*user_id), None).await?
            }
            CartOwner::Session(key) => {
                repository::cart::create(&self.pool, None, Some(key)).await?
            }
        };
        Ok(cart)
    }

    pub async fn view(&self, owner: &CartOwner) -> AppResult<CartView> {
        let cart = self.get_or_create(owner).await?;
        let lines = repository::cart::lines(&self.pool, cart.id).await?;
        Ok(CartView { cart, lines })
    }

    /// Add quantity of a book, consolidating into the existing line
    pub async fn add_line(&self, owner: &CartOwner, book_id: i64, quantity: i64) -> AppResult<CartView> {
        if quantity <= 0 {
            return Err(AppError::validation("Quantity must be positive"));
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(AppError::validation("Quantity exceeds the per-line maximum")
                .with_detail("max_quantity", MAX_LINE_QUANTITY));
        }
        let book = self
            .catalog
            .pricing_and_stock(book_id)
            .await?
            .filter(|b| b.is_available)
            .ok_or_else(|| {
                AppError::new(ErrorCode::BookUnavailable).with_detail("book_id", book_id)
            })?;
        let cart = self.get_or_create(owner).await?;
        repository::cart::add_line(&self.pool, cart.id, book.book_id, quantity).await?;
        self.view(owner).await
    }

    /// Replace a line's quantity; zero removes the line
    pub async fn set_quantity(
        &self,
        owner: &CartOwner,
        book_id: i64,
        quantity: i64,
    ) -> AppResult<CartView> {
        if quantity < 0 {
            return Err(AppError::validation("Quantity must not be negative"));
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(AppError::validation("Quantity exceeds the per-line maximum")
                .with_detail("max_quantity", MAX_LINE_QUANTITY));
        }
        let cart = self.get_or_create(owner).await?;
        if quantity == 0 {
            repository::cart::remove_line(&self.pool, cart.id, book_id).await?;
        } else {
            repository::cart::set_line_quantity(&self.pool, cart.id, book_id, quantity)
                .await
                .map_err(|err| match err {
                    repository::RepoError::NotFound(_) => {
                        AppError::new(ErrorCode::CartLineNotFound).with_detail("book_id", book_id)
                    }
                    other => other.into(),
                })?;
        }
        self.view(owner).await
    }

    pub async fn remove_line(&self, owner: &CartOwner, book_id: i64) -> AppResult<CartView> {
        let cart = self.get_or_create(owner).await?;
        let removed = repository::cart::remove_line(&self.pool, cart.id, book_id).await?;
        if !removed {
            return Err(AppError::new(ErrorCode::CartLineNotFound).with_detail("book_id", book_id));
        }
        self.view(owner).await
    }

    pub async fn clear(&self, owner: &CartOwner) -> AppResult<CartView> {
        let cart = self.get_or_create(owner).await?;
        let mut conn = self.pool.acquire().await.map_err(repository::RepoError::from)?;
        repository::cart::clear(&mut conn, cart.id).await?;
        self.view(owner).await
    }

    /// Apply a promo code to the cart.
    ///
    /// Only a light validation happens here (code exists, active,
    /// inside its window); amount-dependent rules are re-checked by the
    /// pricing engine against the actual subtotal, and everything once
    /// more at checkout.
    pub async fn apply_promo(&self, owner: &CartOwner, code: &str) -> AppResult<CartView> {
        let promo = repository::promo::find_by_code(&self.pool, code)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::PromoCodeInvalid))?;
        if !promo.is_active {
            return Err(AppError::new(ErrorCode::PromoCodeInvalid));
        }
        let now = now_millis();
        if now < promo.valid_from || now > promo.valid_until {
            return Err(AppError::new(ErrorCode::PromoCodeExpired));
        }
        let cart = self.get_or_create(owner).await?;
        repository::cart::set_promo(&self.pool, cart.id, Some(promo.id)).await?;
        self.view(owner).await
    }

    pub async fn remove_promo(&self, owner: &CartOwner) -> AppResult<CartView> {
        let cart = self.get_or_create(owner).await?;
        repository::cart::set_promo(&self.pool, cart.id, None).await?;
        self.view(owner).await
    }

    /// Merge an anonymous session cart into the user's cart on login.
    ///
    /// The user cart is the surviving identity; a book present in both
    /// gets the summed quantity. The session cart is deleted. A promo
    /// on the session cart carries over only when the user cart has
    /// none.
    pub async fn merge_on_login(&self, session_key: &str, user_id: i64) -> AppResult<Cart> {
        let Some(session_cart) = repository::cart::find_by_session(&self.pool, session_key).await?
        else {
            return self.get_or_create(&CartOwner::User(user_id)).await;
        };
        let user_cart = self.get_or_create(&CartOwner::User(user_id)).await?;

        // One transaction: a crash mid-merge must not leave lines split
        // across the two carts
        let mut tx = self.pool.begin().await.map_err(repository::RepoError::from)?;
        let session_lines = repository::cart::lines_tx(&mut *tx, session_cart.id).await?;
        for line in session_lines {
            repository::cart::add_line_tx(&mut *tx, user_cart.id, line.book_id, line.quantity)
                .await?;
        }
        if user_cart.promo_code_id.is_none()
            && let Some(promo_id) = session_cart.promo_code_id
        {
            repository::cart::set_promo_tx(&mut *tx, user_cart.id, Some(promo_id)).await?;
        }
        repository::cart::clear(&mut *tx, session_cart.id).await?;
        repository::cart::delete(&mut *tx, session_cart.id).await?;
        tx.commit().await.map_err(repository::RepoError::from)?;

        repository::cart::find_by_id(&self.pool, user_cart.id)
            .await?
            .ok_or_else(|| AppError::not_found("Cart"))
    }
}
