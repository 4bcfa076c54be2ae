//! # Product Repository
//!
//! Database operations for the store catalog.
//!
//! ## Guarded Stock Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              How a commit takes stock without racing                    │
//! │                                                                         │
//! │  UPDATE products                                                        │
//! │  SET current_stock = current_stock - ?qty                               │
//! │  WHERE id = ?id AND current_stock >= ?qty                               │
//! │  RETURNING current_stock, min_stock, name                               │
//! │                                                                         │
//! │  The availability check and the decrement are ONE statement, so two     │
//! │  concurrent commits racing for the last unit cannot both pass: SQLite   │
//! │  serializes the writes and exactly one WHERE clause matches.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use sari_core::Product;

/// Result of a guarded stock decrement attempt.
///
/// `Applied` carries the post-decrement stock so the caller can evaluate
/// the low-stock threshold without a second read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockDecrement {
    /// Stock was sufficient; the decrement is part of the transaction.
    Applied {
        name: String,
        new_stock: i64,
        min_stock: i64,
    },
    /// No product row with this ID.
    NotFound,
    /// Product exists but has fewer units than requested.
    Insufficient { name: String, available: i64 },
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists products sorted by name.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price_cents, current_stock, min_stock,
                   barcode, category, created_at, updated_at
            FROM products
            ORDER BY name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price_cents, current_stock, min_stock,
                   barcode, category, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its barcode.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price_cents, current_stock, min_stock,
                   barcode, category, created_at, updated_at
            FROM products
            WHERE barcode = ?1
            "#,
        )
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists products at or below their low-stock threshold (excluding
    /// products that are fully out of stock, which are reported separately).
    pub async fn list_low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price_cents, current_stock, min_stock,
                   barcode, category, created_at, updated_at
            FROM products
            WHERE current_stock > 0 AND current_stock <= min_stock
            ORDER BY current_stock ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, price_cents, current_stock, min_stock,
                barcode, category, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.current_stock)
        .bind(product.min_stock)
        .bind(&product.barcode)
        .bind(&product.category)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a product's catalog fields (name, price, threshold,
    /// barcode, category). Stock is written only through the guarded
    /// decrement and the clamped adjust, never here.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        sqlx::query(
            r#"
            UPDATE products
            SET name = ?2, price_cents = ?3, min_stock = ?4,
                barcode = ?5, category = ?6, updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.min_stock)
        .bind(&product.barcode)
        .bind(&product.category)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Attempts a guarded stock decrement inside the caller's transaction.
    ///
    /// The decrement only applies when `current_stock >= quantity`; the
    /// check and the write are a single statement, so concurrent commits
    /// cannot both take the last unit. On a miss, a follow-up read tells
    /// a missing product apart from insufficient stock.
    ///
    /// Runs on the caller's connection so the commit engine can roll the
    /// whole sale back if any line fails.
    pub async fn decrement_stock(
        &self,
        conn: &mut SqliteConnection,
        product_id: &str,
        quantity: i64,
        now: chrono::DateTime<chrono::Utc>,
    ) -> DbResult<StockDecrement> {
        let applied = sqlx::query_as::<_, (i64, i64, String)>(
            r#"
            UPDATE products
            SET current_stock = current_stock - ?2, updated_at = ?3
            WHERE id = ?1 AND current_stock >= ?2
            RETURNING current_stock, min_stock, name
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some((new_stock, min_stock, name)) = applied {
            return Ok(StockDecrement::Applied {
                name,
                new_stock,
                min_stock,
            });
        }

        // Guard missed: either the row is absent or stock is short.
        let existing = sqlx::query_as::<_, (String, i64)>(
            "SELECT name, current_stock FROM products WHERE id = ?1",
        )
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

        match existing {
            Some((name, available)) => Ok(StockDecrement::Insufficient { name, available }),
            None => Ok(StockDecrement::NotFound),
        }
    }

    /// Applies a signed stock delta, clamping the result at zero.
    ///
    /// Used by the movement reconciler: outbound adjustments larger than
    /// the on-hand count floor the stock rather than fail, because the
    /// ledger entry describing the adjustment already exists.
    ///
    /// Returns the new stock level, or None if the product does not exist.
    pub async fn adjust_stock(
        &self,
        product_id: &str,
        delta: i64,
        now: chrono::DateTime<chrono::Utc>,
    ) -> DbResult<Option<i64>> {
        let new_stock = sqlx::query_as::<_, (i64,)>(
            r#"
            UPDATE products
            SET current_stock = MAX(0, current_stock + ?2), updated_at = ?3
            WHERE id = ?1
            RETURNING current_stock
            "#,
        )
        .bind(product_id)
        .bind(delta)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(new_stock.map(|(stock,)| stock))
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
