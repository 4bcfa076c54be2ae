//! # Sale Repository
//!
//! Database operations for committed sale records and their line items.
//!
//! ## Storage Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sales                         sale_lines                               │
//! │  ┌────────────────────┐        ┌──────────────────────────┐             │
//! │  │ id                 │◄───────│ sale_id                  │             │
//! │  │ subtotal_cents     │        │ product_id               │             │
//! │  │ operator_id/name   │        │ name (frozen)            │             │
//! │  │ timestamp          │        │ unit_price_cents (frozen)│             │
//! │  │ payment_method     │        │ quantity                 │             │
//! │  │ status             │        └──────────────────────────┘             │
//! │  └────────────────────┘                                                 │
//! │                                                                         │
//! │  Line items snapshot the product at commit time, so sale history        │
//! │  is immutable even when the catalog changes afterwards.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use sari_core::{CartLine, PaymentMethod, SaleRecord, SaleStatus};

/// Row shape of the `sales` table without its lines.
#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    subtotal_cents: i64,
    operator_id: String,
    operator_name: String,
    timestamp: DateTime<Utc>,
    payment_method: PaymentMethod,
    status: SaleStatus,
}

impl SaleRow {
    fn into_record(self, lines: Vec<CartLine>) -> SaleRecord {
        SaleRecord {
            id: self.id,
            lines,
            subtotal_cents: self.subtotal_cents,
            operator_id: self.operator_id,
            operator_name: self.operator_name,
            timestamp: self.timestamp,
            payment_method: self.payment_method,
            status: self.status,
        }
    }
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Inserts a complete sale record inside the caller's transaction.
    ///
    /// The commit engine calls this FIRST within its transaction, before
    /// any stock decrement, so the transaction's first statement is a
    /// write and SQLite takes the write lock up front.
    pub async fn insert_in_tx(
        &self,
        conn: &mut SqliteConnection,
        sale: &SaleRecord,
    ) -> DbResult<()> {
        debug!(id = %sale.id, lines = sale.lines.len(), "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, subtotal_cents, operator_id, operator_name,
                timestamp, payment_method, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&sale.id)
        .bind(sale.subtotal_cents)
        .bind(&sale.operator_id)
        .bind(&sale.operator_name)
        .bind(sale.timestamp)
        .bind(sale.payment_method)
        .bind(sale.status)
        .execute(&mut *conn)
        .await?;

        for line in &sale.lines {
            let line_id = Uuid::new_v4().to_string();
            sqlx::query(
                r#"
                INSERT INTO sale_lines (
                    id, sale_id, product_id, name, unit_price_cents, quantity
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&line_id)
            .bind(&sale.id)
            .bind(&line.product_id)
            .bind(&line.name)
            .bind(line.unit_price_cents)
            .bind(line.quantity)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Gets a sale (with its lines) by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SaleRecord>> {
        let row = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT id, subtotal_cents, operator_id, operator_name,
                   timestamp, payment_method, status
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let lines = self.load_lines(id).await?;
        Ok(Some(row.into_record(lines)))
    }

    /// Lists the most recent sales, newest first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<SaleRecord>> {
        let rows = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT id, subtotal_cents, operator_id, operator_name,
                   timestamp, payment_method, status
            FROM sales
            ORDER BY timestamp DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        self.attach_lines(rows).await
    }

    /// Lists sales in `[start, end]`, both bounds inclusive, newest last.
    ///
    /// Callers pass `end` already extended to end-of-day when the range
    /// comes from calendar dates.
    pub async fn list_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<SaleRecord>> {
        let rows = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT id, subtotal_cents, operator_id, operator_name,
                   timestamp, payment_method, status
            FROM sales
            WHERE timestamp >= ?1 AND timestamp <= ?2
            ORDER BY timestamp ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        self.attach_lines(rows).await
    }

    /// Lists sales by a single operator, newest first.
    pub async fn list_by_operator(
        &self,
        operator_id: &str,
        limit: u32,
    ) -> DbResult<Vec<SaleRecord>> {
        let rows = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT id, subtotal_cents, operator_id, operator_name,
                   timestamp, payment_method, status
            FROM sales
            WHERE operator_id = ?1
            ORDER BY timestamp DESC
            LIMIT ?2
            "#,
        )
        .bind(operator_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        self.attach_lines(rows).await
    }

    /// Counts all sales.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Loads the lines for one sale.
    async fn load_lines(&self, sale_id: &str) -> DbResult<Vec<CartLine>> {
        let lines = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT product_id, name, unit_price_cents, quantity
            FROM sale_lines
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Loads and attaches lines for a batch of sale rows in one query.
    async fn attach_lines(&self, rows: Vec<SaleRow>) -> DbResult<Vec<SaleRecord>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        #[derive(sqlx::FromRow)]
        struct LineRow {
            sale_id: String,
            product_id: String,
            name: String,
            unit_price_cents: i64,
            quantity: i64,
        }

        // One IN query for the whole batch instead of a query per sale.
        let mut builder = sqlx::QueryBuilder::new(
            "SELECT sale_id, product_id, name, unit_price_cents, quantity \
             FROM sale_lines WHERE sale_id IN (",
        );
        let mut separated = builder.separated(", ");
        for row in &rows {
            separated.push_bind(&row.id);
        }
        separated.push_unseparated(") ORDER BY rowid");

        let line_rows: Vec<LineRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        let mut by_sale: HashMap<String, Vec<CartLine>> = HashMap::new();
        for line in line_rows {
            by_sale.entry(line.sale_id).or_default().push(CartLine {
                product_id: line.product_id,
                name: line.name,
                unit_price_cents: line.unit_price_cents,
                quantity: line.quantity,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let lines = by_sale.remove(&row.id).unwrap_or_default();
                row.into_record(lines)
            })
            .collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
