//! # Stock Movement Repository
//!
//! Append-only ledger of manual stock adjustments.
//!
//! Rows are never updated or deleted; the ledger is the audit trail and
//! the denormalized `products.current_stock` is the thing that changes.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use sari_core::StockMovement;

/// Repository for stock movement database operations.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Appends a movement to the ledger.
    pub async fn insert(&self, movement: &StockMovement) -> DbResult<()> {
        debug!(
            id = %movement.id,
            product = %movement.product_name,
            kind = ?movement.kind,
            quantity = movement.quantity,
            "Recording stock movement"
        );

        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, product_id, product_name, kind, quantity,
                reason, operator_id, operator_name, timestamp
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.product_id)
        .bind(&movement.product_name)
        .bind(movement.kind)
        .bind(movement.quantity)
        .bind(&movement.reason)
        .bind(&movement.operator_id)
        .bind(&movement.operator_name)
        .bind(movement.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists the most recent movements, newest first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, product_id, product_name, kind, quantity,
                   reason, operator_id, operator_name, timestamp
            FROM stock_movements
            ORDER BY timestamp DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Lists movements for one product, newest first.
    pub async fn list_for_product(
        &self,
        product_id: &str,
        limit: u32,
    ) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, product_id, product_name, kind, quantity,
                   reason, operator_id, operator_name, timestamp
            FROM stock_movements
            WHERE product_id = ?1
            ORDER BY timestamp DESC
            LIMIT ?2
            "#,
        )
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{TimeZone, Utc};
    use sari_core::MovementKind;
    use uuid::Uuid;

    fn movement(product_id: &str, kind: MovementKind, quantity: i64, hour: u32) -> StockMovement {
        StockMovement {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            product_name: format!("Product {}", product_id),
            kind,
            quantity,
            reason: Some("delivery".to_string()),
            operator_id: "op1".to_string(),
            operator_name: "Maria".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 8, 15, hour, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.movements();

        repo.insert(&movement("p1", MovementKind::In, 10, 8)).await.unwrap();
        repo.insert(&movement("p2", MovementKind::Damaged, 2, 9)).await.unwrap();
        repo.insert(&movement("p1", MovementKind::Out, 3, 10)).await.unwrap();

        let recent = repo.list_recent(10).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].kind, MovementKind::Out);
        assert_eq!(recent[0].product_id, "p1");

        let for_p1 = repo.list_for_product("p1", 10).await.unwrap();
        assert_eq!(for_p1.len(), 2);
        assert!(for_p1.iter().all(|m| m.product_id == "p1"));
    }

    #[tokio::test]
    async fn test_kind_round_trips() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.movements();

        for (hour, kind) in [
            (8, MovementKind::In),
            (9, MovementKind::Out),
            (10, MovementKind::Damaged),
            (11, MovementKind::Returned),
        ] {
            repo.insert(&movement("p1", kind, 1, hour)).await.unwrap();
        }

        let listed = repo.list_recent(10).await.unwrap();
        let kinds: Vec<MovementKind> = listed.iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![
                MovementKind::Returned,
                MovementKind::Damaged,
                MovementKind::Out,
                MovementKind::In,
            ]
        );
    }
}
