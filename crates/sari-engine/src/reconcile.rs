//! # Stock Movement Reconciler
//!
//! Applies manual stock adjustments: deliveries in, damage and returns
//! out.
//!
//! ## Two-Phase Write, On Purpose
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. APPEND ledger row        ← durable record of intent                 │
//! │  2. UPDATE current_stock     ← clamped at zero (MAX(0, stock + delta))  │
//! │                                                                         │
//! │  A failure between the two surfaces as PartialApply carrying the        │
//! │  movement id. The ledger row is the source of truth; the stock level    │
//! │  can be replayed from it. Collapsing both writes into one transaction   │
//! │  would hide the ledger/level distinction the audit trail exists for.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The clamp differs from the commit engine deliberately: a commit
//! REJECTS insufficient stock (the sale must not happen), while an
//! outbound adjustment larger than on-hand FLOORS at zero (the damage
//! already happened; refusing to record it helps nobody).

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::cache::ProductCache;
use crate::error::{EngineError, EngineResult};
use crate::fanout::{LowStockAlert, Notifier};
use sari_core::validation::validate_quantity;
use sari_core::{CoreError, MovementKind, Operator, Role, StockMovement};
use sari_db::Database;

/// A stock adjustment to apply.
#[derive(Debug, Clone)]
pub struct MovementRequest {
    pub product_id: String,
    pub kind: MovementKind,
    /// Unsigned count; the kind determines the sign.
    pub quantity: i64,
    pub reason: Option<String>,
}

/// Applies movement requests: ledger first, stock level second.
#[derive(Debug, Clone)]
pub struct Reconciler {
    db: Database,
    notifier: Notifier,
    cache: ProductCache,
}

impl Reconciler {
    /// Creates a reconciler over shared handles.
    pub fn new(db: Database, notifier: Notifier, cache: ProductCache) -> Self {
        Reconciler {
            db,
            notifier,
            cache,
        }
    }

    /// Records a movement and applies its stock delta.
    ///
    /// Returns the ledger entry. On `PartialApply` the entry exists but
    /// the stock level was not updated.
    #[instrument(skip(self, request), fields(product = %request.product_id, kind = ?request.kind))]
    pub async fn apply_movement(
        &self,
        request: MovementRequest,
        operator: &Operator,
    ) -> EngineResult<StockMovement> {
        if operator.role != Role::Checker {
            return Err(EngineError::NotAuthorized {
                required: Role::Checker,
                actual: operator.role,
            });
        }

        validate_quantity(request.quantity).map_err(CoreError::from)?;

        let product = self
            .db
            .products()
            .get_by_id(&request.product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(request.product_id.clone()))?;

        let movement = StockMovement {
            id: Uuid::new_v4().to_string(),
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            kind: request.kind,
            quantity: request.quantity,
            reason: request.reason,
            operator_id: operator.id.clone(),
            operator_name: operator.name.clone(),
            timestamp: Utc::now(),
        };

        // Phase 1: the ledger row.
        self.db.movements().insert(&movement).await?;

        // Phase 2: the clamped level update.
        let delta = request.kind.signed_delta(request.quantity);
        let new_stock = self
            .db
            .products()
            .adjust_stock(&product.id, delta, Utc::now())
            .await
            .map_err(|_| EngineError::PartialApply {
                movement_id: movement.id.clone(),
            })?
            .ok_or_else(|| EngineError::PartialApply {
                movement_id: movement.id.clone(),
            })?;

        info!(
            movement_id = %movement.id,
            product = %movement.product_name,
            delta,
            new_stock,
            "Movement applied"
        );

        if let Err(e) = self.cache.refresh().await {
            tracing::warn!(error = %e, "Product cache refresh failed after movement");
        }

        let low_stock = (new_stock > 0 && new_stock <= product.min_stock).then(|| LowStockAlert {
            product_id: product.id.clone(),
            name: product.name.clone(),
            remaining: new_stock,
            min_stock: product.min_stock,
        });
        self.notifier.spawn_movement_fanout(movement.clone(), low_stock);

        Ok(movement)
    }

    /// The most recent ledger entries, newest first.
    pub async fn recent_movements(&self, limit: u32) -> EngineResult<Vec<StockMovement>> {
        Ok(self.db.movements().list_recent(limit).await?)
    }

    /// One product's ledger, newest first.
    pub async fn movements_for_product(
        &self,
        product_id: &str,
        limit: u32,
    ) -> EngineResult<Vec<StockMovement>> {
        Ok(self.db.movements().list_for_product(product_id, limit).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
