//! # Cashier Session State
//!
//! Shared async wrapper around the pure [`CartSession`]: one per signed-in
//! cashier. All cart math lives in sari-core; this module only guards the
//! state behind a lock and wires checkout into the commit engine.
//!
//! On a failed checkout the taken cart is restored untouched, so the
//! cashier can retry or edit instead of re-ringing every item.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::commit::CommitEngine;
use crate::error::EngineResult;
use sari_core::money::TaxRate;
use sari_core::{Cart, CartSession, Money, Operator, PaymentMethod, Product, SaleRecord};

/// Display totals for the active cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

/// A point-in-time view of the session for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub active: Cart,
    pub held_count: usize,
    pub totals: CartTotals,
}

/// Lock-guarded cart session, cheap to clone and share.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    inner: Arc<Mutex<CartSession>>,
}

impl SessionState {
    /// Creates an empty session.
    pub fn new() -> Self {
        SessionState {
            inner: Arc::new(Mutex::new(CartSession::new())),
        }
    }

    /// Adds one unit of a product to the active cart.
    pub async fn add_product(&self, product: &Product) -> EngineResult<()> {
        let mut session = self.inner.lock().await;
        session.active_mut().add_line(product)?;
        Ok(())
    }

    /// Adjusts a line's quantity by a signed delta; at or below zero the
    /// line is removed.
    pub async fn adjust_quantity(&self, product: &Product, delta: i64) -> EngineResult<()> {
        let mut session = self.inner.lock().await;
        session.active_mut().adjust_quantity(product, delta)?;
        Ok(())
    }

    /// Removes a line by product id.
    pub async fn remove_line(&self, product_id: &str) -> EngineResult<()> {
        let mut session = self.inner.lock().await;
        session.active_mut().remove_line(product_id)?;
        Ok(())
    }

    /// Discards the active cart. Held carts are untouched.
    pub async fn clear(&self) {
        self.inner.lock().await.clear();
    }

    /// Suspends the active cart onto the held list.
    pub async fn hold(&self) {
        self.inner.lock().await.hold();
    }

    /// Resumes the held cart at `index`.
    pub async fn resume(&self, index: usize) -> EngineResult<()> {
        self.inner.lock().await.resume(index)?;
        Ok(())
    }

    /// A snapshot of the session with totals at the given tax rate.
    pub async fn snapshot(&self, tax_rate: TaxRate) -> SessionSnapshot {
        let session = self.inner.lock().await;
        let subtotal = session.active().subtotal();
        SessionSnapshot {
            active: session.active().clone(),
            held_count: session.held().len(),
            totals: totals(subtotal, tax_rate),
        }
    }

    /// Commits the active cart through the engine.
    ///
    /// The cart is taken before the commit and restored verbatim if the
    /// commit fails for any reason.
    pub async fn checkout(
        &self,
        engine: &CommitEngine,
        operator: &Operator,
        payment_method: PaymentMethod,
    ) -> EngineResult<SaleRecord> {
        // Hold the lock across the commit: the cashier must not mutate a
        // cart that is mid-commit.
        let mut session = self.inner.lock().await;
        let cart = session.take_active();

        match engine.commit(cart.clone(), operator, payment_method).await {
            Ok(sale) => Ok(sale),
            Err(e) => {
                session.restore(cart);
                Err(e)
            }
        }
    }
}

fn totals(subtotal: Money, tax_rate: TaxRate) -> CartTotals {
    let tax = subtotal.calculate_tax(tax_rate);
    CartTotals {
        subtotal_cents: subtotal.centavos(),
        tax_cents: tax.centavos(),
        total_cents: (subtotal + tax).centavos(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ProductCache;
    use crate::config::StoreConfig;
    use crate::fanout::Notifier;
    use chrono::Utc;
    use sari_core::Role;
    use sari_db::{Database, DbConfig};
    use uuid::Uuid;

    fn product(name: &str, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            price_cents,
            current_stock: stock,
            min_stock: 2,
            barcode: None,
            category: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn cashier() -> Operator {
        Operator {
            id: "c1".to_string(),
            name: "Ana".to_string(),
            role: Role::Cashier,
        }
    }

    #[tokio::test]
    async fn test_snapshot_totals_apply_vat_at_display() {
        let session = SessionState::new();
        let p = product("Pancit Canton", 5000, 10);
        session.add_product(&p).await.unwrap();

        let snap = session.snapshot(TaxRate::from_bps(1200)).await;
        assert_eq!(snap.totals.subtotal_cents, 5000);
        assert_eq!(snap.totals.tax_cents, 600);
        assert_eq!(snap.totals.total_cents, 5600);
        assert_eq!(snap.held_count, 0);
    }

    #[tokio::test]
    async fn test_checkout_clears_cart_on_success() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let p = product("Coke Sakto", 1500, 24);
        db.products().insert(&p).await.unwrap();

        let notifier = Notifier::new(db.clone());
        let cache = ProductCache::new(db.clone()).await.unwrap();
        let engine = CommitEngine::new(db.clone(), StoreConfig::default(), notifier, cache);

        let session = SessionState::new();
        session.add_product(&p).await.unwrap();

        let sale = session
            .checkout(&engine, &cashier(), PaymentMethod::Cash)
            .await
            .unwrap();
        assert_eq!(sale.subtotal_cents, 1500);

        let snap = session.snapshot(TaxRate::from_bps(1200)).await;
        assert!(snap.active.is_empty());
    }

    #[tokio::test]
    async fn test_checkout_failure_restores_cart() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let p = product("Eggs", 900, 3);
        db.products().insert(&p).await.unwrap();

        let notifier = Notifier::new(db.clone());
        let cache = ProductCache::new(db.clone()).await.unwrap();
        let engine = CommitEngine::new(db.clone(), StoreConfig::default(), notifier, cache);

        let session = SessionState::new();
        session.add_product(&p).await.unwrap();

        // Stock shrinks behind the cart's back.
        let mut tx = db.pool().begin().await.unwrap();
        db.products()
            .decrement_stock(&mut *tx, &p.id, 3, Utc::now())
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let err = session
            .checkout(&engine, &cashier(), PaymentMethod::Cash)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::EngineError::Core(_)));

        // Cart is intact for the cashier to edit.
        let snap = session.snapshot(TaxRate::from_bps(1200)).await;
        assert_eq!(snap.active.total_quantity(), 1);
    }

    #[tokio::test]
    async fn test_hold_and_resume_through_state() {
        let session = SessionState::new();
        let p = product("Milo", 1500, 10);

        session.add_product(&p).await.unwrap();
        session.hold().await;

        let snap = session.snapshot(TaxRate::zero()).await;
        assert!(snap.active.is_empty());
        assert_eq!(snap.held_count, 1);

        session.resume(0).await.unwrap();
        let snap = session.snapshot(TaxRate::zero()).await;
        assert_eq!(snap.active.total_quantity(), 1);
        assert_eq!(snap.held_count, 0);
    }
}
