//! # Sale Commit Engine
//!
//! Turns a cart into a durable sale record and takes its stock, all or
//! nothing.
//!
//! ## Commit Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Atomic Commit                                       │
//! │                                                                         │
//! │  BEGIN TRANSACTION                                                      │
//! │    INSERT sale + lines          ← first statement is a write, so the    │
//! │    │                              transaction holds the write lock      │
//! │    │                              from the start                        │
//! │    ▼                                                                    │
//! │    for each line:                                                       │
//! │      guarded decrement          ← UPDATE ... WHERE stock >= qty         │
//! │      │                            RETURNING new stock                   │
//! │      ├── applied → note low-stock crossing                              │
//! │      └── miss    → ROLLBACK, typed error, nothing changed               │
//! │  COMMIT                                                                 │
//! │    │                                                                    │
//! │    ├── refresh product cache                                            │
//! │    └── spawn notification fanout (fire and forget)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two registers committing the last unit of the same product race on the
//! guarded UPDATE; SQLite serializes the writes and exactly one guard
//! matches. The loser's whole sale rolls back.

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::cache::ProductCache;
use crate::config::StoreConfig;
use crate::error::{EngineError, EngineResult};
use crate::fanout::{LowStockAlert, Notifier};
use sari_core::{
    Cart, CoreError, Operator, PaymentMethod, Role, SaleRecord, SaleStatus,
};
use sari_db::repository::product::StockDecrement;
use sari_db::Database;

/// Commits carts as durable sales.
#[derive(Debug, Clone)]
pub struct CommitEngine {
    db: Database,
    config: StoreConfig,
    notifier: Notifier,
    cache: ProductCache,
}

impl CommitEngine {
    /// Creates a commit engine over shared handles.
    pub fn new(
        db: Database,
        config: StoreConfig,
        notifier: Notifier,
        cache: ProductCache,
    ) -> Self {
        CommitEngine {
            db,
            config,
            notifier,
            cache,
        }
    }

    /// Commits a cart as a completed sale.
    ///
    /// On success every line's stock is decremented and the sale record
    /// (with frozen names and prices) is durable. On any failure the
    /// store is untouched: no sale row, no partial decrements.
    ///
    /// Post-commit side effects (cache refresh, notification fanout) are
    /// best-effort and never fail the sale.
    #[instrument(skip(self, cart), fields(operator = %operator.name, lines = cart.line_count()))]
    pub async fn commit(
        &self,
        cart: Cart,
        operator: &Operator,
        payment_method: PaymentMethod,
    ) -> EngineResult<SaleRecord> {
        if operator.role != Role::Cashier {
            return Err(EngineError::NotAuthorized {
                required: Role::Cashier,
                actual: operator.role,
            });
        }

        if cart.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        let now = Utc::now();
        let sale = SaleRecord {
            id: Uuid::new_v4().to_string(),
            subtotal_cents: cart.subtotal().centavos(),
            lines: cart.lines,
            operator_id: operator.id.clone(),
            operator_name: operator.name.clone(),
            timestamp: now,
            payment_method,
            status: SaleStatus::Completed,
        };

        let products = self.db.products();
        let mut tx = self.db.pool().begin().await.map_err(sari_db::DbError::from)?;

        self.db.sales().insert_in_tx(&mut *tx, &sale).await?;

        let mut low_stock = Vec::new();
        for line in &sale.lines {
            let outcome = products
                .decrement_stock(&mut *tx, &line.product_id, line.quantity, now)
                .await?;

            match outcome {
                StockDecrement::Applied {
                    name,
                    new_stock,
                    min_stock,
                } => {
                    // Exactly zero is out-of-stock, not low-stock.
                    if new_stock > 0 && new_stock <= min_stock {
                        low_stock.push(LowStockAlert {
                            product_id: line.product_id.clone(),
                            name,
                            remaining: new_stock,
                            min_stock,
                        });
                    }
                }
                StockDecrement::NotFound => {
                    tx.rollback().await.map_err(sari_db::DbError::from)?;
                    return Err(CoreError::ProductNotFound(line.product_id.clone()).into());
                }
                StockDecrement::Insufficient { name, available } => {
                    tx.rollback().await.map_err(sari_db::DbError::from)?;
                    return Err(CoreError::InsufficientStock {
                        name,
                        available,
                        requested: line.quantity,
                    }
                    .into());
                }
            }
        }

        tx.commit().await.map_err(sari_db::DbError::from)?;

        info!(
            sale_id = %sale.id,
            subtotal_cents = sale.subtotal_cents,
            low_stock = low_stock.len(),
            "Sale committed"
        );

        if let Err(e) = self.cache.refresh().await {
            warn!(error = %e, "Product cache refresh failed after commit");
        }

        self.notifier
            .spawn_sale_fanout(sale.clone(), low_stock, self.config.tax_rate());

        Ok(sale)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sari_core::{NotificationKind, Product};
    use sari_db::DbConfig;

    fn product(name: &str, price_cents: i64, stock: i64, min_stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            price_cents,
            current_stock: stock,
            min_stock,
            barcode: None,
            category: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn operator(role: Role) -> Operator {
        Operator {
            id: "op1".to_string(),
            name: "Ana".to_string(),
            role,
        }
    }

    async fn engine() -> (Database, CommitEngine) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let notifier = Notifier::new(db.clone());
        let cache = ProductCache::new(db.clone()).await.unwrap();
        let engine = CommitEngine::new(db.clone(), StoreConfig::default(), notifier, cache);
        (db, engine)
    }

    #[tokio::test]
    async fn test_commit_decrements_stock_and_freezes_lines() {
        let (db, engine) = engine().await;

        let p = product("Pancit Canton", 1550, 24, 5);
        db.products().insert(&p).await.unwrap();

        let mut cart = Cart::new();
        cart.add_line(&p).unwrap();
        cart.adjust_quantity(&p, 2).unwrap();

        let sale = engine
            .commit(cart, &operator(Role::Cashier), PaymentMethod::Cash)
            .await
            .unwrap();

        assert_eq!(sale.subtotal_cents, 3 * 1550);
        assert_eq!(sale.lines.len(), 1);
        assert_eq!(sale.lines[0].name, "Pancit Canton");
        assert_eq!(sale.status, SaleStatus::Completed);

        let stock = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(stock.current_stock, 21);

        // Sale is durable and re-loadable with lines.
        let loaded = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(loaded.lines[0].unit_price_cents, 1550);
    }

    #[tokio::test]
    async fn test_commit_is_all_or_nothing() {
        let (db, engine) = engine().await;

        let plenty = product("Coke Sakto", 1500, 50, 5);
        let scarce = product("Eggs", 900, 2, 1);
        db.products().insert(&plenty).await.unwrap();
        db.products().insert(&scarce).await.unwrap();

        let mut cart = Cart::new();
        cart.add_line(&plenty).unwrap();
        // Bypass cart-side stock checks to exercise the store-side guard:
        // the cart was built against a stale snapshot.
        cart.lines.push(sari_core::CartLine {
            product_id: scarce.id.clone(),
            name: scarce.name.clone(),
            unit_price_cents: scarce.price_cents,
            quantity: 5,
        });

        let err = engine
            .commit(cart, &operator(Role::Cashier), PaymentMethod::Cash)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InsufficientStock { available: 2, requested: 5, .. })
        ));

        // Nothing changed: no sale row, both stocks untouched.
        assert_eq!(db.sales().count().await.unwrap(), 0);
        let p = db.products().get_by_id(&plenty.id).await.unwrap().unwrap();
        assert_eq!(p.current_stock, 50);
        let s = db.products().get_by_id(&scarce.id).await.unwrap().unwrap();
        assert_eq!(s.current_stock, 2);
    }

    #[tokio::test]
    async fn test_commit_empty_cart_rejected() {
        let (_db, engine) = engine().await;

        let err = engine
            .commit(Cart::new(), &operator(Role::Cashier), PaymentMethod::Cash)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_commit_requires_cashier_role_exactly() {
        let (db, engine) = engine().await;

        let p = product("Milo", 1500, 10, 2);
        db.products().insert(&p).await.unwrap();

        // Checkout belongs to the cashier workflow alone; checkers and
        // owners are both turned away.
        for role in [Role::Checker, Role::Owner] {
            let mut cart = Cart::new();
            cart.add_line(&p).unwrap();

            let err = engine
                .commit(cart, &operator(role), PaymentMethod::Cash)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                EngineError::NotAuthorized {
                    required: Role::Cashier,
                    ..
                }
            ));
        }

        // No sale row, stock untouched.
        assert_eq!(db.sales().count().await.unwrap(), 0);
        let s = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(s.current_stock, 10);
    }

    #[tokio::test]
    async fn test_commit_missing_product_rolls_back() {
        let (db, engine) = engine().await;

        let mut cart = Cart::new();
        cart.lines.push(sari_core::CartLine {
            product_id: "ghost".to_string(),
            name: "Ghost".to_string(),
            unit_price_cents: 100,
            quantity: 1,
        });

        let err = engine
            .commit(cart, &operator(Role::Cashier), PaymentMethod::Cash)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::ProductNotFound(id)) if id == "ghost"
        ));
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_low_stock_flagged_but_zero_is_not() {
        let (db, engine) = engine().await;

        // 5 on hand, threshold 3: selling 2 leaves 3 → low stock.
        let crossing = product("Sardines", 2500, 5, 3);
        // 2 on hand, threshold 2: selling 2 leaves 0 → out of stock, not low.
        let emptied = product("Tide Bar", 1800, 2, 2);
        db.products().insert(&crossing).await.unwrap();
        db.products().insert(&emptied).await.unwrap();

        let mut cart = Cart::new();
        cart.add_line(&crossing).unwrap();
        cart.adjust_quantity(&crossing, 1).unwrap();
        cart.add_line(&emptied).unwrap();
        cart.adjust_quantity(&emptied, 1).unwrap();

        let sale = engine
            .commit(cart, &operator(Role::Cashier), PaymentMethod::Cash)
            .await
            .unwrap();

        // Run the fanout inline to observe its output deterministically.
        // (spawn_sale_fanout already ran; wait for its rows.)
        let mut low = Vec::new();
        for _ in 0..50 {
            low = db
                .notifications()
                .list_for_role(Role::Owner, 10)
                .await
                .unwrap()
                .into_iter()
                .filter(|n| n.kind == NotificationKind::LowStock)
                .collect();
            if !low.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        assert_eq!(low.len(), 1);
        assert!(low[0].message.contains("Sardines (3 left)"));
        assert!(!low[0].message.contains("Tide Bar"));
        assert_eq!(sale.subtotal_cents, 2 * 2500 + 2 * 1800);
    }

    #[tokio::test]
    async fn test_depletion_sequence_to_zero() {
        let (db, engine) = engine().await;

        let p = product("Sardines", 2500, 5, 3);
        db.products().insert(&p).await.unwrap();
        let cashier = operator(Role::Cashier);

        // Sell 2: 5 → 3, inside the low band.
        let mut cart = Cart::new();
        cart.add_line(&p).unwrap();
        cart.adjust_quantity(&p, 1).unwrap();
        engine.commit(cart, &cashier, PaymentMethod::Cash).await.unwrap();
        let live = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(live.current_stock, 3);
        assert!(live.is_low_stock());

        // Sell 3: 3 → 0, out of stock but never negative.
        let mut cart = Cart::new();
        cart.add_line(&live).unwrap();
        cart.adjust_quantity(&live, 2).unwrap();
        engine.commit(cart, &cashier, PaymentMethod::Cash).await.unwrap();
        let live = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(live.current_stock, 0);
        assert!(!live.is_low_stock());

        // Sell 1 more: rejected, stock stays 0.
        let mut cart = Cart::new();
        cart.lines.push(sari_core::CartLine::from_product(&live, 1));
        let err = engine
            .commit(cart, &cashier, PaymentMethod::Cash)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InsufficientStock { available: 0, .. })
        ));
        let live = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(live.current_stock, 0);
        assert_eq!(db.sales().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_commits_for_last_unit() {
        let (db, engine) = engine().await;

        let p = product("Last Coke", 2000, 1, 0);
        db.products().insert(&p).await.unwrap();

        let mut cart_a = Cart::new();
        cart_a.add_line(&p).unwrap();
        let mut cart_b = Cart::new();
        cart_b.add_line(&p).unwrap();

        let engine_a = engine.clone();
        let engine_b = engine.clone();
        let op = operator(Role::Cashier);
        let op_b = op.clone();

        let (a, b) = tokio::join!(
            engine_a.commit(cart_a, &op, PaymentMethod::Cash),
            engine_b.commit(cart_b, &op_b, PaymentMethod::Cash),
        );

        // Exactly one wins; the loser gets a typed insufficient-stock error.
        let results = [a, b];
        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1);
        let loss = results.iter().find(|r| r.is_err()).unwrap();
        assert!(matches!(
            loss.as_ref().unwrap_err(),
            EngineError::Core(CoreError::InsufficientStock { available: 0, .. })
        ));

        let stock = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(stock.current_stock, 0);
        assert_eq!(db.sales().count().await.unwrap(), 1);
    }
}
