//! # sari-engine: Orchestration for Sari POS
//!
//! The engine wires the pure domain (sari-core) to the store (sari-db):
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Engine                                        │
//! │                                                                         │
//! │  SessionState     per-cashier cart + held transactions                  │
//! │       │ checkout                                                        │
//! │       ▼                                                                 │
//! │  CommitEngine     atomic sale commit (all-or-nothing stock take)        │
//! │       │ post-commit                                                     │
//! │       ├──► ProductCache       live catalog snapshots (watch channel)    │
//! │       └──► Notifier           persisted + broadcast notifications       │
//! │                                                                         │
//! │  Reconciler       manual stock movements, ledger-first                  │
//! │  Reports          on-demand summaries, owner-gated                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sari_db::{Database, DbConfig};
//! use sari_engine::{Engine, StoreConfig};
//!
//! let db = Database::new(DbConfig::new("./sari.db")).await?;
//! let engine = Engine::new(db, StoreConfig::new("Aling Nena's")).await?;
//!
//! let session = engine.new_session();
//! session.add_product(&product).await?;
//! let sale = session.checkout(engine.commits(), &operator, PaymentMethod::Cash).await?;
//! ```

use tracing_subscriber::EnvFilter;

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cache;
pub mod commit;
pub mod config;
pub mod error;
pub mod fanout;
pub mod reconcile;
pub mod reports;
pub mod session;

// =============================================================================
// Re-exports
// =============================================================================

pub use cache::ProductCache;
pub use commit::CommitEngine;
pub use config::StoreConfig;
pub use error::{EngineError, EngineResult};
pub use fanout::{LowStockAlert, NotificationFeed, Notifier};
pub use reconcile::{MovementRequest, Reconciler};
pub use reports::Reports;
pub use session::{CartTotals, SessionSnapshot, SessionState};

use sari_core::{Notification, Role};
use sari_db::Database;

// =============================================================================
// Engine Facade
// =============================================================================

/// Everything one store needs, built over one database handle.
#[derive(Debug, Clone)]
pub struct Engine {
    db: Database,
    config: StoreConfig,
    notifier: Notifier,
    cache: ProductCache,
    commits: CommitEngine,
    reconciler: Reconciler,
    reports: Reports,
}

impl Engine {
    /// Builds the engine: loads the initial catalog snapshot and wires
    /// the commit engine, reconciler, and reports to shared handles.
    pub async fn new(db: Database, config: StoreConfig) -> EngineResult<Self> {
        let notifier = Notifier::new(db.clone());
        let cache = ProductCache::new(db.clone()).await?;
        let commits = CommitEngine::new(
            db.clone(),
            config.clone(),
            notifier.clone(),
            cache.clone(),
        );
        let reconciler = Reconciler::new(db.clone(), notifier.clone(), cache.clone());
        let reports = Reports::new(db.clone());

        Ok(Engine {
            db,
            config,
            notifier,
            cache,
            commits,
            reconciler,
            reports,
        })
    }

    /// The store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The underlying database handle.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Creates a fresh cashier session.
    pub fn new_session(&self) -> SessionState {
        SessionState::new()
    }

    /// The commit engine.
    pub fn commits(&self) -> &CommitEngine {
        &self.commits
    }

    /// The movement reconciler.
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// The report surface.
    pub fn reports(&self) -> &Reports {
        &self.reports
    }

    /// The live product cache.
    pub fn products(&self) -> &ProductCache {
        &self.cache
    }

    /// The live notification feed.
    pub fn feed(&self) -> &NotificationFeed {
        self.notifier.feed()
    }

    /// Persisted notifications for a role, newest first.
    pub async fn notifications(&self, role: Role) -> EngineResult<Vec<Notification>> {
        Ok(self
            .db
            .notifications()
            .list_for_role(role, self.config.notification_limit)
            .await?)
    }

    /// Marks a notification read. Returns false for unknown or
    /// already-read notifications.
    pub async fn mark_notification_read(&self, id: &str) -> EngineResult<bool> {
        Ok(self.db.notifications().mark_read(id).await?)
    }

    /// Unread notification count for a role's badge.
    pub async fn unread_count(&self, role: Role) -> EngineResult<i64> {
        Ok(self.db.notifications().unread_count_for_role(role).await?)
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=sari=trace` - Show trace for sari crates only
/// - Default: INFO level, sqlx noise suppressed
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sari=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

// =============================================================================
// Integration Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sari_core::{MovementKind, Operator, PaymentMethod, Product};
    use sari_db::DbConfig;
    use uuid::Uuid;

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

    fn op(id: &str, name: &str, role: Role) -> Operator {
        Operator {
            id: id.to_string(),
            name: name.to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_full_sale_cycle() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let engine = Engine::new(db.clone(), StoreConfig::default()).await.unwrap();

        let p = product("Pancit Canton", 1550, 24, 5);
        db.products().insert(&p).await.unwrap();
        engine.products().refresh().await.unwrap();

        // Cashier rings up two units and checks out.
        let cashier = op("c1", "Ana", Role::Cashier);
        let session = engine.new_session();
        session.add_product(&p).await.unwrap();
        session.add_product(&p).await.unwrap();

        let sale = session
            .checkout(engine.commits(), &cashier, PaymentMethod::Cash)
            .await
            .unwrap();
        assert_eq!(sale.subtotal_cents, 3100);

        // Stock moved and the cache sees it.
        let cached = engine.products().get(&p.id).unwrap();
        assert_eq!(cached.current_stock, 22);

        // Owner sees it in the rollups.
        let owner = op("o1", "Aling Nena", Role::Owner);
        let rollups = engine.reports().rollups(&owner, Utc::now()).await.unwrap();
        assert_eq!(rollups.today.sales_cents, 3100);
        assert_eq!(rollups.today.transactions, 1);
    }

    #[tokio::test]
    async fn test_movement_then_commit_shares_one_stock_truth() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let engine = Engine::new(db.clone(), StoreConfig::default()).await.unwrap();

        let p = product("Sardines", 2500, 1, 0);
        db.products().insert(&p).await.unwrap();

        // Checker receives a delivery of 9.
        let checker = op("k1", "Maria", Role::Checker);
        engine
            .reconciler()
            .apply_movement(
                MovementRequest {
                    product_id: p.id.clone(),
                    kind: MovementKind::In,
                    quantity: 9,
                    reason: Some("delivery".to_string()),
                },
                &checker,
            )
            .await
            .unwrap();

        // Cashier can now sell 10. The cart must see the refreshed stock.
        let live = engine.products().get(&p.id).unwrap();
        assert_eq!(live.current_stock, 10);

        let session = engine.new_session();
        session.add_product(&live).await.unwrap();
        for _ in 0..9 {
            session.add_product(&live).await.unwrap();
        }

        let cashier = op("c1", "Ana", Role::Cashier);
        let sale = session
            .checkout(engine.commits(), &cashier, PaymentMethod::Cash)
            .await
            .unwrap();
        assert_eq!(sale.lines[0].quantity, 10);

        let after = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(after.current_stock, 0);
    }

    #[tokio::test]
    async fn test_notification_lifecycle_through_facade() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let engine = Engine::new(db.clone(), StoreConfig::default()).await.unwrap();

        let p = product("Coke Sakto", 1500, 24, 5);
        db.products().insert(&p).await.unwrap();

        let session = engine.new_session();
        session.add_product(&p).await.unwrap();
        session
            .checkout(
                engine.commits(),
                &op("c1", "Ana", Role::Cashier),
                PaymentMethod::Cash,
            )
            .await
            .unwrap();

        // Fanout is spawned; poll for the owner's sale alert.
        let mut owner_feed = Vec::new();
        for _ in 0..50 {
            owner_feed = engine.notifications(Role::Owner).await.unwrap();
            if !owner_feed.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(owner_feed.len(), 1);
        assert_eq!(engine.unread_count(Role::Owner).await.unwrap(), 1);

        assert!(engine
            .mark_notification_read(&owner_feed[0].id)
            .await
            .unwrap());
        assert_eq!(engine.unread_count(Role::Owner).await.unwrap(), 0);
    }
}
