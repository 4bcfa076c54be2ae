//! # Live Product Cache
//!
//! An in-memory snapshot of the catalog on a tokio watch channel.
//!
//! The commit engine and reconciler refresh the cache after every stock
//! write, so UI-side subscribers always render current stock without
//! polling. Dropping a receiver unsubscribes; the channel always holds
//! the latest snapshot for new subscribers.

use tokio::sync::watch;
use tracing::debug;

use crate::error::EngineResult;
use sari_core::Product;
use sari_db::Database;

/// Catalog snapshots are whole-catalog; a sari-sari store carries a few
/// hundred products at most.
const CATALOG_LIMIT: u32 = 10_000;

/// Shared, refreshable snapshot of the product catalog.
#[derive(Debug, Clone)]
pub struct ProductCache {
    db: Database,
    tx: watch::Sender<Vec<Product>>,
}

impl ProductCache {
    /// Loads the initial snapshot and creates the cache.
    pub async fn new(db: Database) -> EngineResult<Self> {
        let initial = db.products().list(CATALOG_LIMIT).await?;
        let (tx, _) = watch::channel(initial);
        Ok(ProductCache { db, tx })
    }

    /// Subscribes to catalog snapshots. The receiver immediately holds
    /// the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Product>> {
        self.tx.subscribe()
    }

    /// The current snapshot.
    pub fn current(&self) -> Vec<Product> {
        self.tx.borrow().clone()
    }

    /// Reloads the snapshot from the database and publishes it.
    pub async fn refresh(&self) -> EngineResult<()> {
        let products = self.db.products().list(CATALOG_LIMIT).await?;
        debug!(count = products.len(), "Product cache refreshed");
        self.tx.send_replace(products);
        Ok(())
    }

    /// Looks a product up in the current snapshot.
    pub fn get(&self, product_id: &str) -> Option<Product> {
        self.tx.borrow().iter().find(|p| p.id == product_id).cloned()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
