//! # Notification Fanout
//!
//! Post-commit notification delivery.
//!
//! ## Delivery Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Commit → Fanout Sequence                              │
//! │                                                                         │
//! │  commit() transaction COMMITS  ← sale is durable from here              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  tokio::spawn(deliver_sale)    ← fire and forget                        │
//! │       ├── sale alert      → owner                                       │
//! │       ├── stock update    → checker                                     │
//! │       └── low-stock alert → owner + checker   (only if any line         │
//! │       │                                        crossed its threshold)   │
//! │       ▼                                                                 │
//! │  Each notification: INSERT row, then broadcast to live subscribers.     │
//! │  A delivery failure is logged and swallowed; it never unwinds the       │
//! │  committed sale.                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The reconciler path mirrors it: an applied movement spawns a stock
//! update to owner + cashier, plus the shared low-stock alert when the
//! movement crossed a threshold.

use chrono::Utc;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, warn};
use uuid::Uuid;

use sari_core::money::TaxRate;
use sari_core::{Money, Notification, NotificationKind, Role, SaleRecord, StockMovement};
use sari_db::Database;

/// Broadcast capacity; slow subscribers lose oldest items, the
/// persisted rows remain the source of truth.
const FEED_CAPACITY: usize = 256;

/// A product that crossed its low-stock threshold during a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowStockAlert {
    pub product_id: String,
    pub name: String,
    pub remaining: i64,
    pub min_stock: i64,
}

// =============================================================================
// Live Feed
// =============================================================================

/// Live notification feed on a tokio broadcast channel.
///
/// Subscribing returns a stream pre-filtered to one role; dropping the
/// stream unsubscribes.
#[derive(Debug, Clone)]
pub struct NotificationFeed {
    tx: broadcast::Sender<Notification>,
}

impl Default for NotificationFeed {
    fn default() -> Self {
        NotificationFeed::new()
    }
}

impl NotificationFeed {
    /// Creates an empty feed.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        NotificationFeed { tx }
    }

    /// Subscribes to notifications targeted at `role`.
    pub fn subscribe(&self, role: Role) -> impl Stream<Item = Notification> {
        BroadcastStream::new(self.tx.subscribe()).filter_map(move |item| match item {
            Ok(n) if n.targets(role) => Some(n),
            // Lagged subscribers skip; missed items live in the database.
            _ => None,
        })
    }

    /// Publishes to live subscribers. Send errors just mean nobody is
    /// listening right now.
    fn publish(&self, notification: &Notification) {
        let _ = self.tx.send(notification.clone());
    }
}

// =============================================================================
// Notifier
// =============================================================================

/// Persists notifications and pushes them to the live feed.
#[derive(Debug, Clone)]
pub struct Notifier {
    db: Database,
    feed: NotificationFeed,
}

impl Notifier {
    /// Creates a notifier over the given database.
    pub fn new(db: Database) -> Self {
        Notifier {
            db,
            feed: NotificationFeed::new(),
        }
    }

    /// The live feed for subscriptions.
    pub fn feed(&self) -> &NotificationFeed {
        &self.feed
    }

    /// Spawns post-commit fanout for a committed sale. Never blocks the
    /// caller and never reports failure to it; the sale is already durable.
    pub fn spawn_sale_fanout(
        &self,
        sale: SaleRecord,
        low_stock: Vec<LowStockAlert>,
        tax_rate: TaxRate,
    ) {
        let notifier = self.clone();
        tokio::spawn(async move {
            notifier.deliver_sale(&sale, &low_stock, tax_rate).await;
        });
    }

    /// Delivers the full post-commit notification set.
    pub(crate) async fn deliver_sale(
        &self,
        sale: &SaleRecord,
        low_stock: &[LowStockAlert],
        tax_rate: TaxRate,
    ) {
        let total = Money::from_centavos(sale.subtotal_cents).with_tax(tax_rate);

        self.deliver(Notification {
            id: Uuid::new_v4().to_string(),
            kind: NotificationKind::Sales,
            title: "Sale Completed".to_string(),
            message: format!("New sale of {} by {}", total, sale.operator_name),
            is_read: false,
            created_at: Utc::now(),
            user_id: None,
            target_roles: vec![Role::Owner],
        })
        .await;

        self.deliver(Notification {
            id: Uuid::new_v4().to_string(),
            kind: NotificationKind::StockUpdate,
            title: "Stock Updated".to_string(),
            message: format!("Stock levels updated after sale by {}", sale.operator_name),
            is_read: false,
            created_at: Utc::now(),
            user_id: None,
            target_roles: vec![Role::Checker],
        })
        .await;

        if !low_stock.is_empty() {
            self.deliver(low_stock_notification(low_stock)).await;
        }

        debug!(sale_id = %sale.id, low_stock = low_stock.len(), "Sale fanout delivered");
    }

    /// Spawns post-movement fanout for an applied stock adjustment.
    pub fn spawn_movement_fanout(
        &self,
        movement: StockMovement,
        low_stock: Option<LowStockAlert>,
    ) {
        let notifier = self.clone();
        tokio::spawn(async move {
            notifier.deliver_movement(&movement, low_stock.as_slice()).await;
        });
    }

    /// Delivers the post-movement notification set: a stock update to
    /// owner and cashier, plus a low-stock alert if the movement crossed
    /// the threshold.
    pub(crate) async fn deliver_movement(
        &self,
        movement: &StockMovement,
        low_stock: &[LowStockAlert],
    ) {
        let direction = if movement.kind.is_inbound() {
            "Received"
        } else {
            "Removed"
        };

        self.deliver(Notification {
            id: Uuid::new_v4().to_string(),
            kind: NotificationKind::StockUpdate,
            title: "Stock Updated".to_string(),
            message: format!(
                "{} {} × {} by {}",
                direction, movement.quantity, movement.product_name, movement.operator_name
            ),
            is_read: false,
            created_at: Utc::now(),
            user_id: None,
            target_roles: vec![Role::Owner, Role::Cashier],
        })
        .await;

        if !low_stock.is_empty() {
            self.deliver(low_stock_notification(low_stock)).await;
        }

        debug!(movement_id = %movement.id, "Movement fanout delivered");
    }

    /// Persists one notification, then pushes it to the live feed.
    /// Failures are logged, never propagated.
    async fn deliver(&self, notification: Notification) {
        if let Err(e) = self.db.notifications().insert(&notification).await {
            warn!(
                kind = ?notification.kind,
                error = %e,
                "Failed to persist notification"
            );
            return;
        }
        self.feed.publish(&notification);
    }
}

/// Builds the shared low-stock alert for owner and checker.
fn low_stock_notification(alerts: &[LowStockAlert]) -> Notification {
    let listing = alerts
        .iter()
        .map(|a| format!("{} ({} left)", a.name, a.remaining))
        .collect::<Vec<_>>()
        .join(", ");

    Notification {
        id: Uuid::new_v4().to_string(),
        kind: NotificationKind::LowStock,
        title: "Low Stock Alert".to_string(),
        message: format!("Low stock: {}", listing),
        is_read: false,
        created_at: Utc::now(),
        user_id: None,
        target_roles: vec![Role::Owner, Role::Checker],
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
