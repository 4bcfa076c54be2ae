//! # Domain Types
//!
//! Core domain types used throughout Sari POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   SaleRecord    │   │  StockMovement  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  price_cents    │   │  lines          │   │  kind (signed)  │       │
//! │  │  current_stock  │   │  subtotal_cents │   │  quantity       │       │
//! │  │  min_stock      │   │  status         │   │  reason         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Operator     │   │  Notification   │   │    CartLine     │       │
//! │  │  id/name/role   │   │  target_roles   │   │  price snapshot │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Product stock is mutated only by the commit engine and the reconciler;
//! SaleRecord and StockMovement are immutable once written; Notification
//! permits exactly one field transition (`is_read: false → true`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Roles & Operators
// =============================================================================

/// Store roles. Each workflow is gated on one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Store owner: reporting, full notification feed.
    Owner,
    /// Cashier: checkout, commits sales.
    Cashier,
    /// Stock checker: manual stock movements.
    Checker,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Owner => write!(f, "owner"),
            Role::Cashier => write!(f, "cashier"),
            Role::Checker => write!(f, "checker"),
        }
    }
}

/// The active session's operator, resolved by the external auth
/// collaborator. The engine only ever sees an already-authenticated
/// operator and enforces the role itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operator {
    pub id: String,
    pub name: String,
    pub role: Role,
}

impl Operator {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Operator {
            id: id.into(),
            name: name.into(),
            role,
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// Owned by the inventory store; `current_stock` is clamped at zero after
/// any mutation and is never written directly by the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to cashier and on receipts.
    pub name: String,

    /// Unit price in centavos (smallest currency unit).
    pub price_cents: i64,

    /// Current stock level. Invariant: never negative.
    pub current_stock: i64,

    /// Low-stock threshold. `0 < current_stock <= min_stock` is "low".
    pub min_stock: i64,

    /// Barcode (EAN-13, UPC-A, etc.).
    pub barcode: Option<String>,

    /// Optional category for browsing.
    pub category: Option<String>,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_centavos(self.price_cents)
    }

    /// Checks whether this product is in the low-stock band.
    ///
    /// The boundary is deliberate: a product driven to exactly zero is
    /// out of stock, not "low", and is not flagged by this check.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.current_stock > 0 && self.current_stock <= self.min_stock
    }

    /// Checks whether this product is out of stock.
    #[inline]
    pub fn is_out_of_stock(&self) -> bool {
        self.current_stock <= 0
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// A line item: a value snapshot of a product at add-time plus a quantity.
///
/// Name and unit price are frozen here so the cart (and later the sale
/// record) stays consistent even if the product is edited concurrently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product ID (UUID v4).
    pub product_id: String,

    /// Product name at time of adding (frozen).
    pub name: String,

    /// Unit price in centavos at time of adding (frozen).
    pub unit_price_cents: i64,

    /// Quantity. Invariant: always > 0 while the line exists.
    pub quantity: i64,
}

impl CartLine {
    /// Creates a line from a product snapshot with an initial quantity.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            quantity,
        }
    }

    /// Unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_centavos(self.unit_price_cents)
    }

    /// Line total (unit price × quantity), pre-tax.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// The status of a sale record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    /// Committed and permanent.
    Completed,
    /// Suspended at the register (held carts are session state; the
    /// status exists for records imported from other terminals).
    Held,
    /// Cancelled before completion.
    Cancelled,
}

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
}

/// A committed sale. Created exactly once per committed cart, immutable
/// thereafter.
///
/// `subtotal_cents` is pre-tax; the payable total is derived via
/// [`Money::with_tax`] at display time and never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub id: String,
    /// Line snapshots consumed from the cart.
    pub lines: Vec<CartLine>,
    /// Pre-tax total in centavos.
    pub subtotal_cents: i64,
    pub operator_id: String,
    pub operator_name: String,
    pub timestamp: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
}

impl SaleRecord {
    /// Pre-tax subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_centavos(self.subtotal_cents)
    }

    /// Total payable including tax at the given rate.
    #[inline]
    pub fn total_with_tax(&self, rate: crate::money::TaxRate) -> Money {
        self.subtotal().with_tax(rate)
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// Kind of a manual stock movement. Each kind maps to exactly one signed
/// delta against the product's stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Receiving stock: +quantity.
    In,
    /// Issuing stock out: -quantity.
    Out,
    /// Damaged goods written off: -quantity.
    Damaged,
    /// Customer returns sent back to supplier: -quantity.
    Returned,
}

impl MovementKind {
    /// The signed stock delta this kind applies for a given quantity.
    #[inline]
    pub fn signed_delta(&self, quantity: i64) -> i64 {
        match self {
            MovementKind::In => quantity,
            MovementKind::Out | MovementKind::Damaged | MovementKind::Returned => -quantity,
        }
    }

    /// Whether this kind increases stock (used in notification wording).
    #[inline]
    pub fn is_inbound(&self) -> bool {
        matches!(self, MovementKind::In)
    }
}

/// A manually recorded stock adjustment. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    /// Product name at time of movement (frozen).
    pub product_name: String,
    pub kind: MovementKind,
    /// Invariant: always > 0; direction comes from `kind`.
    pub quantity: i64,
    pub reason: Option<String>,
    pub operator_id: String,
    pub operator_name: String,
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Notification
// =============================================================================

/// Category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "kebab-case"))]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    /// One or more products dropped to or below their minimum level.
    LowStock,
    /// A sale was committed.
    Sales,
    /// Stock levels changed (sale decrement or manual movement).
    StockUpdate,
    /// A product's price was edited.
    PriceChange,
    /// Operational notices not tied to a record.
    System,
}

/// A role-targeted notification produced by the fanout component.
///
/// `user_id` is reserved for future per-user addressing and is always
/// `None` for system-generated alerts; delivery is decided purely by
/// `target_roles`. The only legal mutation is `is_read: false → true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub user_id: Option<String>,
    pub target_roles: Vec<Role>,
}

impl Notification {
    /// Whether this notification should be delivered to the given role.
    #[inline]
    pub fn targets(&self, role: Role) -> bool {
        self.target_roles.contains(&role)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
