//! # sari-core: Pure Business Logic for Sari POS
//!
//! This crate is the heart of Sari POS. It contains all business logic as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Sari POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Presentation layer (excluded)                  │   │
//! │  │    Cashier checkout ── Stock checker ── Owner reporting         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                       sari-engine                               │   │
//! │  │    CommitEngine, Reconciler, Notifier, ProductCache, Reports    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ sari-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐   │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │  report   │   │   │
//! │  │   │  Product  │  │   Money   │  │   Cart    │  │ summarize │   │   │
//! │  │   │SaleRecord │  │  TaxRate  │  │  Session  │  │  rollups  │   │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, SaleRecord, StockMovement, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Cart and held-transaction session management
//! - [`report`] - Sales report aggregation (pure functions over records)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in centavos (i64), never floats
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use sari_core::Money` instead of
// `use sari_core::money::Money`

pub use cart::{Cart, CartSession};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, TaxRate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// VAT rate in basis points (1200 = 12%).
///
/// Sales totals are stored pre-tax; this rate is applied only at
/// display/export time through [`Money::with_tax`], never persisted.
/// Keeping it in one place stops the cashier receipt and the owner report
/// from drifting apart.
pub const VAT_RATE_BPS: u32 = 1200;

/// Maximum line items allowed in a single cart.
///
/// Prevents runaway carts and keeps transaction sizes reasonable.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line in a cart.
///
/// Guards against typo quantities (1000 instead of 10). The live stock
/// bound is usually tighter; this is the absolute ceiling.
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Number of products reported in a date-range top-products ranking.
pub const TOP_PRODUCTS_LIMIT: usize = 10;
