//! # Cart & Session Management
//!
//! The cashier's in-progress, uncommitted set of line items, plus the
//! held-transactions list.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Lifecycle                                    │
//! │                                                                         │
//! │   add_line / adjust_quantity / remove_line                                 │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   ┌─────────┐   hold()    ┌──────────────┐                              │
//! │   │ active  │ ──────────► │  held list   │   (by value, active reset)   │
//! │   │  cart   │ ◄────────── │  [C0, C1,..] │                              │
//! │   └─────────┘  resume(i)  └──────────────┘   (list-compaction)          │
//! │        │                                                                │
//! │        ├── committed → consumed by the commit engine, cart cleared      │
//! │        └── discarded → clear(), no effect                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `product_id` (adding the same product increments)
//! - A line's quantity never exceeds the product's live stock at mutation time
//! - Hold and resume move whole carts between disjoint slots; two carts are
//!   never merged

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CartLine, Product};
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

// =============================================================================
// Cart
// =============================================================================

/// An ordered sequence of cart lines, unique by product id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Lines in insertion order.
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds one unit of a product, or increments its existing line.
    ///
    /// ## Behavior
    /// - `current_stock == 0`: rejected with `OutOfStock`, cart unchanged
    ///   (the caller reports it; nothing is partially applied)
    /// - already present: increments by 1, refused with `InsufficientStock`
    ///   if that would exceed the product's live stock
    /// - otherwise: appends a new snapshot line with quantity 1
    pub fn add_line(&mut self, product: &Product) -> CoreResult<()> {
        if product.is_out_of_stock() {
            return Err(CoreError::OutOfStock {
                name: product.name.clone(),
            });
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            if line.quantity + 1 > product.current_stock {
                return Err(CoreError::InsufficientStock {
                    name: product.name.clone(),
                    available: product.current_stock,
                    requested: line.quantity + 1,
                });
            }
            if line.quantity + 1 > MAX_LINE_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: line.quantity + 1,
                    max: MAX_LINE_QUANTITY,
                });
            }
            line.quantity += 1;
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        self.lines.push(CartLine::from_product(product, 1));
        Ok(())
    }

    /// Adjusts a line's quantity by a signed delta, clamping per policy.
    ///
    /// ## Behavior
    /// - resulting quantity <= 0: the line is removed
    /// - resulting quantity above the product's live stock: rejected with
    ///   `InsufficientStock`, line left unchanged
    /// - product not in cart: `LineNotFound`
    pub fn adjust_quantity(&mut self, product: &Product, delta: i64) -> CoreResult<()> {
        let idx = self
            .lines
            .iter()
            .position(|l| l.product_id == product.id)
            .ok_or_else(|| CoreError::LineNotFound(product.id.clone()))?;

        let new_quantity = self.lines[idx].quantity + delta;

        if new_quantity <= 0 {
            self.lines.remove(idx);
            return Ok(());
        }

        if new_quantity > product.current_stock {
            return Err(CoreError::InsufficientStock {
                name: product.name.clone(),
                available: product.current_stock,
                requested: new_quantity,
            });
        }
        if new_quantity > MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: new_quantity,
                max: MAX_LINE_QUANTITY,
            });
        }

        self.lines[idx].quantity = new_quantity;
        Ok(())
    }

    /// Removes a line by product id.
    pub fn remove_line(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);

        if self.lines.len() == initial_len {
            Err(CoreError::LineNotFound(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Clears all lines (discard without effect).
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Pre-tax subtotal.
    pub fn subtotal(&self) -> Money {
        self.lines
            .iter()
            .fold(Money::zero(), |acc, l| acc + l.line_total())
    }
}

// =============================================================================
// Cart Session
// =============================================================================

/// Per-cashier session state: the active cart plus held transactions.
///
/// Held carts are addressed by position. `resume` removes the held cart
/// and the remaining indices shift down (list-compaction, not sparse).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSession {
    active: Cart,
    held: Vec<Cart>,
}

impl CartSession {
    /// Creates a session with an empty active cart and no held carts.
    pub fn new() -> Self {
        CartSession {
            active: Cart::new(),
            held: Vec::new(),
        }
    }

    /// Read access to the active cart.
    pub fn active(&self) -> &Cart {
        &self.active
    }

    /// Mutable access to the active cart for line operations.
    pub fn active_mut(&mut self) -> &mut Cart {
        &mut self.active
    }

    /// The held-transactions list, oldest first.
    pub fn held(&self) -> &[Cart] {
        &self.held
    }

    /// Suspends the active cart.
    ///
    /// No-op on an empty cart. Otherwise the cart moves by value to the
    /// end of the held list and the active cart resets to empty.
    pub fn hold(&mut self) {
        if self.active.is_empty() {
            return;
        }
        let held = std::mem::take(&mut self.active);
        self.held.push(held);
    }

    /// Restores the held cart at `index` as the active cart.
    ///
    /// Fails with `ActiveCartNotEmpty` if the active cart has lines, so
    /// two carts can never be merged; fails with `HeldNotFound` for an
    /// out-of-range index.
    pub fn resume(&mut self, index: usize) -> CoreResult<()> {
        if !self.active.is_empty() {
            return Err(CoreError::ActiveCartNotEmpty);
        }
        if index >= self.held.len() {
            return Err(CoreError::HeldNotFound { index });
        }
        self.active = self.held.remove(index);
        Ok(())
    }

    /// Takes the active cart for committing, leaving an empty cart behind.
    ///
    /// The commit engine consumes the returned cart; on failure the caller
    /// may put it back with [`CartSession::restore`].
    pub fn take_active(&mut self) -> Cart {
        std::mem::take(&mut self.active)
    }

    /// Puts a cart back as the active cart (after a failed commit).
    pub fn restore(&mut self, cart: Cart) {
        self.active = cart;
    }

    /// Discards the active cart.
    pub fn clear(&mut self) {
        self.active.clear();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
