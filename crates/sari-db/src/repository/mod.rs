//! # Repository Module
//!
//! Database repository implementations for Sari POS.
//!
//! Each repository wraps the shared `SqlitePool` behind a narrow API, so
//! SQL stays in one place and callers work with `sari-core` types.
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog CRUD and guarded stock writes
//! - [`sale::SaleRepository`] - Sale records and line items
//! - [`movement::MovementRepository`] - Append-only stock movement ledger
//! - [`notification::NotificationRepository`] - Role-targeted notifications

pub mod movement;
pub mod notification;
pub mod product;
pub mod sale;
