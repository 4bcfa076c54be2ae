//! # Engine Error Types
//!
//! The engine surfaces three families of failure: domain rule violations
//! from sari-core, store failures from sari-db, and the engine's own
//! authorization and consistency errors.

use sari_core::{CoreError, Role};
use sari_db::DbError;
use thiserror::Error;

/// Errors surfaced by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A domain rule was violated (empty cart, insufficient stock, ...).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The store failed (connection, constraint, corrupt row, ...).
    #[error(transparent)]
    Store(#[from] DbError),

    /// The operator's role does not permit the operation.
    #[error("Operation requires {required} role, operator is {actual}")]
    NotAuthorized { required: Role, actual: Role },

    /// A movement was recorded in the ledger but the stock level update
    /// did not apply. The ledger row is the durable record; the stock
    /// level can be replayed from it.
    #[error("Movement {movement_id} recorded but stock update failed; replay from ledger")]
    PartialApply { movement_id: String },
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_converts() {
        let err: EngineError = CoreError::EmptyCart.into();
        assert!(matches!(err, EngineError::Core(CoreError::EmptyCart)));
    }

    #[test]
    fn test_not_authorized_message() {
        let err = EngineError::NotAuthorized {
            required: Role::Owner,
            actual: Role::Cashier,
        };
        assert_eq!(
            err.to_string(),
            "Operation requires owner role, operator is cashier"
        );
    }
}
