//! Fail-soft adapter over the datastore.
//!
//! Procedures see the same values whether a query found nothing or failed:
//! errors are logged here and collapsed into the type's default.

use tracing::warn;
use ym_core::store::StoreError;

/// Unwrap a store result, substituting the default on error.
pub fn or_default<T: Default>(operation: &'static str, result: Result<T, StoreError>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(operation, "datastore call failed: {e}");
            T::default()
        }
    }
}

/// Whether a write went through.
pub fn written(operation: &'static str, result: Result<(), StoreError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(operation, "datastore write failed: {e}");
            false
        }
    }
}
