//! Values that exist only from a later startup phase on.

use std::sync::OnceLock;

use crate::error::DeferredError;

/// A slot filled once during the run phase.
///
/// Reads before [`set`](Self::set) fail with
/// [`DeferredError::NotYetAvailable`] carrying the message given at
/// construction. Once set, the value never changes.
pub struct DeferredValue<T> {
    cell: OnceLock<T>,
    message: &'static str,
}

impl<T> DeferredValue<T> {
    /// Creates an empty slot that reports `message` when read too early.
    pub const fn new(message: &'static str) -> Self {
        Self {
            cell: OnceLock::new(),
            message,
        }
    }

    /// Stores `value`. Fails if a value is already present.
    pub fn set(&self, value: T) -> Result<(), DeferredError> {
        self.cell.set(value).map_err(|_| DeferredError::AlreadySet)
    }

    /// Returns the value, or the phase error if it is not set yet.
    pub fn get(&self) -> Result<&T, DeferredError> {
        self.cell.get().ok_or(DeferredError::NotYetAvailable {
            message: self.message,
        })
    }

    /// Returns `true` once a value is present.
    pub fn is_set(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T: Clone> DeferredValue<T> {
    /// Returns a clone of the value.
    pub fn cloned(&self) -> Result<T, DeferredError> {
        self.get().cloned()
    }
}

impl<T> std::fmt::Debug for DeferredValue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredValue")
            .field("set", &self.is_set())
            .finish()
    }
}
