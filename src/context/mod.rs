//! Application state as a key-value environment.
//!
//! Hosts describe "what is currently true" (selection present, focused panel,
//! mode flags) as scalar values keyed by dotted identifiers. When-clauses are
//! evaluated against read-only views of this environment.

pub mod store;
pub mod value;

pub use store::{Change, ChangeSet, ContextSnapshot, ContextStore, SubscriptionId};
pub use value::ContextValue;

use std::collections::HashMap;

/// Read-only view of a context, as seen by expression evaluation.
///
/// Implemented by [`ContextSnapshot`] (the normal case) and by plain
/// `HashMap`s (convenient in tests). Missing keys read as
/// [`ContextValue::Null`].
pub trait ContextView {
    fn value(&self, key: &str) -> ContextValue;
}

impl ContextView for HashMap<String, ContextValue> {
    fn value(&self, key: &str) -> ContextValue {
        self.get(key).cloned().unwrap_or(ContextValue::Null)
    }
}

impl<T: ContextView + ?Sized> ContextView for &T {
    fn value(&self, key: &str) -> ContextValue {
        (**self).value(key)
    }
}
