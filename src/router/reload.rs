//! Copy-on-write sharing of compiled route tables.
//!
//! The composition phase is single-threaded, but the compiled table is read
//! by every dispatch thread. `SharedRouteTable` keeps the hot path lock-free:
//! readers `load()` the current snapshot, a reload `store()`s a freshly
//! compiled one, and in-flight matches keep using whichever snapshot they
//! already hold.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::debug;

use super::core::RouteTable;

/// A lock-free, swappable handle to a compiled [`RouteTable`].
pub struct SharedRouteTable {
    inner: ArcSwap<RouteTable>,
}

impl SharedRouteTable {
    #[must_use]
    pub fn new(table: Arc<RouteTable>) -> Self {
        Self {
            inner: ArcSwap::new(table),
        }
    }

    /// The current snapshot. Lock-free; call once per request and reuse.
    #[must_use]
    pub fn load(&self) -> Arc<RouteTable> {
        self.inner.load_full()
    }

    /// Publish a new snapshot. Readers of the previous one are unaffected.
    pub fn store(&self, table: Arc<RouteTable>) {
        debug!(routes = table.routes().len(), "Swapping in recompiled route table");
        self.inner.store(table);
    }

    /// Publish a new snapshot, returning the previous one.
    pub fn swap(&self, table: Arc<RouteTable>) -> Arc<RouteTable> {
        self.inner.swap(table)
    }
}
