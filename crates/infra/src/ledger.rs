//! Per-item snapshot cache over the allocation calculator.
//!
//! Replaces re-run-everything-on-change reactivity with explicit
//! invalidation scoped to the item ids a committed transition touched.
//! Cached values are disposable; recomputation is idempotent.

use std::collections::HashMap;
use std::sync::RwLock;

use standops_allocation::{AllocationSnapshot, compute};
use standops_bookings::DateWindow;
use standops_core::{AllocationError, AllocationResult, InventoryItemId, Versioned};
use standops_inventory::InventoryItem;

use crate::store::{BookingStore, ItemStore, OrderStore};

/// Queryable allocation view: current `{reserved, sold, available}` per item.
///
/// All consumers (analytics, availability filters, the transition manager's
/// capacity check inputs) read through here, so no two views can drift.
#[derive(Debug)]
pub struct AllocationLedger<I, O, B> {
    items: I,
    orders: O,
    bookings: B,
    cache: RwLock<HashMap<InventoryItemId, AllocationSnapshot>>,
}

impl<I, O, B> AllocationLedger<I, O, B>
where
    I: ItemStore,
    O: OrderStore,
    B: BookingStore,
{
    pub fn new(items: I, orders: O, bookings: B) -> Self {
        Self {
            items,
            orders,
            bookings,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Current snapshot for one item, computed on demand and cached.
    pub fn snapshot(&self, item_id: InventoryItemId) -> AllocationResult<AllocationSnapshot> {
        if let Ok(cache) = self.cache.read() {
            if let Some(snapshot) = cache.get(&item_id) {
                return Ok(*snapshot);
            }
        }

        let snapshot = self.recompute(item_id)?;
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(item_id, snapshot);
        }
        Ok(snapshot)
    }

    /// Date-scoped snapshot: only confirmed bookings overlapping `window`
    /// count. Bypasses the cache (the cache holds flat-policy values only).
    pub fn snapshot_in(
        &self,
        item_id: InventoryItemId,
        window: &DateWindow,
    ) -> AllocationResult<AllocationSnapshot> {
        let item = self.items.get(item_id).ok_or(AllocationError::NotFound)?;
        Ok(compute(
            &item,
            &self.orders.list_for_item(item_id),
            &self.bookings.list_for_item(item_id),
            Some(window),
        ))
    }

    /// Snapshots for every item in the ledger.
    pub fn snapshots(&self) -> HashMap<InventoryItemId, AllocationSnapshot> {
        let mut out = HashMap::new();
        for item in self.items.list() {
            if let Ok(snapshot) = self.snapshot(item.id()) {
                out.insert(item.id(), snapshot);
            }
        }
        out
    }

    /// Items currently in the ledger (metadata for rollups/views).
    pub fn items(&self) -> Vec<InventoryItem> {
        self.items.list()
    }

    /// Drop cached snapshots for the given items; the next read recomputes.
    pub fn invalidate(&self, item_ids: &[InventoryItemId]) {
        if let Ok(mut cache) = self.cache.write() {
            for item_id in item_ids {
                cache.remove(item_id);
            }
        }
        tracing::debug!(count = item_ids.len(), "invalidated allocation snapshots");
    }

    fn recompute(&self, item_id: InventoryItemId) -> AllocationResult<AllocationSnapshot> {
        let item = self.items.get(item_id).ok_or(AllocationError::NotFound)?;
        Ok(compute(
            &item,
            &self.orders.list_for_item(item_id),
            &self.bookings.list_for_item(item_id),
            None,
        ))
    }
}
