//! Read-only rollups over the allocation ledger.
//!
//! A thin consumer: it reads the same authoritative snapshots as every other
//! view and never writes. Dimensions come from item metadata.

use std::collections::HashMap;

use serde::Serialize;

use standops_core::{ItemTypeId, SectorId, Versioned};

use crate::ledger::AllocationLedger;
use crate::store::{BookingStore, ItemStore, OrderStore};

/// Aggregated availability for one rollup bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AllocationRollup {
    pub item_count: u64,
    pub capacity: i64,
    pub reserved: i64,
    pub sold: i64,
    pub available: i64,
}

impl AllocationRollup {
    /// Committed share of capacity, in per-mille (0 for empty buckets).
    pub fn occupancy_per_mille(&self) -> i64 {
        if self.capacity == 0 {
            return 0;
        }
        (self.reserved + self.sold) * 1000 / self.capacity
    }
}

/// Availability rolled up by floor sector.
pub fn by_sector<I, O, B>(
    ledger: &AllocationLedger<I, O, B>,
) -> HashMap<SectorId, AllocationRollup>
where
    I: ItemStore,
    O: OrderStore,
    B: BookingStore,
{
    rollup(ledger, |item| item.sector_id())
}

/// Availability rolled up by item type.
pub fn by_type<I, O, B>(
    ledger: &AllocationLedger<I, O, B>,
) -> HashMap<ItemTypeId, AllocationRollup>
where
    I: ItemStore,
    O: OrderStore,
    B: BookingStore,
{
    rollup(ledger, |item| item.type_id())
}

fn rollup<I, O, B, K>(
    ledger: &AllocationLedger<I, O, B>,
    key: impl Fn(&standops_inventory::InventoryItem) -> K,
) -> HashMap<K, AllocationRollup>
where
    I: ItemStore,
    O: OrderStore,
    B: BookingStore,
    K: Copy + Eq + core::hash::Hash,
{
    let snapshots = ledger.snapshots();
    let mut out: HashMap<K, AllocationRollup> = HashMap::new();

    for item in ledger.items() {
        let Some(snapshot) = snapshots.get(&item.id()) else {
            continue;
        };
        let bucket = out.entry(key(&item)).or_default();
        bucket.item_count += 1;
        bucket.capacity += snapshot.capacity;
        bucket.reserved += snapshot.reserved;
        bucket.sold += snapshot.sold;
        bucket.available += snapshot.available;
    }

    out
}
